//! Host-contract data: the chooser request and the activity-result envelope.
//!
//! Constant values match the Android framework so a JNI adapter can pass them
//! through unchanged.

use serde::{Deserialize, Serialize};

/// `Intent.ACTION_OPEN_DOCUMENT`
pub const ACTION_OPEN_DOCUMENT: &str = "android.intent.action.OPEN_DOCUMENT";
/// `Intent.CATEGORY_OPENABLE`
pub const CATEGORY_OPENABLE: &str = "android.intent.category.OPENABLE";
/// `Intent.EXTRA_MIME_TYPES`
pub const EXTRA_MIME_TYPES: &str = "android.intent.extra.MIME_TYPES";
/// `DocumentsContract.EXTRA_INITIAL_URI`
pub const EXTRA_INITIAL_URI: &str = "android.provider.extra.INITIAL_URI";

/// `Intent.FLAG_GRANT_READ_URI_PERMISSION`
pub const FLAG_GRANT_READ_URI_PERMISSION: i32 = 0x0000_0001;
/// `Intent.FLAG_GRANT_WRITE_URI_PERMISSION`
pub const FLAG_GRANT_WRITE_URI_PERMISSION: i32 = 0x0000_0002;
/// `Intent.FLAG_GRANT_PERSISTABLE_URI_PERMISSION`
pub const FLAG_GRANT_PERSISTABLE_URI_PERMISSION: i32 = 0x0000_0040;

/// `Activity.RESULT_OK`
pub const RESULT_OK: i32 = -1;
/// `Activity.RESULT_CANCELED`
pub const RESULT_CANCELED: i32 = 0;

/// `OpenableColumns.DISPLAY_NAME`
pub const COLUMN_DISPLAY_NAME: &str = "_display_name";
/// `OpenableColumns.SIZE`
pub const COLUMN_SIZE: &str = "_size";

/// `MediaStore.Audio.Media.EXTERNAL_CONTENT_URI`
pub const EXTERNAL_AUDIO_CONTENT_URI: &str = "content://media/external/audio/media";

/// First SDK level with persistable grants and the initial-URI hint (KitKat).
pub const SDK_PERSISTABLE_GRANTS: u32 = 19;

/// Request code the bridge binds its chooser to.
pub const DEFAULT_REQUEST_CODE: i32 = 9001;

/// A request to launch a foreign activity.
///
/// Only the fields the picker uses are modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
	pub action: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub categories: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	/// Value of [`EXTRA_MIME_TYPES`].
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub extra_mime_types: Vec<String>,
	/// Value of [`EXTRA_INITIAL_URI`].
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub initial_uri: Option<String>,
	#[serde(default)]
	pub flags: i32,
}

impl Intent {
	pub fn new(action: impl Into<String>) -> Self {
		Self {
			action: action.into(),
			..Self::default()
		}
	}

	pub fn add_category(&mut self, category: impl Into<String>) -> &mut Self {
		self.categories.push(category.into());
		self
	}

	pub fn set_type(&mut self, mime_type: impl Into<String>) -> &mut Self {
		self.mime_type = Some(mime_type.into());
		self
	}

	pub fn add_flags(&mut self, flags: i32) -> &mut Self {
		self.flags |= flags;
		self
	}

	pub fn has_flag(&self, flag: i32) -> bool {
		self.flags & flag == flag
	}

	pub fn has_category(&self, category: &str) -> bool {
		self.categories.iter().any(|c| c == category)
	}
}

/// Data envelope attached to an activity result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultData {
	/// The locator returned by the chooser (`Intent.getData()`).
	#[serde(default)]
	pub uri: Option<String>,
	/// Grant flags carried on the envelope (`Intent.getFlags()`).
	#[serde(default)]
	pub flags: i32,
}

impl ResultData {
	pub fn with_uri(uri: impl Into<String>, flags: i32) -> Self {
		Self {
			uri: Some(uri.into()),
			flags,
		}
	}
}

/// Host-delivered activity-result notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
	pub request_code: i32,
	pub result_code: i32,
	#[serde(default)]
	pub data: Option<ResultData>,
}

impl ActivityResult {
	pub fn is_ok(&self) -> bool {
		self.result_code == RESULT_OK
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_accumulate() {
		let mut intent = Intent::new(ACTION_OPEN_DOCUMENT);
		intent
			.add_flags(FLAG_GRANT_READ_URI_PERMISSION)
			.add_flags(FLAG_GRANT_PERSISTABLE_URI_PERMISSION);

		assert!(intent.has_flag(FLAG_GRANT_READ_URI_PERMISSION));
		assert!(intent.has_flag(FLAG_GRANT_PERSISTABLE_URI_PERMISSION));
		assert!(!intent.has_flag(FLAG_GRANT_WRITE_URI_PERMISSION));
	}

	#[test]
	fn activity_result_parses_without_data() {
		let json = r#"{"requestCode": 9001, "resultCode": 0}"#;
		let result: ActivityResult = serde_json::from_str(json).unwrap();

		assert_eq!(result.request_code, DEFAULT_REQUEST_CODE);
		assert!(!result.is_ok());
		assert!(result.data.is_none());
	}
}
