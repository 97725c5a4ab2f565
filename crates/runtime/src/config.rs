//! Picker configuration.
//!
//! Every field has a default matching the shipped bridge, so an empty JSON
//! object (or no config at all) gives the standard behaviour:
//!
//! ```json
//! {
//!   "requestCode": 9001,
//!   "mimeType": "*/*",
//!   "allowedMimeTypes": ["image/*", "video/*", "audio/*"],
//!   "initialUri": "content://media/external/audio/media",
//!   "reentry": "reject",
//!   "persistGrants": true,
//!   "describeMetadata": true
//! }
//! ```

use std::path::Path;

use picker_protocol::{DEFAULT_REQUEST_CODE, EXTERNAL_AUDIO_CONTENT_URI};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What to do when a pick starts while another is still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReentryPolicy {
	/// Reject the new call with `BUSY`; the pending pick is untouched.
	#[default]
	Reject,
	/// Overwrite the pending completion; the earlier caller is orphaned.
	Replace,
}

/// Settings for a [`PickerSession`](crate::PickerSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PickerConfig {
	/// Request code the chooser is launched with and results are matched on.
	pub request_code: i32,
	/// Primary MIME filter of the open-document request.
	pub mime_type: String,
	/// Explicit MIME allow-list passed as an extra.
	pub allowed_mime_types: Vec<String>,
	/// Where the chooser should start, on platforms that honour the hint.
	pub initial_uri: Option<String>,
	pub reentry: ReentryPolicy,
	/// Whether to upgrade the transient read grant to a persistent one.
	pub persist_grants: bool,
	/// Whether to query the content resolver for type, name, and size.
	pub describe_metadata: bool,
}

impl Default for PickerConfig {
	fn default() -> Self {
		Self {
			request_code: DEFAULT_REQUEST_CODE,
			mime_type: "*/*".to_string(),
			allowed_mime_types: vec!["image/*".to_string(), "video/*".to_string(), "audio/*".to_string()],
			initial_uri: Some(EXTERNAL_AUDIO_CONTENT_URI.to_string()),
			reentry: ReentryPolicy::default(),
			persist_grants: true,
			describe_metadata: true,
		}
	}
}

impl PickerConfig {
	/// Audio-only chooser that returns just the locator.
	pub fn audio_only() -> Self {
		Self {
			mime_type: "audio/*".to_string(),
			allowed_mime_types: vec!["audio/*".to_string()],
			describe_metadata: false,
			..Self::default()
		}
	}

	/// Parses and validates a JSON config.
	pub fn from_json_str(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses, and validates a JSON config file.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
		let contents = std::fs::read_to_string(path.as_ref())?;
		Self::from_json_str(&contents)
	}

	/// Checks the invariants the host imposes on a chooser request.
	pub fn validate(&self) -> Result<()> {
		// Fragment-based hosts reject request codes outside the low 16 bits.
		if !(0..=0xFFFF).contains(&self.request_code) {
			return Err(Error::InvalidConfig(format!(
				"requestCode {} must be between 0 and 65535",
				self.request_code
			)));
		}

		if !is_mime_pattern(&self.mime_type) {
			return Err(Error::InvalidConfig(format!(
				"mimeType '{}' is not a MIME type",
				self.mime_type
			)));
		}

		if self.allowed_mime_types.is_empty() {
			return Err(Error::InvalidConfig("allowedMimeTypes must not be empty".to_string()));
		}

		if let Some(bad) = self.allowed_mime_types.iter().find(|m| !is_mime_pattern(m)) {
			return Err(Error::InvalidConfig(format!(
				"allowedMimeTypes entry '{bad}' is not a MIME type"
			)));
		}

		Ok(())
	}
}

fn is_mime_pattern(value: &str) -> bool {
	matches!(value.split_once('/'), Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() && !sub.contains('/'))
}
