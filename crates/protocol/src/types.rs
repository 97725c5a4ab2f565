//! Bridge payload types.
//!
//! [`PickResult`] is the resolution value of `AudioPicker.pickAudio()`;
//! [`Rejection`] carries the `(code, message)` pair of a rejected pick.

use serde::{Deserialize, Serialize};

/// Descriptor of the media file the user selected.
///
/// `uri` is always serialized (as `null` when the chooser returned an envelope
/// without a locator). The remaining attributes are omitted when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickResult {
	/// Opaque content locator (`content://...`).
	pub uri: Option<String>,
	/// MIME type reported by the content resolver.
	#[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	/// Display name from the openable columns.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Size in bytes from the openable columns.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
}

impl PickResult {
	/// Result for a locator with no metadata attached yet.
	pub fn for_uri(uri: impl Into<String>) -> Self {
		Self {
			uri: Some(uri.into()),
			..Self::default()
		}
	}

	/// Result for an envelope that carried no locator.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Returns true if the host supplied at least one metadata attribute.
	pub fn has_metadata(&self) -> bool {
		self.mime_type.is_some() || self.name.is_some() || self.size.is_some()
	}
}

/// Rejection codes surfaced to the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// No foreground activity to launch the chooser from.
	NoActivity,
	/// The user or the system dismissed the chooser.
	Cancelled,
	/// Another pick is already waiting for its activity result.
	Busy,
	/// The pending pick was displaced by a newer one and will never settle.
	Orphaned,
	/// Anything else (host failures outside the chooser flow, bad config).
	Internal,
}

impl ErrorCode {
	/// Returns the wire representation.
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::NoActivity => "NO_ACTIVITY",
			ErrorCode::Cancelled => "CANCELLED",
			ErrorCode::Busy => "BUSY",
			ErrorCode::Orphaned => "ORPHANED",
			ErrorCode::Internal => "INTERNAL",
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A rejected pick as the bridge reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
	pub code: ErrorCode,
	pub message: String,
}

impl Rejection {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

/// Settled outcome of one `pickAudio` call, shaped like a promise settlement.
///
/// ```json
/// { "ok": true, "data": { "uri": "content://media/audio/42", "type": "audio/mpeg" } }
/// { "ok": false, "error": { "code": "CANCELLED", "message": "Audio picking cancelled" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeReply {
	pub ok: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<PickResult>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<Rejection>,
}

impl BridgeReply {
	pub fn resolved(data: PickResult) -> Self {
		Self {
			ok: true,
			data: Some(data),
			error: None,
		}
	}

	pub fn rejected(error: Rejection) -> Self {
		Self {
			ok: false,
			data: None,
			error: Some(error),
		}
	}
}

impl From<Result<PickResult, Rejection>> for BridgeReply {
	fn from(outcome: Result<PickResult, Rejection>) -> Self {
		match outcome {
			Ok(data) => Self::resolved(data),
			Err(error) => Self::rejected(error),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn full_result_uses_bridge_keys() {
		let result = PickResult {
			uri: Some("content://media/audio/42".into()),
			mime_type: Some("audio/mpeg".into()),
			name: Some("track.mp3".into()),
			size: Some(4_194_304),
		};

		assert_eq!(
			serde_json::to_value(&result).unwrap(),
			json!({
				"uri": "content://media/audio/42",
				"type": "audio/mpeg",
				"name": "track.mp3",
				"size": 4194304
			})
		);
	}

	#[test]
	fn missing_metadata_is_omitted() {
		let result = PickResult::for_uri("content://x/1");
		assert!(!result.has_metadata());
		assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "uri": "content://x/1" }));
	}

	#[test]
	fn empty_envelope_keeps_null_uri() {
		assert_eq!(serde_json::to_value(PickResult::empty()).unwrap(), json!({ "uri": null }));
	}

	#[test]
	fn error_codes_serialize_screaming_snake() {
		assert_eq!(serde_json::to_value(ErrorCode::NoActivity).unwrap(), json!("NO_ACTIVITY"));
		assert_eq!(serde_json::to_value(ErrorCode::Cancelled).unwrap(), json!("CANCELLED"));
		assert_eq!(ErrorCode::Busy.to_string(), "BUSY");
	}

	#[test]
	fn rejected_reply_shape() {
		let reply = BridgeReply::from(Err(Rejection::new(ErrorCode::Cancelled, "Audio picking cancelled")));
		assert_eq!(
			serde_json::to_value(&reply).unwrap(),
			json!({
				"ok": false,
				"error": { "code": "CANCELLED", "message": "Audio picking cancelled" }
			})
		);
	}
}
