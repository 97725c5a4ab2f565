//! The `AudioPicker` bridge module.
//!
//! This is the surface the application layer calls. It owns one
//! [`PickerSession`] and exposes `pickAudio` in two shapes: a future for Rust
//! callers and a completion-handle variant for promise-style bridges.

use std::sync::Arc;

use picker_protocol::{BridgeReply, PickResult, Rejection};
use picker_runtime::{Completion, Host, Outcome, PickFuture, PickerConfig, PickerSession, Result};

/// Bridge module exported to the application as `AudioPicker`.
#[derive(Debug, Clone)]
pub struct AudioPicker {
	session: Arc<PickerSession>,
}

impl AudioPicker {
	/// Name the module is registered under on the bridge.
	pub const NAME: &'static str = "AudioPicker";

	/// Creates the module with the standard chooser configuration.
	///
	/// Modules built over the same host share one session, so only one pick
	/// can be pending on that host at a time.
	pub fn new(host: Arc<dyn Host>) -> Result<Self> {
		Self::with_config(host, PickerConfig::default())
	}

	/// # Errors
	///
	/// Returns [`Error::InvalidConfig`](picker_runtime::Error::InvalidConfig) if
	/// `config` fails validation or differs from the config of a module already
	/// live on `host`.
	pub fn with_config(host: Arc<dyn Host>, config: PickerConfig) -> Result<Self> {
		let session = PickerSession::new(host, config)?;
		tracing::debug!(module = Self::NAME, "Bridge module created");
		Ok(Self { session })
	}

	pub fn name(&self) -> &'static str {
		Self::NAME
	}

	/// Opens the chooser and returns a future for the selection.
	///
	/// The chooser is launched before this returns; awaiting the future only
	/// waits for the activity result.
	///
	/// # Errors
	///
	/// The future yields [`Error::NoActivity`](picker_runtime::Error::NoActivity),
	/// [`Error::Cancelled`](picker_runtime::Error::Cancelled), or
	/// [`Error::Busy`](picker_runtime::Error::Busy).
	pub fn pick_audio(&self) -> PickFuture {
		let (completion, future) = Completion::channel();
		self.session.pick_media(completion);
		future
	}

	/// Opens the chooser and settles `completion` when the user is done.
	pub fn pick_audio_with(&self, completion: Completion) {
		self.session.pick_media(completion);
	}

	/// Like [`pick_audio`](Self::pick_audio), but shaped as the bridge envelope.
	pub async fn pick_audio_reply(&self) -> BridgeReply {
		reply(self.pick_audio().await)
	}

	pub fn session(&self) -> &Arc<PickerSession> {
		&self.session
	}
}

/// Converts a settled pick into the bridge envelope.
pub fn reply(outcome: Outcome) -> BridgeReply {
	outcome.map_err(Rejection::from).into()
}

/// Renders a settled pick as the JSON the bridge hands to the application.
pub fn reply_json(outcome: Outcome) -> serde_json::Value {
	match serde_json::to_value(reply(outcome)) {
		Ok(value) => value,
		Err(e) => {
			tracing::error!(error = %e, "Failed to serialize bridge reply");
			serde_json::Value::Null
		}
	}
}

/// Resolution payload as a JSON map.
pub fn result_json(result: &PickResult) -> serde_json::Value {
	serde_json::to_value(result).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
	use picker_protocol::ErrorCode;
	use picker_runtime::Error;
	use serde_json::json;

	use super::*;
	use crate::sim::SimHost;

	#[test]
	fn registers_under_bridge_name() {
		let picker = AudioPicker::new(SimHost::new()).unwrap();
		assert_eq!(picker.name(), "AudioPicker");
	}

	#[test]
	fn reply_json_for_rejection() {
		assert_eq!(
			reply_json(Err(Error::NoActivity)),
			json!({ "ok": false, "error": { "code": "NO_ACTIVITY", "message": "No activity found" } })
		);
	}

	#[test]
	fn reply_for_resolution() {
		let reply = reply(Ok(PickResult::for_uri("content://x/1")));
		assert!(reply.ok);
		assert!(reply.error.is_none());
		assert_eq!(
			result_json(reply.data.as_ref().unwrap()),
			json!({ "uri": "content://x/1" })
		);
	}

	#[test]
	fn rejection_codes_survive_conversion() {
		let reply = reply(Err(Error::Busy));
		assert_eq!(reply.error.map(|e| e.code), Some(ErrorCode::Busy));
	}
}
