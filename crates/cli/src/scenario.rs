//! Scenario files and their replay.
//!
//! A scenario describes the simulated host, an optional picker config, and the
//! activity results the host delivers after the chooser is launched:
//!
//! ```json
//! {
//!   "host": { "sdkInt": 33, "documents": { "content://x/1": { "mimeType": "audio/mpeg" } } },
//!   "results": [{ "resultCode": -1, "data": { "uri": "content://x/1", "flags": 1 } }]
//! }
//! ```
//!
//! A result without `requestCode` is addressed to the picker's own code.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use media_picker::sim::{SimHost, SimHostState};
use media_picker::{ActivityResult, AudioPicker, Host, PickerConfig, ResultData, reply};
use serde::Deserialize;

use crate::output::Report;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Scenario {
	pub host: SimHostState,
	pub config: Option<PickerConfig>,
	pub results: Vec<Delivery>,
}

/// One activity result delivered by the simulated host.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
	#[serde(default)]
	pub request_code: Option<i32>,
	pub result_code: i32,
	#[serde(default)]
	pub data: Option<ResultData>,
}

impl Scenario {
	pub fn from_path(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
		serde_json::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
	}
}

/// Runs one pick through `AudioPicker` and delivers the scripted results.
///
/// Fails if the pick is still pending once every result has been delivered.
pub async fn replay(scenario: Scenario, config: PickerConfig) -> Result<Report> {
	let host = SimHost::from_state(scenario.host);
	let picker = AudioPicker::with_config(Arc::clone(&host) as Arc<dyn Host>, config)
		.context("invalid picker config")?;
	let request_code = picker.session().request_code();

	let delivered = scenario.results.len();
	let pending = picker.pick_audio();
	for delivery in scenario.results {
		host.deliver(ActivityResult {
			request_code: delivery.request_code.unwrap_or(request_code),
			result_code: delivery.result_code,
			data: delivery.data,
		});
	}

	if picker.session().is_pending() {
		bail!("pick still pending after {delivered} scripted result(s)");
	}

	let reply = reply(pending.await);
	tracing::info!(ok = reply.ok, "Pick settled");
	let grants = host.grants().into_iter().map(|(uri, _)| uri).collect();
	Ok(Report::new(reply, host.launches().len(), grants))
}
