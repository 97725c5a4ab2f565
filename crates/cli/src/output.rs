//! Output envelope for a replayed pick.
//!
//! ```json
//! {
//!   "ok": true,
//!   "command": "pickAudio",
//!   "data": { "uri": "content://media/audio/42", "type": "audio/mpeg" },
//!   "launches": 1,
//!   "grants": ["content://media/audio/42"]
//! }
//! ```
//!
//! On rejection `data` is replaced by `error: { code, message }`.

use std::io::{self, Write};

use media_picker::{BridgeReply, PickResult, Rejection};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	#[default]
	Json,
	/// Human-readable text
	Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
	pub ok: bool,
	pub command: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<PickResult>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<Rejection>,
	/// Chooser launches the picker performed.
	pub launches: usize,
	/// Locators a persistable grant was requested for.
	pub grants: Vec<String>,
}

impl Report {
	pub fn new(reply: BridgeReply, launches: usize, grants: Vec<String>) -> Self {
		Self {
			ok: reply.ok,
			command: "pickAudio",
			data: reply.data,
			error: reply.error,
			launches,
			grants,
		}
	}
}

/// Writes the report to stdout.
///
/// # Errors
///
/// Fails if the report cannot be serialized or stdout cannot be written.
pub fn print_report(report: &Report, format: OutputFormat) -> io::Result<()> {
	let mut stdout = io::stdout().lock();
	write_report(&mut stdout, report, format)?;
	stdout.flush()
}

fn write_report(out: &mut impl Write, report: &Report, format: OutputFormat) -> io::Result<()> {
	match format {
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut *out, report)?;
			writeln!(out)
		}
		OutputFormat::Text => write_text(out, report),
	}
}

fn write_text(out: &mut impl Write, report: &Report) -> io::Result<()> {
	if let Some(ref error) = report.error {
		return writeln!(out, "Error [{}]: {}", error.code, error.message);
	}

	let Some(ref data) = report.data else {
		return Ok(());
	};
	writeln!(out, "uri:  {}", data.uri.as_deref().unwrap_or("(none)"))?;
	if let Some(ref mime_type) = data.mime_type {
		writeln!(out, "type: {mime_type}")?;
	}
	if let Some(ref name) = data.name {
		writeln!(out, "name: {name}")?;
	}
	if let Some(size) = data.size {
		writeln!(out, "size: {size} bytes")?;
	}
	Ok(())
}
