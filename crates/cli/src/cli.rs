use std::path::PathBuf;

use clap::Parser;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "picker-sim")]
#[command(about = "Replay a media picker scenario against a simulated host")]
#[command(version)]
pub struct Cli {
	/// Scenario file (JSON): host state, optional config, chooser results
	#[arg(value_name = "SCENARIO")]
	pub scenario: PathBuf,

	/// Picker config file, overrides the scenario's `config`
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Use the legacy audio-only chooser without metadata lookup
	#[arg(long, conflicts_with = "config")]
	pub audio_only: bool,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}
