use anyhow::{Context, Result};
use clap::Parser;
use media_picker::PickerConfig;
use picker_cli::{
	cli::Cli,
	logging,
	output::{self, Report},
	scenario::{self, Scenario},
};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	match run(cli).await {
		Ok(report) => {
			if let Err(err) = output::print_report(&report, format) {
				eprintln!("error: writing report: {err}");
				std::process::exit(1);
			}
			if !report.ok {
				std::process::exit(1);
			}
		}
		Err(err) => {
			eprintln!("error: {err:#}");
			std::process::exit(1);
		}
	}
}

async fn run(cli: Cli) -> Result<Report> {
	let mut scenario = Scenario::from_path(&cli.scenario)?;

	let config = if let Some(path) = cli.config.as_deref() {
		PickerConfig::from_path(path).with_context(|| format!("loading config {}", path.display()))?
	} else if cli.audio_only {
		PickerConfig::audio_only()
	} else {
		scenario.config.take().unwrap_or_default()
	};

	tracing::debug!(scenario = %cli.scenario.display(), request_code = config.request_code, "Replaying");
	scenario::replay(scenario, config).await
}
