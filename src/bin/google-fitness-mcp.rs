//! MCP stdio server for Google Fitness step-count and heart-rate data.

// std
use std::process::ExitCode;
// crates.io
use clap::Parser;
use google_fitness_mcp::{config::FitnessConfig, fitness::FitnessService, mcp::McpServer, obs};

/// Serve Google Fitness aggregates to an MCP host over stdio.
#[derive(Debug, Parser)]
#[command(name = "google-fitness-mcp", version, about)]
struct Cli {
	#[command(flatten)]
	config: FitnessConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	obs::init_tracing();
	tracing::info!(
		token_file = %cli.config.token_file.display(),
		credentials_file = %cli.config.credentials_file.display(),
		"Starting the Google Fitness MCP server."
	);

	let service = match FitnessService::from_config(&cli.config) {
		Ok(service) => service,
		Err(e) => {
			tracing::error!(error = %e, "Invalid configuration.");

			return ExitCode::FAILURE;
		},
	};

	match McpServer::new(service).serve_stdio().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, "Stdio transport failed.");

			ExitCode::FAILURE
		},
	}
}
