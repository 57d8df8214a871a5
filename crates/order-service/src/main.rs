//! Main entry point for the order tracker.
//!
//! Loads configuration, builds the order workflow and runs a single
//! subcommand against a session: start or extend it with orders, query it,
//! print its history, or discard it.

use clap::{Parser, Subcommand};
use order_config::Config;
use order_core::{OrderWorkflow, TrackerBuilder};
use order_types::{Order, OrderState};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Command-line arguments for the order tracker.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run a session from a JSON state file, replacing its checkpoint
	Invoke {
		#[arg(long)]
		session: String,
		/// JSON file with `orders` and optional `history`
		#[arg(long)]
		input: PathBuf,
	},
	/// Append an order from a JSON file to a session and run it
	Submit {
		#[arg(long)]
		session: String,
		#[arg(long)]
		order: PathBuf,
	},
	/// Print the valid orders of a session with the given status
	Query {
		#[arg(long)]
		session: String,
		#[arg(long)]
		status: String,
	},
	/// Print the audit history of a session
	History {
		#[arg(long)]
		session: String,
	},
	/// Delete the checkpoint of a session
	Discard {
		#[arg(long)]
		session: String,
	},
	/// Remove expired checkpoints
	Cleanup,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.tracker.id);

	let workflow = TrackerBuilder::new(config).build()?;
	run(&workflow, args.command).await
}

async fn run(workflow: &OrderWorkflow, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	match command {
		Command::Invoke { session, input } => {
			let state: OrderState = read_json(&input).await?;
			let state = workflow.invoke(&session, state).await?;
			println!("{}", serde_json::to_string_pretty(&state)?);
		},
		Command::Submit { session, order } => {
			let order: Order = read_json(&order).await?;
			let state = workflow.submit_order(&session, order).await?;
			println!("{}", serde_json::to_string_pretty(&state)?);
		},
		Command::Query { session, status } => {
			let orders = workflow.query(&session, &status).await?;
			println!("{}", serde_json::to_string_pretty(&orders)?);
		},
		Command::History { session } => match workflow.state(&session).await? {
			Some(state) => {
				for line in state.history.iter() {
					println!("{}", line);
				}
			},
			None => tracing::warn!(session_id = %session, "No checkpoint for session"),
		},
		Command::Discard { session } => {
			workflow.discard(&session).await?;
		},
		Command::Cleanup => {
			let removed = workflow.cleanup_expired().await?;
			println!("Removed {} expired checkpoint(s)", removed);
		},
	}
	Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
	let content = tokio::fs::read_to_string(path)
		.await
		.map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
	Ok(serde_json::from_str(&content)?)
}
