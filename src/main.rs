use clap::{Parser, Subcommand};
use rust_dotenv::dotenv::DotEnv;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod config;
mod core;
mod faker;
mod filters;
mod generator;
mod ledger;
mod models;
mod order;
mod registry;
mod report;
mod scaffold;
mod seed;
mod store;
mod synth;

use models::list_models;
use seed::{GenerateOpts, run_generate};

#[derive(Parser, Debug)]
#[command(version, about = "Fill a SurrealDB database with dummy data")]
pub struct Cli {
	/// Increase output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Write database/dummy.toml and database/models.toml templates
	Init,
	/// List discovered models in generation order
	Models {
		/// Skip models matching app.model globs (repeatable)
		#[arg(long, num_args = 1..)]
		exclude: Vec<String>,
	},
	/// Generate dummy records for every discovered model
	Generate {
		/// Skip models matching app.model globs (repeatable)
		#[arg(long, num_args = 1..)]
		exclude: Vec<String>,
		/// Instances per model
		#[arg(long)]
		count: Option<usize>,
		/// Seed for reproducible values
		#[arg(long)]
		seed: Option<u64>,
		/// Use an in-memory store instead of the database
		#[arg(long)]
		dry_run: bool,
	},
}

fn load_env() -> DotEnv {
	// Load .env in CWD if present, ignore missing
	DotEnv::new("")
}

fn init_tracing(verbose: bool) {
	let fallback = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Cli::parse();
	init_tracing(args.verbose);
	let env = load_env();

	match args.command {
		Commands::Init => scaffold::scaffold()?,
		Commands::Models { exclude } => list_models(&exclude)?,
		Commands::Generate {
			exclude,
			count,
			seed,
			dry_run,
		} => {
			run_generate(
				&env,
				GenerateOpts {
					exclude,
					count,
					seed,
					dry_run,
				},
			)
			.await;
		}
	}

	Ok(())
}
