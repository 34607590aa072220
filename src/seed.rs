use anyhow::Result;
use rust_dotenv::dotenv::DotEnv;

use crate::config::{DbCfg, DummyCfg, connect};
use crate::faker::Faker;
use crate::generator::{GenerateSettings, run_generation};
use crate::registry::Registry;
use crate::report::{RunSummary, print_summary};
use crate::store::{MemoryStore, SurrealStore};

#[derive(Debug, Clone, Default)]
pub struct GenerateOpts {
	pub exclude: Vec<String>,
	pub count: Option<usize>,
	pub seed: Option<u64>,
	pub dry_run: bool,
}

/// Entry point of `generate`. Any error that escapes the per-model handling,
/// connecting included, is reported here and never reaches `main`.
pub async fn run_generate(env: &DotEnv, opts: GenerateOpts) {
	match generate(env, &opts).await {
		Ok(summary) => print_summary(&summary),
		Err(err) => {
			tracing::error!("dummy data generation aborted: {err:#}");
			println!("Failed to generate dummy data: {err:#}");
		}
	}
}

async fn generate(env: &DotEnv, opts: &GenerateOpts) -> Result<RunSummary> {
	let cfg = DummyCfg::load()?;
	let settings = settings(&cfg, env, opts);
	let registry = Registry::load(&cfg)?;
	if registry.is_empty() {
		println!("No models found");
	}

	let faker = Faker::from_seed(opts.seed);
	if opts.dry_run {
		println!("Dry run: records are kept in memory only");
		let store = MemoryStore::new();
		return run_generation(&store, &registry, &settings, faker).await;
	}

	let db_cfg = DbCfg::from_env(env)?;
	tracing::debug!(host = %db_cfg.host(), "connecting");
	let store = SurrealStore::new(connect(&db_cfg).await?);
	run_generation(&store, &registry, &settings, faker).await
}

/// File settings with command-line flags applied on top.
pub fn settings(cfg: &DummyCfg, env: &DotEnv, opts: &GenerateOpts) -> GenerateSettings {
	let mut exclude = cfg.exclude.clone();
	exclude.extend(opts.exclude.iter().cloned());

	GenerateSettings {
		count: opts.count.unwrap_or(cfg.count),
		exclude,
		auth_app: cfg.auth_app.clone(),
		bootstrap: cfg.bootstrap.clone(),
		admin: cfg.bootstrap.admin_account(env),
	}
}
