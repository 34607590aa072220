use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_dotenv::dotenv::DotEnv;
use serde::Deserialize;
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};

use crate::core::create_surreal_client;

pub const DUMMY_CONFIG_PATH: &str = "database/dummy.toml";
pub const DEFAULT_MANIFEST_PATH: &str = "database/models.toml";
pub const DEFAULT_SCHEMA_DIR: &str = "database/schema";
pub const DEFAULT_COUNT: usize = 100;

#[derive(Debug, Clone)]
pub struct DbCfg {
	host: String,
	ns: String,
	db: String,
	user: String,
	pass: String,
}

impl DbCfg {
	pub fn from_env(env: &DotEnv) -> Result<Self> {
		let var = |key: &str, default: &str| {
			env.get_var(key.to_string())
				.unwrap_or_else(|| default.to_string())
		};

		Ok(Self {
			host: var("PUBLIC_DATABASE_HOST", "http://localhost:8000"),
			ns: var("PUBLIC_DATABASE_NAMESPACE", "db"),
			db: var("PUBLIC_DATABASE_NAME", "test"),
			user: var("DATABASE_USER", "root"),
			pass: var("DATABASE_PASSWORD", "root"),
		})
	}

	pub fn host(&self) -> &str {
		&self.host
	}
}

pub async fn connect(cfg: &DbCfg) -> Result<Surreal<Any>> {
	let db = create_surreal_client(&cfg.host)
		.await
		.with_context(|| format!("Failed connecting to {}", cfg.host))?;

	db.signin(Root {
		username: cfg.user.to_string(),
		password: cfg.pass.to_string(),
	})
	.await
	.context("signin failed")?;
	db.use_ns(&cfg.ns)
		.use_db(&cfg.db)
		.await
		.with_context(|| format!("use_ns/use_db failed for ns={} db= {}", cfg.ns, cfg.db))?;

	Ok(db)
}

/// Settings read from `database/dummy.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DummyCfg {
	pub count: usize,
	pub exclude: Vec<String>,
	pub auth_app: String,
	pub manifest: PathBuf,
	pub schema_dir: PathBuf,
	pub bootstrap: BootstrapCfg,
}

impl Default for DummyCfg {
	fn default() -> Self {
		Self {
			count: DEFAULT_COUNT,
			exclude: Vec::new(),
			auth_app: "auth".to_string(),
			manifest: PathBuf::from(DEFAULT_MANIFEST_PATH),
			schema_dir: PathBuf::from(DEFAULT_SCHEMA_DIR),
			bootstrap: BootstrapCfg::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BootstrapCfg {
	pub group_table: String,
	pub groups: Vec<String>,
	pub user_table: String,
	pub admin_username: String,
	pub admin_email: String,
	pub admin_password: String,
	pub admin_password_env: Option<String>,
}

impl Default for BootstrapCfg {
	fn default() -> Self {
		Self {
			group_table: "group".to_string(),
			groups: vec![
				"managers".to_string(),
				"operators".to_string(),
				"superoperators".to_string(),
			],
			user_table: "user".to_string(),
			admin_username: "admin".to_string(),
			admin_email: "admin@example.com".to_string(),
			admin_password: "admin".to_string(),
			admin_password_env: None,
		}
	}
}

/// The administrative account bootstrap makes sure exists.
#[derive(Debug, Clone)]
pub struct AdminAccount {
	pub table: String,
	pub username: String,
	pub email: String,
	pub password: String,
}

impl BootstrapCfg {
	pub fn admin_account(&self, env: &DotEnv) -> AdminAccount {
		let password = self
			.admin_password_env
			.as_ref()
			.and_then(|key| env.get_var(key.clone()))
			.unwrap_or_else(|| self.admin_password.clone());

		AdminAccount {
			table: self.user_table.clone(),
			username: self.admin_username.clone(),
			email: self.admin_email.clone(),
			password,
		}
	}
}

impl DummyCfg {
	pub fn load() -> Result<Self> {
		Self::load_from(Path::new(DUMMY_CONFIG_PATH))
	}

	pub fn load_from(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}

		let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
		Self::parse(&raw).with_context(|| format!("parsing {:?}", path))
	}

	pub fn parse(raw: &str) -> Result<Self> {
		Ok(toml::from_str(raw)?)
	}
}
