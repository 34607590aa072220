use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;
use surrealdb::{
	Surreal,
	engine::any::{Any, connect},
	opt::{Config, capabilities::Capabilities},
};

static IDENT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

pub async fn create_surreal_client(address: &String) -> Result<Surreal<Any>, surrealdb::Error> {
	let config =
		Config::new().capabilities(Capabilities::all().with_all_experimental_features_allowed());

	connect((address, config)).await
}

pub fn display(p: &Path) -> String {
	p.to_string_lossy().replace('\\', "/")
}

/// Table and field names are spliced into SurrealQL text, so only plain
/// identifiers are accepted.
pub fn ensure_ident(kind: &str, value: &str) -> Result<()> {
	if !IDENT.is_match(value) {
		bail!("{kind} name '{value}' is not a plain identifier");
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identifiers_are_validated() {
		assert!(ensure_ident("table", "blog_post").is_ok());
		assert!(ensure_ident("field", "_meta2").is_ok());
		assert!(ensure_ident("table", "2fast").is_err());
		assert!(ensure_ident("field", "name; DELETE user").is_err());
		assert!(ensure_ident("field", "address.city").is_err());
	}
}
