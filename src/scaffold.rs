use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::config::{DEFAULT_MANIFEST_PATH, DEFAULT_SCHEMA_DIR, DUMMY_CONFIG_PATH};
use crate::core::display;

pub fn scaffold() -> Result<()> {
	fs::create_dir_all(DEFAULT_SCHEMA_DIR).context("creating database/schema")?;

	let mut written = Vec::new();
	for (path, body) in [
		(DUMMY_CONFIG_PATH, DEFAULT_DUMMY_CONFIG),
		(DEFAULT_MANIFEST_PATH, DEFAULT_MANIFEST),
	] {
		if write_if_absent(Path::new(path), body)? {
			written.push(path);
		}
	}

	if written.is_empty() {
		println!("Nothing to scaffold, configuration already present");
	} else {
		println!("Scaffolded {}", written.join(", "));
	}
	Ok(())
}

fn write_if_absent(path: &Path, body: &str) -> Result<bool> {
	if path.exists() {
		return Ok(false);
	}
	fs::write(path, body).with_context(|| format!("Writing {}", display(path)))?;
	Ok(true)
}

pub const DEFAULT_DUMMY_CONFIG: &str = r#"# Dummy data generation settings. Every key is optional.

# Instances created per model.
count = 100

# Models to leave alone, as app.model globs.
exclude = []

# App whose models are never generated for.
auth_app = "auth"

manifest = "database/models.toml"
schema_dir = "database/schema"

[bootstrap]
group_table = "group"
groups = ["managers", "operators", "superoperators"]
user_table = "user"
admin_username = "admin"
admin_email = "admin@example.com"
admin_password = "admin"
# admin_password_env = "DUMMY_ADMIN_PASSWORD"
"#;

pub const DEFAULT_MANIFEST: &str = r#"# Model registry. While no model is listed here, models are read from the
# DEFINE statements under database/schema instead.
#
# [[models]]
# app = "blog"
# name = "author"
#
# [[models.fields]]
# name = "name"
# kind = "short_text"
# max_length = 80
#
# [[models.fields]]
# name = "email"
# kind = "email"
# unique = true
#
# [[models]]
# app = "blog"
# name = "post"
#
# [[models.fields]]
# name = "author"
# kind = "foreign_key"
# target = "blog.author"
#
# [[models.fields]]
# name = "tags"
# kind = "many_to_many"
# target = "blog.tag"
# required = false
"#;

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::DummyCfg;
	use crate::registry::parse_manifest;

	#[test]
	fn templates_parse() {
		let cfg = DummyCfg::parse(DEFAULT_DUMMY_CONFIG).expect("config template parses");
		assert_eq!(cfg.count, 100);
		assert!(cfg.bootstrap.admin_password_env.is_none());

		let models = parse_manifest(DEFAULT_MANIFEST).expect("manifest template parses");
		assert!(models.is_empty());
	}

	#[test]
	fn existing_files_are_left_alone() {
		let dir = std::env::temp_dir().join(format!("surrealdummy-scaffold-{}", std::process::id()));
		fs::create_dir_all(&dir).unwrap();
		let path = dir.join("dummy.toml");
		fs::write(&path, "count = 3\n").unwrap();

		assert!(!write_if_absent(&path, DEFAULT_DUMMY_CONFIG).unwrap());
		assert_eq!(fs::read_to_string(&path).unwrap(), "count = 3\n");

		fs::remove_dir_all(&dir).unwrap();
	}
}
