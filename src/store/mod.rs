mod memory;
mod surreal;

use std::fmt;

use anyhow::{Result, anyhow};
use rand::rngs::StdRng;

use crate::config::AdminAccount;
use crate::registry::ModelDescriptor;
use crate::synth::FieldValue;

pub use memory::MemoryStore;
#[cfg(test)]
pub use memory::Row;
pub use surreal::SurrealStore;

/// A persisted record, rendered as the SurrealQL literal `table:key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordRef {
	pub table: String,
	pub key: String,
}

impl RecordRef {
	pub fn new(table: &str, key: &str) -> Self {
		Self {
			table: table.to_string(),
			key: key.to_string(),
		}
	}

	pub fn parse(raw: &str) -> Result<Self> {
		let (table, key) = raw
			.split_once(':')
			.ok_or_else(|| anyhow!("'{raw}' is not a record id"))?;
		if table.is_empty() || key.is_empty() {
			return Err(anyhow!("'{raw}' is not a record id"));
		}
		Ok(Self::new(table, key))
	}
}

impl fmt::Display for RecordRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.table, self.key)
	}
}

/// The storage operations the generator needs.
#[allow(async_fn_in_trait)]
pub trait Store {
	/// Creates the named group unless it exists. Reports whether it was created.
	async fn ensure_group(&self, table: &str, name: &str) -> Result<bool>;

	/// Creates the admin account unless some superuser exists. Reports
	/// whether it was created.
	async fn ensure_admin(&self, admin: &AdminAccount) -> Result<bool>;

	/// Persists one instance of `model` under `record`. Fields absent from
	/// `values` keep their default.
	async fn save_instance(
		&self,
		record: &RecordRef,
		model: &ModelDescriptor,
		values: &[(String, FieldValue)],
	) -> Result<()>;

	/// A randomly picked existing record of `table`, or `None` when it is
	/// empty. Stores that sample on their own side may ignore `rng`.
	async fn random_existing(&self, table: &str, rng: &mut StdRng) -> Result<Option<RecordRef>>;

	/// Replaces the set of records linked through a multi-valued field.
	async fn set_relation(
		&self,
		instance: &RecordRef,
		field: &str,
		targets: &[RecordRef],
	) -> Result<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_refs_render_as_surql_literals() {
		let r = RecordRef::parse("person:abc123").expect("valid id");
		assert_eq!(r.table, "person");
		assert_eq!(r.key, "abc123");
		assert_eq!(r.to_string(), "person:abc123");
	}

	#[test]
	fn escaped_keys_keep_their_brackets() {
		let r = RecordRef::parse("person:⟨a:b⟩").expect("valid id");
		assert_eq!(r.table, "person");
		assert_eq!(r.key, "⟨a:b⟩");
	}

	#[test]
	fn malformed_ids_are_rejected() {
		assert!(RecordRef::parse("person").is_err());
		assert!(RecordRef::parse(":abc").is_err());
		assert!(RecordRef::parse("person:").is_err());
	}
}
