use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use anyhow::{Result, anyhow, bail};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;

use super::{RecordRef, Store};
use crate::config::AdminAccount;
use crate::registry::ModelDescriptor;
use crate::synth::FieldValue;

/// Stored form of one record's fields.
pub type Row = BTreeMap<String, FieldValue>;

/// In-process store used for `--dry-run`. Enforces what a schemafull table
/// would: required fields must be set and unique fields must not repeat.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: RefCell<BTreeMap<String, BTreeMap<String, Row>>>,
	groups: RefCell<Vec<String>>,
	admins: RefCell<Vec<String>>,
	relations: RefCell<BTreeMap<(RecordRef, String), Vec<RecordRef>>>,
	next_key: Cell<u64>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a row as if it had been created by an earlier run.
	pub fn insert_existing(&self, table: &str, row: Row) -> RecordRef {
		let n = self.next_key.get() + 1;
		self.next_key.set(n);
		let record = RecordRef::new(table, &format!("r{n}"));
		self.insert(&record, row);
		record
	}

	fn insert(&self, record: &RecordRef, row: Row) {
		self.tables
			.borrow_mut()
			.entry(record.table.clone())
			.or_default()
			.insert(record.key.clone(), row);
	}

	fn exists(&self, record: &RecordRef) -> bool {
		self.tables
			.borrow()
			.get(&record.table)
			.is_some_and(|rows| rows.contains_key(&record.key))
	}
}

#[cfg(test)]
impl MemoryStore {
	pub fn count(&self, table: &str) -> usize {
		self.tables.borrow().get(table).map_or(0, BTreeMap::len)
	}

	pub fn groups(&self) -> Vec<String> {
		self.groups.borrow().clone()
	}

	pub fn admin_count(&self) -> usize {
		self.admins.borrow().len()
	}

	pub fn rows(&self, table: &str) -> Vec<Row> {
		self.tables
			.borrow()
			.get(table)
			.map(|rows| rows.values().cloned().collect())
			.unwrap_or_default()
	}

	pub fn related(&self, instance: &RecordRef, field: &str) -> Vec<RecordRef> {
		self.relations
			.borrow()
			.get(&(instance.clone(), field.to_string()))
			.cloned()
			.unwrap_or_default()
	}

	pub fn relation_count(&self) -> usize {
		self.relations.borrow().len()
	}
}

impl Store for MemoryStore {
	async fn ensure_group(&self, _table: &str, name: &str) -> Result<bool> {
		let mut groups = self.groups.borrow_mut();
		if groups.iter().any(|g| g == name) {
			return Ok(false);
		}
		groups.push(name.to_string());
		Ok(true)
	}

	async fn ensure_admin(&self, admin: &AdminAccount) -> Result<bool> {
		let mut admins = self.admins.borrow_mut();
		if !admins.is_empty() {
			return Ok(false);
		}
		admins.push(admin.username.clone());
		Ok(true)
	}

	async fn save_instance(
		&self,
		record: &RecordRef,
		model: &ModelDescriptor,
		values: &[(String, FieldValue)],
	) -> Result<()> {
		if record.table != model.table {
			bail!("record {record} does not belong to table {}", model.table);
		}
		if self.exists(record) {
			bail!("record {record} already exists");
		}

		let row: Row = values.iter().cloned().collect();

		for field in &model.fields {
			let value = row.get(&field.name);
			if field.required && value.is_none() {
				bail!("field '{}' on {} requires a value", field.name, model.table);
			}
			if let Some(FieldValue::Record(target)) = value {
				if !self.exists(target) {
					bail!("field '{}' links missing record {}", field.name, target);
				}
			}
			if field.unique {
				if let Some(value) = value {
					let tables = self.tables.borrow();
					let clash = tables
						.get(&model.table)
						.is_some_and(|rows| rows.values().any(|r| r.get(&field.name) == Some(value)));
					if clash {
						bail!(
							"unique index on {}.{} already contains this value",
							model.table,
							field.name
						);
					}
				}
			}
		}

		self.insert(record, row);
		Ok(())
	}

	async fn random_existing(&self, table: &str, rng: &mut StdRng) -> Result<Option<RecordRef>> {
		let tables = self.tables.borrow();
		let Some(rows) = tables.get(table) else {
			return Ok(None);
		};
		Ok(rows.keys().choose(rng).map(|key| RecordRef::new(table, key)))
	}

	async fn set_relation(
		&self,
		instance: &RecordRef,
		field: &str,
		targets: &[RecordRef],
	) -> Result<()> {
		if !self.exists(instance) {
			return Err(anyhow!("record {instance} does not exist"));
		}
		self.relations
			.borrow_mut()
			.insert((instance.clone(), field.to_string()), targets.to_vec());
		Ok(())
	}
}
