use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::store::RecordRef;

/// Most records linked through one multi-valued field per instance.
pub const MAX_LINKS: usize = 5;

/// Records created during the current run, keyed by table. Only records that
/// were persisted are ever added.
#[derive(Debug, Default)]
pub struct CreationLedger {
	entries: HashMap<String, Vec<RecordRef>>,
}

impl CreationLedger {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, record: RecordRef) {
		self.entries
			.entry(record.table.clone())
			.or_default()
			.push(record);
	}

	pub fn created(&self, table: &str) -> &[RecordRef] {
		self.entries.get(table).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn count(&self, table: &str) -> usize {
		self.created(table).len()
	}

	pub fn choose<R: Rng + ?Sized>(&self, table: &str, rng: &mut R) -> Option<&RecordRef> {
		self.created(table).choose(rng)
	}

	/// Between one and `MAX_LINKS` distinct records of `table`, or nothing
	/// when none were created.
	pub fn sample<R: Rng + ?Sized>(&self, table: &str, rng: &mut R) -> Vec<RecordRef> {
		let pool = self.created(table);
		if pool.is_empty() {
			return Vec::new();
		}
		let amount = rng.random_range(1..=MAX_LINKS.min(pool.len()));
		pool.choose_multiple(rng, amount).cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	fn ledger_with(table: &str, n: usize) -> CreationLedger {
		let mut ledger = CreationLedger::new();
		for i in 0..n {
			ledger.record(RecordRef::new(table, &format!("k{i}")));
		}
		ledger
	}

	#[test]
	fn records_are_grouped_by_table() {
		let mut ledger = ledger_with("tag", 3);
		ledger.record(RecordRef::new("post", "p1"));
		assert_eq!(ledger.count("tag"), 3);
		assert_eq!(ledger.count("post"), 1);
		assert_eq!(ledger.count("user"), 0);
		assert_eq!(ledger.created("tag")[0].key, "k0");
	}

	#[test]
	fn empty_tables_yield_nothing() {
		let ledger = CreationLedger::new();
		let mut rng = StdRng::seed_from_u64(1);
		assert!(ledger.choose("tag", &mut rng).is_none());
		assert!(ledger.sample("tag", &mut rng).is_empty());
	}

	#[test]
	fn samples_are_distinct_and_bounded() {
		let mut rng = StdRng::seed_from_u64(2);
		let big = ledger_with("tag", 20);
		let small = ledger_with("tag", 2);
		for _ in 0..100 {
			let picked = big.sample("tag", &mut rng);
			assert!((1..=MAX_LINKS).contains(&picked.len()));
			let unique: HashSet<_> = picked.iter().collect();
			assert_eq!(unique.len(), picked.len());

			let picked = small.sample("tag", &mut rng);
			assert!((1..=2).contains(&picked.len()));
		}
	}
}
