use crate::config::{AdminAccount, BootstrapCfg};
use crate::store::Store;

/// Makes sure the permission groups and an administrative account exist.
/// Nothing here is allowed to stop the run; failures are only logged.
pub async fn run_bootstrap<S: Store>(store: &S, cfg: &BootstrapCfg, admin: &AdminAccount) {
	for group in &cfg.groups {
		match store.ensure_group(&cfg.group_table, group).await {
			Ok(true) => tracing::info!(group = %group, "created group"),
			Ok(false) => tracing::debug!(group = %group, "group already exists"),
			Err(err) => tracing::error!(group = %group, "error creating group: {err:#}"),
		}
	}

	match store.ensure_admin(admin).await {
		Ok(true) => tracing::info!(username = %admin.username, "created admin account"),
		Ok(false) => tracing::debug!("an admin account already exists"),
		Err(err) => tracing::error!("error creating admin account: {err:#}"),
	}
}

#[cfg(test)]
mod tests {
	use anyhow::{Result, bail};
	use rand::rngs::StdRng;

	use super::*;
	use crate::registry::ModelDescriptor;
	use crate::store::{MemoryStore, RecordRef};
	use crate::synth::FieldValue;

	fn admin() -> AdminAccount {
		BootstrapCfg::default().admin_account(&rust_dotenv::dotenv::DotEnv::new(""))
	}

	#[tokio::test]
	async fn second_bootstrap_creates_nothing() {
		let store = MemoryStore::new();
		let cfg = BootstrapCfg::default();
		run_bootstrap(&store, &cfg, &admin()).await;
		run_bootstrap(&store, &cfg, &admin()).await;
		assert_eq!(
			store.groups(),
			vec!["managers", "operators", "superoperators"]
		);
		assert_eq!(store.admin_count(), 1);
	}

	struct BrokenStore;

	impl Store for BrokenStore {
		async fn ensure_group(&self, _table: &str, _name: &str) -> Result<bool> {
			bail!("permission denied")
		}
		async fn ensure_admin(&self, _admin: &AdminAccount) -> Result<bool> {
			bail!("permission denied")
		}
		async fn save_instance(
			&self,
			_record: &RecordRef,
			_model: &ModelDescriptor,
			_values: &[(String, FieldValue)],
		) -> Result<()> {
			bail!("unused")
		}
		async fn random_existing(
			&self,
			_table: &str,
			_rng: &mut StdRng,
		) -> Result<Option<RecordRef>> {
			Ok(None)
		}
		async fn set_relation(
			&self,
			_instance: &RecordRef,
			_field: &str,
			_targets: &[RecordRef],
		) -> Result<()> {
			Ok(())
		}
	}

	#[tokio::test]
	async fn failures_do_not_abort() {
		run_bootstrap(&BrokenStore, &BootstrapCfg::default(), &admin()).await;
	}
}
