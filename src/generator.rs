use anyhow::Result;

use crate::bootstrap::run_bootstrap;
use crate::config::{AdminAccount, BootstrapCfg};
use crate::core::ensure_ident;
use crate::faker::Faker;
use crate::ledger::CreationLedger;
use crate::order::dependency_order;
use crate::registry::{FieldDescriptor, FieldKind, ModelDescriptor, Registry};
use crate::report::{ModelOutcome, RunSummary};
use crate::store::{RecordRef, Store};
use crate::synth::{FieldValue, synthesize};

#[derive(Debug, Clone)]
pub struct GenerateSettings {
	pub count: usize,
	pub exclude: Vec<String>,
	pub auth_app: String,
	pub bootstrap: BootstrapCfg,
	pub admin: AdminAccount,
}

/// Bootstraps auth records, then fills every selected model of the registry.
pub async fn run_generation<S: Store>(
	store: &S,
	registry: &Registry,
	settings: &GenerateSettings,
	faker: Faker,
) -> Result<RunSummary> {
	run_bootstrap(store, &settings.bootstrap, &settings.admin).await;

	let models = registry.select(&settings.exclude, &settings.auth_app);
	let mut generator = Generator::new(store, faker, settings.count);
	generator.run(&models).await
}

pub struct Generator<'a, S: Store> {
	store: &'a S,
	faker: Faker,
	ledger: CreationLedger,
	count: usize,
}

impl<'a, S: Store> Generator<'a, S> {
	pub fn new(store: &'a S, faker: Faker, count: usize) -> Self {
		Self {
			store,
			faker,
			ledger: CreationLedger::new(),
			count,
		}
	}

	#[cfg(test)]
	pub fn ledger(&self) -> &CreationLedger {
		&self.ledger
	}

	/// Generates `count` instances per model in dependency order, then links
	/// many-to-many fields. Only a dependency cycle fails the whole run.
	pub async fn run(&mut self, models: &[&ModelDescriptor]) -> Result<RunSummary> {
		let ordered = dependency_order(models)?;
		let mut summary = RunSummary::default();
		let mut processed = Vec::with_capacity(ordered.len());

		for model in ordered {
			let label = model.label();
			println!("Generating data for {label}...");

			match self.generate_model(model).await {
				Ok(created) => {
					println!("  created {created} of {}", self.count);
					summary.processed.push(ModelOutcome {
						label,
						attempted: self.count,
						created,
					});
					processed.push(model);
				}
				Err(err) => {
					tracing::error!(model = %label, "error generating data: {err:#}");
					summary.skipped.push(label);
				}
			}
		}

		summary.links_set = self.wire_many_to_many(&processed).await;
		Ok(summary)
	}

	async fn generate_model(&mut self, model: &ModelDescriptor) -> Result<usize> {
		validate_model(model)?;

		let mut created = 0;
		for i in 0..self.count {
			let values = self.build_instance(model).await;
			let record = RecordRef::new(&model.table, &self.faker.record_key());
			match self.store.save_instance(&record, model, &values).await {
				Ok(()) => {
					self.ledger.record(record);
					created += 1;
				}
				Err(err) => {
					tracing::error!(
						model = %model.label(),
						instance = i,
						"error creating instance: {err:#}"
					);
				}
			}
		}
		Ok(created)
	}

	/// Values for every field but the identity. Fields without a value are
	/// left out so the storage default applies.
	pub async fn build_instance(&mut self, model: &ModelDescriptor) -> Vec<(String, FieldValue)> {
		let mut values = Vec::with_capacity(model.fields.len());
		for field in &model.fields {
			if field.name == "id" {
				continue;
			}

			let value = if field.kind == FieldKind::ForeignKey {
				self.resolve_relation(field).await.map(FieldValue::Record)
			} else {
				match synthesize(&mut self.faker, field) {
					Ok(value) => value,
					Err(err) => {
						tracing::warn!(field = %field.name, "error generating value: {err:#}");
						None
					}
				}
			};

			if let Some(value) = value {
				values.push((field.name.clone(), value));
			}
		}
		values
	}

	/// A record for a single-valued relationship: one created earlier in this
	/// run if any, else any record already stored, else nothing.
	pub async fn resolve_relation(&mut self, field: &FieldDescriptor) -> Option<RecordRef> {
		let target = field.target.as_deref()?;
		if let Some(record) = self.ledger.choose(target, self.faker.rng()) {
			return Some(record.clone());
		}

		match self.store.random_existing(target, self.faker.rng()).await {
			Ok(record) => record,
			Err(err) => {
				tracing::warn!(target = %target, "error looking up existing record: {err:#}");
				None
			}
		}
	}

	async fn wire_many_to_many(&mut self, models: &[&ModelDescriptor]) -> usize {
		let mut linked = 0;
		for model in models {
			for field in &model.many_to_many {
				let Some(target) = field.target.as_deref() else {
					continue;
				};
				if self.ledger.count(target) == 0 {
					tracing::debug!(
						model = %model.label(),
						field = %field.name,
						"no {target} records created in this run, leaving field unset"
					);
					continue;
				}

				let instances = self.ledger.created(&model.table).to_vec();
				for instance in &instances {
					let related = self.ledger.sample(target, self.faker.rng());
					match self.store.set_relation(instance, &field.name, &related).await {
						Ok(()) => linked += 1,
						Err(err) => tracing::warn!(
							instance = %instance,
							field = %field.name,
							"error linking records: {err:#}"
						),
					}
				}
			}
		}
		linked
	}
}

/// Identifiers end up in SurrealQL text; a model that fails here is skipped
/// before any instance is attempted.
fn validate_model(model: &ModelDescriptor) -> Result<()> {
	ensure_ident("table", &model.table)?;
	for field in model.fields.iter().chain(&model.many_to_many) {
		ensure_ident("field", &field.name)?;
		if let Some(target) = &field.target {
			ensure_ident("table", target)?;
		}
	}
	Ok(())
}
