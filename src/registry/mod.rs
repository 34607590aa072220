mod manifest;
mod schema;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::config::DummyCfg;
use crate::core::display;
use crate::filters::glob_match;

#[cfg(test)]
pub use manifest::parse_manifest;
use schema::models_from_schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
	ShortText,
	LongText,
	Date,
	DateTime,
	Boolean,
	Integer,
	Decimal,
	Url,
	Email,
	ForeignKey,
	ManyToMany,
	Other,
}

impl FieldKind {
	pub fn label(&self) -> &'static str {
		match self {
			Self::ShortText => "short_text",
			Self::LongText => "long_text",
			Self::Date => "date",
			Self::DateTime => "date_time",
			Self::Boolean => "boolean",
			Self::Integer => "integer",
			Self::Decimal => "decimal",
			Self::Url => "url",
			Self::Email => "email",
			Self::ForeignKey => "foreign_key",
			Self::ManyToMany => "many_to_many",
			Self::Other => "other",
		}
	}
}

/// Explicit value source for a field. Takes precedence over the
/// name-based guesses in `synth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
	Email,
	Phone,
	Name,
	Sentence,
	Paragraph,
	Url,
	LanguageCode,
}

impl GeneratorKind {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"email" => Some(Self::Email),
			"phone" => Some(Self::Phone),
			"name" => Some(Self::Name),
			"sentence" => Some(Self::Sentence),
			"paragraph" => Some(Self::Paragraph),
			"url" => Some(Self::Url),
			"language_code" => Some(Self::LanguageCode),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
	pub name: String,
	pub kind: FieldKind,
	pub required: bool,
	pub unique: bool,
	pub max_length: Option<usize>,
	pub max_digits: Option<u32>,
	pub decimal_places: Option<u32>,
	/// Table of the related model for relationship kinds.
	pub target: Option<String>,
	pub generator: Option<GeneratorKind>,
}

impl FieldDescriptor {
	pub fn new(name: &str, kind: FieldKind) -> Self {
		Self {
			name: name.to_string(),
			kind,
			required: true,
			unique: false,
			max_length: None,
			max_digits: None,
			decimal_places: None,
			target: None,
			generator: None,
		}
	}

	pub fn is_relation(&self) -> bool {
		matches!(self.kind, FieldKind::ForeignKey | FieldKind::ManyToMany)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
	pub app: String,
	pub name: String,
	pub table: String,
	/// Scalar and single-valued relationship fields, in declaration order.
	pub fields: Vec<FieldDescriptor>,
	pub many_to_many: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
	pub fn new(app: &str, name: &str) -> Self {
		Self {
			app: app.to_string(),
			name: name.to_string(),
			table: name.to_string(),
			fields: Vec::new(),
			many_to_many: Vec::new(),
		}
	}

	/// Adds a field, routing multi-valued relationships to `many_to_many`.
	pub fn push_field(&mut self, field: FieldDescriptor) {
		if field.kind == FieldKind::ManyToMany {
			self.many_to_many.push(field);
		} else {
			self.fields.push(field);
		}
	}

	#[cfg(test)]
	pub fn with_field(mut self, field: FieldDescriptor) -> Self {
		self.push_field(field);
		self
	}

	pub fn label(&self) -> String {
		format!("{}.{}", self.app, self.name)
	}

	/// Tables this model must reference through a required single-valued
	/// relationship, excluding itself.
	pub fn required_targets(&self) -> impl Iterator<Item = &str> {
		self.fields
			.iter()
			.filter(|f| f.kind == FieldKind::ForeignKey && f.required)
			.filter_map(|f| f.target.as_deref())
			.filter(move |t| *t != self.table)
	}
}

/// Every model known to the application, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
	models: Vec<ModelDescriptor>,
}

impl Registry {
	/// Builds the registry from the manifest when it lists any model,
	/// otherwise from the `DEFINE` statements under the schema directory.
	pub fn load(cfg: &DummyCfg) -> Result<Self> {
		let mut models = Vec::new();
		if cfg.manifest.exists() {
			let path = display(&cfg.manifest);
			tracing::debug!(path = %path, "loading model manifest");
			models = manifest::load_manifest(&cfg.manifest)?;
		}
		if models.is_empty() {
			let path = display(&cfg.schema_dir);
			tracing::debug!(path = %path, "deriving models from schema files");
			let sources = schema::collect_schema_sources(&cfg.schema_dir)?;
			models = models_from_schema(&sources);
		}
		Self::from_models(models)
	}

	/// Validates table uniqueness and normalizes relationship targets given
	/// as `app.model` labels into table names.
	pub fn from_models(mut models: Vec<ModelDescriptor>) -> Result<Self> {
		let mut tables = BTreeSet::new();
		for model in &models {
			if !tables.insert(model.table.clone()) {
				bail!("table '{}' is registered by more than one model", model.table);
			}
		}

		let by_label: BTreeMap<String, String> = models
			.iter()
			.map(|m| (m.label(), m.table.clone()))
			.collect();

		for model in &mut models {
			let label = model.label();
			for field in model.fields.iter_mut().chain(model.many_to_many.iter_mut()) {
				if !field.is_relation() {
					continue;
				}
				let Some(target) = field.target.take() else {
					bail!(
						"relationship field '{}' on {} has no target",
						field.name,
						label
					);
				};
				field.target = Some(resolve_target(&by_label, &target));
			}
		}

		Ok(Self { models })
	}

	pub fn models(&self) -> &[ModelDescriptor] {
		&self.models
	}

	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Models to generate for: everything except the auth group and any
	/// model whose label matches an exclusion pattern.
	pub fn select(&self, exclude: &[String], auth_app: &str) -> Vec<&ModelDescriptor> {
		self.models
			.iter()
			.filter(|m| m.app != auth_app)
			.filter(|m| {
				let label = m.label();
				!exclude.iter().any(|pattern| glob_match(pattern, &label))
			})
			.collect()
	}
}

fn resolve_target(by_label: &BTreeMap<String, String>, target: &str) -> String {
	if let Some(table) = by_label.get(target) {
		return table.clone();
	}
	match target.split_once('.') {
		Some((_, name)) => name.to_string(),
		None => target.to_string(),
	}
}
