use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{FieldDescriptor, FieldKind, GeneratorKind, ModelDescriptor};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
	#[serde(default)]
	models: Vec<ManifestModel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestModel {
	app: String,
	name: String,
	table: Option<String>,
	#[serde(default)]
	fields: Vec<ManifestField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestField {
	name: String,
	kind: FieldKind,
	#[serde(default = "default_true")]
	required: bool,
	#[serde(default)]
	unique: bool,
	max_length: Option<usize>,
	max_digits: Option<u32>,
	decimal_places: Option<u32>,
	target: Option<String>,
	generator: Option<GeneratorKind>,
}

fn default_true() -> bool {
	true
}

pub(super) fn load_manifest(path: &Path) -> Result<Vec<ModelDescriptor>> {
	let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
	parse_manifest(&raw).with_context(|| format!("parsing {:?}", path))
}

pub fn parse_manifest(raw: &str) -> Result<Vec<ModelDescriptor>> {
	let file: ManifestFile = toml::from_str(raw)?;
	Ok(file.models.into_iter().map(into_model).collect())
}

fn into_model(entry: ManifestModel) -> ModelDescriptor {
	let mut model = ModelDescriptor::new(&entry.app, &entry.name);
	if let Some(table) = entry.table {
		model.table = table;
	}

	for field in entry.fields {
		model.push_field(FieldDescriptor {
			name: field.name,
			kind: field.kind,
			required: field.required,
			unique: field.unique,
			max_length: field.max_length,
			max_digits: field.max_digits,
			decimal_places: field.decimal_places,
			target: field.target,
			generator: field.generator,
		});
	}
	model
}
