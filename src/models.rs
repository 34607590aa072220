use anyhow::Result;

use crate::config::DummyCfg;
use crate::order::dependency_order;
use crate::registry::{FieldDescriptor, ModelDescriptor, Registry};

/// Prints the models `generate` would fill, in the order it would fill them.
pub fn list_models(exclude: &[String]) -> Result<()> {
	let cfg = DummyCfg::load()?;
	let registry = Registry::load(&cfg)?;

	let mut patterns = cfg.exclude.clone();
	patterns.extend(exclude.iter().cloned());
	let selected = registry.select(&patterns, &cfg.auth_app);

	if selected.is_empty() {
		println!("No models found");
		return Ok(());
	}

	let ordered = dependency_order(&selected)?;
	println!(
		"{} models discovered, {} selected. Generation order:",
		registry.models().len(),
		ordered.len()
	);
	for line in describe(&ordered) {
		println!("{line}");
	}
	Ok(())
}

fn describe(models: &[&ModelDescriptor]) -> Vec<String> {
	let mut out = Vec::new();
	for model in models {
		out.push(format!("{} ({})", model.label(), model.table));
		for field in model.fields.iter().chain(&model.many_to_many) {
			out.push(format!("  {}", describe_field(field)));
		}
	}
	out
}

fn describe_field(field: &FieldDescriptor) -> String {
	let mut parts = vec![field.kind.label().to_string()];
	if let Some(target) = &field.target {
		parts.push(format!("-> {target}"));
	}
	if !field.required {
		parts.push("optional".to_string());
	}
	if field.unique {
		parts.push("unique".to_string());
	}
	if let Some(max) = field.max_length {
		parts.push(format!("max {max}"));
	}
	if let (Some(digits), Some(places)) = (field.max_digits, field.decimal_places) {
		parts.push(format!("{digits},{places}"));
	}
	format!("{}: {}", field.name, parts.join(" "))
}
