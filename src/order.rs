use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, bail};

use crate::registry::ModelDescriptor;

/// Orders models so that the target of every required relationship is
/// generated before the model referencing it.
///
/// Kahn's algorithm; among models that are ready at the same time the one
/// discovered first goes first, so the result is deterministic. Targets that
/// are not part of `models` (excluded, auth, or seeded elsewhere) and
/// self-references impose no constraint. A cycle is a configuration error.
pub fn dependency_order<'a>(models: &[&'a ModelDescriptor]) -> Result<Vec<&'a ModelDescriptor>> {
	let index: BTreeMap<&str, usize> = models
		.iter()
		.enumerate()
		.map(|(i, m)| (m.table.as_str(), i))
		.collect();

	let mut in_degree = vec![0usize; models.len()];
	let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); models.len()];

	for (i, model) in models.iter().enumerate() {
		let deps: BTreeSet<usize> = model
			.required_targets()
			.filter_map(|target| index.get(target).copied())
			.collect();
		in_degree[i] = deps.len();
		for dep in deps {
			dependents[dep].push(i);
		}
	}

	let mut ready: BTreeSet<usize> = (0..models.len()).filter(|&i| in_degree[i] == 0).collect();
	let mut out = Vec::with_capacity(models.len());

	while let Some(current) = ready.pop_first() {
		out.push(models[current]);
		for &dependent in &dependents[current] {
			in_degree[dependent] -= 1;
			if in_degree[dependent] == 0 {
				ready.insert(dependent);
			}
		}
	}

	if out.len() != models.len() {
		let stuck: Vec<String> = models
			.iter()
			.enumerate()
			.filter(|(i, _)| in_degree[*i] > 0)
			.map(|(_, m)| m.label())
			.collect();
		bail!(
			"circular required relationships between models: {}",
			stuck.join(", ")
		);
	}

	Ok(out)
}
