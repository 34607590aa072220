#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOutcome {
	pub label: String,
	pub attempted: usize,
	pub created: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub processed: Vec<ModelOutcome>,
	pub skipped: Vec<String>,
	pub links_set: usize,
}

impl RunSummary {
	pub fn created_total(&self) -> usize {
		self.processed.iter().map(|m| m.created).sum()
	}

	pub fn outcome(&self, label: &str) -> Option<&ModelOutcome> {
		self.processed.iter().find(|m| m.label == label)
	}

	pub fn lines(&self) -> Vec<String> {
		let mut out = vec![format!(
			"Successfully generated data for {} models",
			self.processed.len()
		)];
		out.push(format!(
			"  records: {} created, {} many-to-many sets linked",
			self.created_total(),
			self.links_set
		));
		for model in &self.processed {
			if model.created < model.attempted {
				out.push(format!(
					"  {}: {} of {} records failed",
					model.label,
					model.attempted - model.created,
					model.attempted
				));
			}
		}
		if !self.skipped.is_empty() {
			out.push(format!("Skipped models: {}", self.skipped.join(", ")));
		}
		out
	}
}

pub fn print_summary(summary: &RunSummary) {
	for line in summary.lines() {
		println!("{line}");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summary_lists_partial_failures_and_skips() {
		let summary = RunSummary {
			processed: vec![
				ModelOutcome {
					label: "blog.post".into(),
					attempted: 100,
					created: 100,
				},
				ModelOutcome {
					label: "blog.comment".into(),
					attempted: 100,
					created: 0,
				},
			],
			skipped: vec!["shop.order".into()],
			links_set: 40,
		};

		let lines = summary.lines();
		assert_eq!(lines[0], "Successfully generated data for 2 models");
		assert!(lines.contains(&"  blog.comment: 100 of 100 records failed".to_string()));
		assert!(!lines.iter().any(|l| l.contains("blog.post:")));
		assert_eq!(lines.last().unwrap(), "Skipped models: shop.order");
	}
}
