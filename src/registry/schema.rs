use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use super::{FieldDescriptor, FieldKind, GeneratorKind, ModelDescriptor};

/// App group for tables defined directly in the schema directory.
pub const ROOT_APP: &str = "app";

static MAX_LEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)string::len\(\s*\$value\s*\)\s*(<=|<)\s*(\d+)").expect("valid length regex")
});

#[derive(Debug, Clone)]
pub struct SchemaSource {
	pub app: String,
	pub sql: String,
}

pub(super) fn collect_schema_sources(dir: &Path) -> Result<Vec<SchemaSource>> {
	let mut files: Vec<PathBuf> = WalkDir::new(dir)
		.follow_links(true)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| p.extension().and_then(|s| s.to_str()) == Some("surql"))
		.collect();

	files.sort();

	let mut out = Vec::with_capacity(files.len());
	for path in files {
		let sql = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
		out.push(SchemaSource {
			app: app_for(dir, &path),
			sql,
		});
	}
	Ok(out)
}

/// `database/schema/blog/post.surql` belongs to the `blog` app.
fn app_for(root: &Path, path: &Path) -> String {
	let rel = path.strip_prefix(root).unwrap_or(path);
	let mut components = rel.components().filter_map(|c| match c {
		Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
		_ => None,
	});
	let first = components.next();
	match (first, components.next()) {
		(Some(dir), Some(_)) => dir,
		_ => ROOT_APP.to_string(),
	}
}

#[derive(Debug, Default)]
struct TableDraft {
	app: String,
	defined: bool,
	fields: Vec<FieldDescriptor>,
	unique: Vec<String>,
}

/// Derives model descriptors from `DEFINE TABLE`, `DEFINE FIELD` and unique
/// `DEFINE INDEX` statements. Tables are returned in definition order.
pub fn models_from_schema(sources: &[SchemaSource]) -> Vec<ModelDescriptor> {
	let mut order: Vec<String> = Vec::new();
	let mut drafts: BTreeMap<String, TableDraft> = BTreeMap::new();

	for source in sources {
		for stmt in split_statements(&strip_line_comments(&source.sql)) {
			let tokens = tokenize(&stmt);
			if tokens.len() < 3 || !eq(tokens[0], "DEFINE") {
				continue;
			}

			match tokens[1].to_ascii_lowercase().as_str() {
				"table" => {
					let Some(name) = define_table(&tokens) else {
						continue;
					};
					let draft = draft_for(&mut drafts, &mut order, &name, &source.app);
					draft.app = source.app.clone();
					draft.defined = true;
				}
				"field" => {
					let Some((table, field)) = define_field(&stmt, &tokens) else {
						continue;
					};
					let draft = draft_for(&mut drafts, &mut order, &table, &source.app);
					draft.fields.retain(|f| f.name != field.name);
					draft.fields.push(field);
				}
				"index" => {
					let Some((table, column)) = define_unique_index(&tokens) else {
						continue;
					};
					draft_for(&mut drafts, &mut order, &table, &source.app)
						.unique
						.push(column);
				}
				_ => {}
			}
		}
	}

	order
		.into_iter()
		.filter_map(|table| {
			let draft = drafts.remove(&table)?;
			if !draft.defined {
				tracing::debug!(table = %table, "fields declared for undefined table, ignoring");
				return None;
			}
			let mut model = ModelDescriptor::new(&draft.app, &table);
			for mut field in draft.fields {
				field.unique = draft.unique.contains(&field.name);
				model.push_field(field);
			}
			Some(model)
		})
		.collect()
}

fn draft_for<'a>(
	drafts: &'a mut BTreeMap<String, TableDraft>,
	order: &mut Vec<String>,
	table: &str,
	app: &str,
) -> &'a mut TableDraft {
	if !drafts.contains_key(table) {
		order.push(table.to_string());
	}
	drafts.entry(table.to_string()).or_insert_with(|| TableDraft {
		app: app.to_string(),
		..TableDraft::default()
	})
}

fn define_table(tokens: &[&str]) -> Option<String> {
	let idx = skip_modifiers(tokens, 2);
	let name = clean_ident(tokens.get(idx)?);
	if name.starts_with('_') {
		return None;
	}
	// Graph edge tables are populated through RELATE, not CREATE.
	if let Some(type_idx) = find_token(tokens, idx + 1, "TYPE") {
		if tokens.get(type_idx + 1).is_some_and(|t| eq(t, "RELATION")) {
			return None;
		}
	}
	Some(name)
}

fn define_field(stmt: &str, tokens: &[&str]) -> Option<(String, FieldDescriptor)> {
	let idx = skip_modifiers(tokens, 2);
	let name = clean_ident(tokens.get(idx)?);
	let on_idx = find_token(tokens, idx + 1, "ON")?;
	let mut scope_idx = on_idx + 1;
	if scope_idx < tokens.len() && eq(tokens[scope_idx], "TABLE") {
		scope_idx += 1;
	}
	let table = clean_ident(tokens.get(scope_idx)?);

	if name == "id" || name.contains(['.', '[', '*']) {
		return None;
	}
	// Computed fields are overwritten by the database.
	if find_token(tokens, scope_idx + 1, "VALUE").is_some() {
		return None;
	}

	let raw_type = find_token(tokens, scope_idx + 1, "TYPE")
		.and_then(|i| type_expr(tokens, i + 1))
		.unwrap_or_else(|| "any".to_string());

	let (mut field, optional) = field_from_type(&name, &raw_type);
	field.required =
		!optional && find_token(tokens, scope_idx + 1, "DEFAULT").is_none() && raw_type != "any";

	let lowered = stmt.to_ascii_lowercase();
	if field.kind == FieldKind::ShortText {
		if lowered.contains("is::email") {
			field.kind = FieldKind::Email;
		} else if lowered.contains("is::url") {
			field.kind = FieldKind::Url;
		}
	}
	if let Some(caps) = MAX_LEN.captures(stmt) {
		let limit: usize = caps[2].parse().ok()?;
		field.max_length = Some(if &caps[1] == "<" {
			limit.saturating_sub(1)
		} else {
			limit
		});
	}
	field.generator = comment_generator(tokens, scope_idx + 1);

	Some((table, field))
}

/// Joins the tokens of a type like `array<record<tag>, 10>` back together.
fn type_expr(tokens: &[&str], start: usize) -> Option<String> {
	let mut out = String::new();
	let mut depth = 0usize;
	for token in tokens.get(start..)? {
		out.push_str(token);
		depth += token.matches('<').count();
		depth = depth.saturating_sub(token.matches('>').count());
		if depth == 0 {
			break;
		}
	}
	if out.is_empty() {
		return None;
	}
	Some(out.trim_end_matches(';').to_ascii_lowercase())
}

/// Maps a SurrealQL type to a field kind. The flag reports `option<...>`.
fn field_from_type(name: &str, raw: &str) -> (FieldDescriptor, bool) {
	if let Some(inner) = unwrap_generic(raw, "option") {
		let (field, _) = field_from_type(name, inner);
		return (field, true);
	}

	let kind = match raw {
		"string" => FieldKind::ShortText,
		"int" => FieldKind::Integer,
		"float" | "number" | "decimal" => FieldKind::Decimal,
		"bool" => FieldKind::Boolean,
		"datetime" => FieldKind::DateTime,
		_ => {
			if let Some(target) = unwrap_generic(raw, "record") {
				return (relation(name, FieldKind::ForeignKey, target), false);
			}
			let collection = unwrap_generic(raw, "array").or_else(|| unwrap_generic(raw, "set"));
			if let Some(target) = collection.and_then(|inner| {
				let item = inner.split(',').next().unwrap_or(inner);
				unwrap_generic(item, "record")
			}) {
				return (relation(name, FieldKind::ManyToMany, target), false);
			}
			FieldKind::Other
		}
	};
	(FieldDescriptor::new(name, kind), false)
}

fn relation(name: &str, kind: FieldKind, target: &str) -> FieldDescriptor {
	let first = target.split('|').next().unwrap_or(target).trim();
	FieldDescriptor {
		target: Some(first.to_string()),
		..FieldDescriptor::new(name, kind)
	}
}

fn unwrap_generic<'a>(raw: &'a str, outer: &str) -> Option<&'a str> {
	raw.strip_prefix(outer)?
		.strip_prefix('<')?
		.strip_suffix('>')
}

/// `COMMENT "dummy:email"` pins the value source of a field.
fn comment_generator(tokens: &[&str], start: usize) -> Option<GeneratorKind> {
	let idx = find_token(tokens, start, "COMMENT")?;
	let text = tokens.get(idx + 1)?.trim_matches(|c| c == '"' || c == '\'' || c == ';');
	GeneratorKind::parse(text.strip_prefix("dummy:")?)
}

fn define_unique_index(tokens: &[&str]) -> Option<(String, String)> {
	let idx = skip_modifiers(tokens, 2);
	let on_idx = find_token(tokens, idx + 1, "ON")?;
	let mut scope_idx = on_idx + 1;
	if scope_idx < tokens.len() && eq(tokens[scope_idx], "TABLE") {
		scope_idx += 1;
	}
	let table = clean_ident(tokens.get(scope_idx)?);
	let unique_idx = find_token(tokens, scope_idx + 1, "UNIQUE")?;
	let cols_idx = find_token(tokens, scope_idx + 1, "FIELDS")
		.or_else(|| find_token(tokens, scope_idx + 1, "COLUMNS"))?;
	if unique_idx <= cols_idx {
		return None;
	}

	let columns: Vec<String> = tokens[cols_idx + 1..unique_idx]
		.join(" ")
		.split(',')
		.map(|c| clean_ident(c.trim()))
		.filter(|c| !c.is_empty())
		.collect();
	// Composite indexes don't make any single field unique.
	match columns.as_slice() {
		[column] => Some((table, column.clone())),
		_ => None,
	}
}

fn strip_line_comments(sql: &str) -> String {
	sql.lines()
		.filter(|line| {
			let t = line.trim_start();
			!(t.starts_with("--") || t.starts_with("//"))
		})
		.collect::<Vec<_>>()
		.join("\n")
}

fn split_statements(sql: &str) -> Vec<String> {
	let mut out = Vec::new();
	let mut buf = String::new();
	let mut in_single = false;
	let mut in_double = false;
	let mut in_backtick = false;
	let mut prev_escape = false;

	for ch in sql.chars() {
		match ch {
			'\'' if !in_double && !in_backtick && !prev_escape => in_single = !in_single,
			'"' if !in_single && !in_backtick && !prev_escape => in_double = !in_double,
			'`' if !in_single && !in_double && !prev_escape => in_backtick = !in_backtick,
			';' if !in_single && !in_double && !in_backtick => {
				let stmt = buf.trim();
				if !stmt.is_empty() {
					out.push(stmt.to_string());
				}
				buf.clear();
				prev_escape = false;
				continue;
			}
			_ => {}
		}

		prev_escape = ch == '\\' && !prev_escape;
		buf.push(ch);
	}

	let tail = buf.trim();
	if !tail.is_empty() {
		out.push(tail.to_string());
	}

	out
}

fn tokenize(stmt: &str) -> Vec<&str> {
	stmt.split_whitespace().collect()
}

fn clean_ident(token: &str) -> String {
	token
		.trim_matches(|c: char| c == ',' || c == ';' || c == '`')
		.to_string()
}

fn skip_modifiers(tokens: &[&str], mut idx: usize) -> usize {
	while idx < tokens.len()
		&& (eq(tokens[idx], "OVERWRITE")
			|| eq(tokens[idx], "IF")
			|| eq(tokens[idx], "NOT")
			|| eq(tokens[idx], "EXISTS"))
	{
		idx += 1;
	}
	idx
}

fn find_token(tokens: &[&str], start: usize, target: &str) -> Option<usize> {
	(start..tokens.len()).find(|&i| eq(tokens[i], target))
}

fn eq(value: &str, expected: &str) -> bool {
	value.eq_ignore_ascii_case(expected)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn source(app: &str, sql: &str) -> SchemaSource {
		SchemaSource {
			app: app.to_string(),
			sql: sql.to_string(),
		}
	}

	#[test]
	fn fields_map_to_kinds() {
		let models = models_from_schema(&[source(
			"blog",
			r#"
			-- authors
			DEFINE TABLE OVERWRITE author SCHEMAFULL;
			DEFINE FIELD OVERWRITE name ON author TYPE string ASSERT string::len($value) <= 40;
			DEFINE FIELD contact ON TABLE author TYPE string ASSERT string::is::email($value);
			DEFINE FIELD homepage ON author TYPE option<string> ASSERT string::is::url($value);
			DEFINE FIELD bio ON author TYPE string COMMENT "dummy:paragraph";
			DEFINE FIELD age ON author TYPE int;
			DEFINE FIELD rating ON author TYPE decimal;
			DEFINE FIELD active ON author TYPE bool DEFAULT true;
			DEFINE FIELD joined ON author TYPE datetime;
			DEFINE FIELD created_at ON author TYPE datetime VALUE time::now();
			DEFINE FIELD address.city ON author TYPE string;
			DEFINE FIELD blob ON author TYPE object;
			DEFINE INDEX by_contact ON author FIELDS contact UNIQUE;
			"#,
		)]);

		assert_eq!(models.len(), 1);
		let author = &models[0];
		assert_eq!(author.label(), "blog.author");
		let kinds: Vec<(&str, FieldKind)> = author
			.fields
			.iter()
			.map(|f| (f.name.as_str(), f.kind))
			.collect();
		assert_eq!(
			kinds,
			vec![
				("name", FieldKind::ShortText),
				("contact", FieldKind::Email),
				("homepage", FieldKind::Url),
				("bio", FieldKind::ShortText),
				("age", FieldKind::Integer),
				("rating", FieldKind::Decimal),
				("active", FieldKind::Boolean),
				("joined", FieldKind::DateTime),
				("blob", FieldKind::Other),
			]
		);
		assert_eq!(author.fields[0].max_length, Some(40));
		assert!(author.fields[1].unique);
		assert!(!author.fields[2].required);
		assert_eq!(author.fields[3].generator, Some(GeneratorKind::Paragraph));
		assert!(!author.fields[6].required);
		assert!(author.fields[7].required);
	}

	#[test]
	fn record_links_become_relationships() {
		let models = models_from_schema(&[source(
			"blog",
			r#"
			DEFINE TABLE post SCHEMAFULL;
			DEFINE FIELD author ON post TYPE record<author>;
			DEFINE FIELD editor ON post TYPE option<record<user>>;
			DEFINE FIELD tags ON post TYPE array<record<tag>, 10>;
			DEFINE FIELD likes ON post TYPE set<record<user>>;
			DEFINE TABLE follows TYPE RELATION IN user OUT user;
			DEFINE TABLE _migration SCHEMAFULL;
			"#,
		)]);

		assert_eq!(models.len(), 1);
		let post = &models[0];
		assert_eq!(post.fields[0].kind, FieldKind::ForeignKey);
		assert_eq!(post.fields[0].target.as_deref(), Some("author"));
		assert!(post.fields[0].required);
		assert_eq!(post.fields[1].target.as_deref(), Some("user"));
		assert!(!post.fields[1].required);
		assert_eq!(post.many_to_many.len(), 2);
		assert_eq!(post.many_to_many[0].target.as_deref(), Some("tag"));
		assert_eq!(post.many_to_many[1].target.as_deref(), Some("user"));
	}

	#[test]
	fn strict_length_bound_is_exclusive() {
		let models = models_from_schema(&[source(
			"app",
			"DEFINE TABLE t; DEFINE FIELD code ON t TYPE string ASSERT string::len($value) < 8;",
		)]);
		assert_eq!(models[0].fields[0].max_length, Some(7));
	}

	#[test]
	fn composite_unique_index_marks_nothing() {
		let models = models_from_schema(&[source(
			"app",
			r#"
			DEFINE TABLE seat;
			DEFINE FIELD row ON seat TYPE int;
			DEFINE FIELD col ON seat TYPE int;
			DEFINE INDEX rc ON seat FIELDS row, col UNIQUE;
			"#,
		)]);
		assert!(models[0].fields.iter().all(|f| !f.unique));
	}

	#[test]
	fn app_comes_from_first_directory() {
		let root = Path::new("database/schema");
		assert_eq!(app_for(root, Path::new("database/schema/blog/post.surql")), "blog");
		assert_eq!(
			app_for(root, Path::new("database/schema/blog/nested/tag.surql")),
			"blog"
		);
		assert_eq!(app_for(root, Path::new("database/schema/root.surql")), ROOT_APP);
	}
}
