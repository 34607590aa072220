use anyhow::{Context, Result};
use rand::rngs::StdRng;
use surrealdb::{Surreal, engine::any::Any};
use surrealdb_types::SurrealValue;
use time::format_description::well_known::Rfc3339;

use super::{RecordRef, Store};
use crate::config::AdminAccount;
use crate::registry::ModelDescriptor;
use crate::synth::FieldValue;

#[derive(serde::Deserialize, Debug, SurrealValue)]
pub struct RecordRow {
	pub id: String,
}

pub struct SurrealStore {
	db: Surreal<Any>,
}

impl SurrealStore {
	pub fn new(db: Surreal<Any>) -> Self {
		Self { db }
	}

	async fn first_id(&self, sql: &str, binds: Vec<(&'static str, String)>) -> Result<Option<String>> {
		let mut query = self.db.query(sql);
		for bind in binds {
			query = query.bind(bind);
		}
		let mut resp = query.await?;
		let row: Option<RecordRow> = resp.take(0)?;
		Ok(row.map(|r| r.id))
	}
}

impl Store for SurrealStore {
	async fn ensure_group(&self, table: &str, name: &str) -> Result<bool> {
		let existing = self
			.first_id(
				"SELECT <string> id AS id FROM type::table($tb) WHERE name = $name LIMIT 1;",
				vec![("tb", table.to_string()), ("name", name.to_string())],
			)
			.await?;
		if existing.is_some() {
			return Ok(false);
		}

		self.db
			.query("CREATE type::table($tb) SET name = $name;")
			.bind(("tb", table.to_string()))
			.bind(("name", name.to_string()))
			.await?
			.check()
			.with_context(|| format!("creating group {name}"))?;
		Ok(true)
	}

	async fn ensure_admin(&self, admin: &AdminAccount) -> Result<bool> {
		let existing = self
			.first_id(
				"SELECT <string> id AS id FROM type::table($tb) WHERE is_superuser = true LIMIT 1;",
				vec![("tb", admin.table.clone())],
			)
			.await?;
		if existing.is_some() {
			return Ok(false);
		}

		self.db
			.query(
				"CREATE type::table($tb) SET \
				 username = $username, \
				 email = $email, \
				 password = crypto::argon2::generate($password), \
				 is_superuser = true, \
				 is_staff = true, \
				 is_active = true;",
			)
			.bind(("tb", admin.table.clone()))
			.bind(("username", admin.username.clone()))
			.bind(("email", admin.email.clone()))
			.bind(("password", admin.password.clone()))
			.await?
			.check()
			.with_context(|| format!("creating admin account {}", admin.username))?;
		Ok(true)
	}

	async fn save_instance(
		&self,
		record: &RecordRef,
		_model: &ModelDescriptor,
		values: &[(String, FieldValue)],
	) -> Result<()> {
		let (sql, binds) = render_create(record, values)?;

		let mut query = self.db.query(sql);
		for (name, value) in binds {
			query = match value {
				Bind::Text(s) => query.bind((name, s)),
				Bind::Integer(n) => query.bind((name, n)),
				Bind::Boolean(b) => query.bind((name, b)),
			};
		}
		query.await?.check()?;
		Ok(())
	}

	async fn random_existing(&self, table: &str, _rng: &mut StdRng) -> Result<Option<RecordRef>> {
		let id = self
			.first_id(
				"SELECT <string> id AS id FROM type::table($tb) ORDER BY rand() LIMIT 1;",
				vec![("tb", table.to_string())],
			)
			.await?;
		id.as_deref().map(RecordRef::parse).transpose()
	}

	async fn set_relation(
		&self,
		instance: &RecordRef,
		field: &str,
		targets: &[RecordRef],
	) -> Result<()> {
		self.db
			.query(render_relation(instance, field, targets))
			.await?
			.check()?;
		Ok(())
	}
}

/// Scalar parameter of a rendered statement.
#[derive(Debug, Clone, PartialEq)]
enum Bind {
	Text(String),
	Integer(i64),
	Boolean(bool),
}

fn render_create(
	record: &RecordRef,
	values: &[(String, FieldValue)],
) -> Result<(String, Vec<(String, Bind)>)> {
	let mut assignments = Vec::with_capacity(values.len());
	let mut binds = Vec::new();

	for (i, (field, value)) in values.iter().enumerate() {
		let param = format!("v{i}");
		let expr = match value {
			FieldValue::Record(target) => target.to_string(),
			FieldValue::Text(s) => {
				binds.push((param.clone(), Bind::Text(s.clone())));
				format!("${param}")
			}
			FieldValue::Integer(n) => {
				binds.push((param.clone(), Bind::Integer(*n)));
				format!("${param}")
			}
			FieldValue::Boolean(b) => {
				binds.push((param.clone(), Bind::Boolean(*b)));
				format!("${param}")
			}
			FieldValue::Decimal(d) => {
				binds.push((param.clone(), Bind::Text(d.clone())));
				format!("<decimal> ${param}")
			}
			FieldValue::DateTime(ts) => {
				binds.push((param.clone(), Bind::Text(ts.format(&Rfc3339)?)));
				format!("<datetime> ${param}")
			}
			FieldValue::Date(day) => {
				let ts = day.midnight().assume_utc().format(&Rfc3339)?;
				binds.push((param.clone(), Bind::Text(ts)));
				format!("<datetime> ${param}")
			}
		};
		assignments.push(format!("{field} = {expr}"));
	}

	let mut sql = format!("CREATE {record}");
	if !assignments.is_empty() {
		sql.push_str(" SET ");
		sql.push_str(&assignments.join(", "));
	}
	sql.push_str(" RETURN NONE;");
	Ok((sql, binds))
}

fn render_relation(instance: &RecordRef, field: &str, targets: &[RecordRef]) -> String {
	let links: Vec<String> = targets.iter().map(ToString::to_string).collect();
	format!(
		"UPDATE {instance} SET {field} = [{}] RETURN NONE;",
		links.join(", ")
	)
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use super::*;

	#[test]
	fn create_statement_binds_scalars_and_inlines_links() {
		let record = RecordRef::new("post", "abc");
		let values = vec![
			("title".to_string(), FieldValue::Text("Hello".to_string())),
			("views".to_string(), FieldValue::Integer(3)),
			("price".to_string(), FieldValue::Decimal("12.50".to_string())),
			(
				"published".to_string(),
				FieldValue::DateTime(datetime!(2021-03-04 05:06:07 UTC)),
			),
			("day".to_string(), FieldValue::Date(date!(2022 - 01 - 02))),
			(
				"author".to_string(),
				FieldValue::Record(RecordRef::new("author", "x1")),
			),
		];

		let (sql, binds) = render_create(&record, &values).expect("renders");
		assert_eq!(
			sql,
			"CREATE post:abc SET title = $v0, views = $v1, price = <decimal> $v2, \
			 published = <datetime> $v3, day = <datetime> $v4, author = author:x1 RETURN NONE;"
		);
		assert_eq!(binds.len(), 5);
		assert_eq!(binds[2].1, Bind::Text("12.50".to_string()));
		assert_eq!(binds[3].1, Bind::Text("2021-03-04T05:06:07Z".to_string()));
		assert_eq!(binds[4].1, Bind::Text("2022-01-02T00:00:00Z".to_string()));
	}

	#[test]
	fn create_without_values_uses_defaults() {
		let (sql, binds) = render_create(&RecordRef::new("tag", "t"), &[]).expect("renders");
		assert_eq!(sql, "CREATE tag:t RETURN NONE;");
		assert!(binds.is_empty());
	}

	#[test]
	fn relation_update_lists_targets() {
		let sql = render_relation(
			&RecordRef::new("post", "p"),
			"tags",
			&[RecordRef::new("tag", "a"), RecordRef::new("tag", "b")],
		);
		assert_eq!(sql, "UPDATE post:p SET tags = [tag:a, tag:b] RETURN NONE;");
	}
}
