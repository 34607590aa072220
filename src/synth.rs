use anyhow::{Result, bail};
use time::{Date, OffsetDateTime};

use crate::faker::Faker;
use crate::registry::{FieldDescriptor, FieldKind, GeneratorKind};
use crate::store::RecordRef;

/// Fields that record when a row was touched get the current time.
const TIMESTAMP_NAMES: [&str; 3] = ["created", "modified", "creation_date"];
const DEFAULT_MAX_LENGTH: usize = 100;
const DEFAULT_EMAIL_LENGTH: usize = 254;
const DEFAULT_MAX_DIGITS: u32 = 10;
const DEFAULT_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
	Text(String),
	Integer(i64),
	Decimal(String),
	Boolean(bool),
	DateTime(OffsetDateTime),
	Date(Date),
	Record(RecordRef),
}

/// Produces a value for a scalar field. `Ok(None)` means no generator applies
/// and the field keeps its storage default; relationships are resolved by the
/// generator, not here.
pub fn synthesize(faker: &mut Faker, field: &FieldDescriptor) -> Result<Option<FieldValue>> {
	if let Some(generator) = field.generator {
		return annotated(faker, field, generator).map(Some);
	}

	let name = field.name.to_ascii_lowercase();
	let value = match field.kind {
		FieldKind::ShortText => FieldValue::Text(short_text(faker, field, &name)?),
		FieldKind::LongText => FieldValue::Text(faker.paragraph()),
		FieldKind::DateTime => {
			if TIMESTAMP_NAMES.contains(&field.name.as_str()) {
				FieldValue::DateTime(OffsetDateTime::now_utc())
			} else {
				FieldValue::DateTime(faker.date_time_this_decade()?)
			}
		}
		FieldKind::Date => {
			if TIMESTAMP_NAMES.contains(&field.name.as_str()) {
				FieldValue::Date(OffsetDateTime::now_utc().date())
			} else {
				FieldValue::Date(faker.date_this_decade()?)
			}
		}
		FieldKind::Boolean => FieldValue::Boolean(faker.boolean()),
		FieldKind::Integer => {
			if field.name == "index_number" {
				FieldValue::Integer(faker.int_between(1, 100))
			} else {
				FieldValue::Integer(faker.int_between(0, 1000))
			}
		}
		FieldKind::Decimal => FieldValue::Decimal(decimal(faker, field)?),
		FieldKind::Url => FieldValue::Text(faker.url()),
		FieldKind::Email => FieldValue::Text(email(
			faker,
			field.max_length.unwrap_or(DEFAULT_EMAIL_LENGTH),
		)?),
		FieldKind::ForeignKey | FieldKind::ManyToMany | FieldKind::Other => return Ok(None),
	};
	Ok(Some(value))
}

fn short_text(faker: &mut Faker, field: &FieldDescriptor, name: &str) -> Result<String> {
	let max = field.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
	let text = if name.ends_with("email") {
		return email(faker, max);
	} else if name.ends_with("phone") {
		faker.phone_number()
	} else if name.ends_with("name") {
		faker.name()
	} else if name == "language_code" {
		"en".to_string()
	} else {
		faker.sentence()
	};
	Ok(truncate(&text, max))
}

fn annotated(
	faker: &mut Faker,
	field: &FieldDescriptor,
	generator: GeneratorKind,
) -> Result<FieldValue> {
	if !matches!(
		field.kind,
		FieldKind::ShortText | FieldKind::LongText | FieldKind::Email | FieldKind::Url
	) {
		bail!(
			"generator {:?} does not apply to {} field '{}'",
			generator,
			field.kind.label(),
			field.name
		);
	}

	let text = match generator {
		GeneratorKind::Email => {
			return email(faker, field.max_length.unwrap_or(DEFAULT_EMAIL_LENGTH))
				.map(FieldValue::Text);
		}
		GeneratorKind::Phone => faker.phone_number(),
		GeneratorKind::Name => faker.name(),
		GeneratorKind::Sentence => faker.sentence(),
		GeneratorKind::Paragraph => faker.paragraph(),
		GeneratorKind::Url => faker.url(),
		GeneratorKind::LanguageCode => "en".to_string(),
	};
	Ok(FieldValue::Text(match field.max_length {
		Some(max) => truncate(&text, max),
		None => text,
	}))
}

fn email(faker: &mut Faker, max: usize) -> Result<String> {
	match faker.email_within(max) {
		Some(email) => Ok(email),
		None => bail!("max length {max} is too short for an email address"),
	}
}

fn decimal(faker: &mut Faker, field: &FieldDescriptor) -> Result<String> {
	let digits = field.max_digits.unwrap_or(DEFAULT_MAX_DIGITS);
	let places = field.decimal_places.unwrap_or(DEFAULT_DECIMAL_PLACES);
	if places > digits {
		bail!(
			"decimal field '{}' has {} places but only {} digits",
			field.name,
			places,
			digits
		);
	}
	Ok(faker.positive_decimal(digits - places, places))
}

fn truncate(text: &str, max: usize) -> String {
	let cut: String = text.chars().take(max).collect();
	cut.trim_end().to_string()
}
