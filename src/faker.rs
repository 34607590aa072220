use anyhow::Result;
use fake::Fake;
use fake::faker::internet::en::{DomainSuffix, SafeEmail};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Date, Month, OffsetDateTime};

const SHORT_DOMAINS: [&str; 2] = ["example.com", "x.io"];

/// Source of fake values for one run. Built once and handed to whatever
/// needs randomness, so a seeded run is reproducible end to end.
pub struct Faker {
	rng: StdRng,
}

impl Faker {
	pub fn new() -> Self {
		Self {
			rng: StdRng::from_os_rng(),
		}
	}

	pub fn seeded(seed: u64) -> Self {
		Self {
			rng: StdRng::seed_from_u64(seed),
		}
	}

	pub fn from_seed(seed: Option<u64>) -> Self {
		match seed {
			Some(seed) => Self::seeded(seed),
			None => Self::new(),
		}
	}

	pub fn rng(&mut self) -> &mut StdRng {
		&mut self.rng
	}

	pub fn email(&mut self) -> String {
		let raw: String = SafeEmail().fake_with_rng(&mut self.rng);
		let (local, domain) = raw.split_once('@').unwrap_or(("", "example.com"));
		let cleaned: String = local
			.to_ascii_lowercase()
			.chars()
			.filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
			.collect();
		let local = match cleaned.trim_matches(|c| matches!(c, '.' | '_' | '-')) {
			"" => self.letters(8),
			trimmed => trimmed.to_string(),
		};
		format!("{local}@{domain}")
	}

	/// An email address no longer than `max` characters, or `None` when not
	/// even the shortest shape fits.
	pub fn email_within(&mut self, max: usize) -> Option<String> {
		let email = self.email();
		if email.chars().count() <= max {
			return Some(email);
		}

		for domain in SHORT_DOMAINS {
			let room = max.saturating_sub(domain.len() + 1);
			if room >= 1 {
				let local = self.letters(room.min(10));
				return Some(format!("{local}@{domain}"));
			}
		}
		None
	}

	pub fn phone_number(&mut self) -> String {
		PhoneNumber().fake_with_rng(&mut self.rng)
	}

	pub fn name(&mut self) -> String {
		Name().fake_with_rng(&mut self.rng)
	}

	pub fn sentence(&mut self) -> String {
		Sentence(3..10).fake_with_rng(&mut self.rng)
	}

	pub fn paragraph(&mut self) -> String {
		Paragraph(3..7).fake_with_rng(&mut self.rng)
	}

	pub fn url(&mut self) -> String {
		let word: String = Word().fake_with_rng(&mut self.rng);
		let suffix: String = DomainSuffix().fake_with_rng(&mut self.rng);
		format!("https://www.{}.{}/", word.to_ascii_lowercase(), suffix)
	}

	pub fn boolean(&mut self) -> bool {
		self.rng.random_bool(0.5)
	}

	pub fn int_between(&mut self, min: i64, max: i64) -> i64 {
		self.rng.random_range(min..=max)
	}

	/// Timestamp between the first instant of the current decade and now.
	pub fn date_time_this_decade(&mut self) -> Result<OffsetDateTime> {
		let now = OffsetDateTime::now_utc();
		let start = decade_start(now.year())?.midnight().assume_utc();
		let ts = self
			.rng
			.random_range(start.unix_timestamp()..=now.unix_timestamp());
		Ok(OffsetDateTime::from_unix_timestamp(ts)?)
	}

	/// Calendar date between the first day of the current decade and today.
	pub fn date_this_decade(&mut self) -> Result<Date> {
		let today = OffsetDateTime::now_utc().date();
		let start = decade_start(today.year())?;
		let day = self
			.rng
			.random_range(start.to_julian_day()..=today.to_julian_day());
		Ok(Date::from_julian_day(day)?)
	}

	/// Non-negative decimal with at most `left` integer digits and exactly
	/// `right` fractional digits, never zero unless no digits are allowed.
	pub fn positive_decimal(&mut self, left: u32, right: u32) -> String {
		let left = left.min(38);
		let right = right.min(38);
		let mut whole = self.rng.random_range(0..10u128.pow(left));
		let mut frac = self.rng.random_range(0..10u128.pow(right));
		if whole == 0 && frac == 0 {
			if right > 0 {
				frac = 1;
			} else if left > 0 {
				whole = 1;
			}
		}

		if right == 0 {
			whole.to_string()
		} else {
			format!("{whole}.{frac:0>width$}", width = right as usize)
		}
	}

	/// Lowercase alphanumeric record key starting with a letter, so
	/// `table:key` parses as a record id without escaping.
	pub fn record_key(&mut self) -> String {
		let first = self.rng.random_range(b'a'..=b'z') as char;
		let rest: String = (&mut self.rng)
			.sample_iter(Alphanumeric)
			.take(19)
			.map(|b| (b as char).to_ascii_lowercase())
			.collect();
		format!("{first}{rest}")
	}

	fn letters(&mut self, len: usize) -> String {
		(0..len)
			.map(|_| self.rng.random_range(b'a'..=b'z') as char)
			.collect()
	}
}

impl Default for Faker {
	fn default() -> Self {
		Self::new()
	}
}

fn decade_start(year: i32) -> Result<Date> {
	Ok(Date::from_calendar_date(
		year - year.rem_euclid(10),
		Month::January,
		1,
	)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seeded_fakers_repeat_themselves() {
		let mut a = Faker::seeded(7);
		let mut b = Faker::seeded(7);
		assert_eq!(a.name(), b.name());
		assert_eq!(a.int_between(0, 1000), b.int_between(0, 1000));
	}

	#[test]
	fn record_keys_are_plain_and_follow_the_seed() {
		let mut a = Faker::seeded(11);
		let mut b = Faker::seeded(11);
		for _ in 0..50 {
			let key = a.record_key();
			assert_eq!(key, b.record_key());
			assert_eq!(key.len(), 20);
			assert!(key.chars().next().is_some_and(|c| c.is_ascii_lowercase()));
			assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
		}
	}

	#[test]
	fn short_email_fits_tight_limits() {
		let mut faker = Faker::seeded(1);
		for max in [6, 9, 13, 20, 30] {
			let email = faker.email_within(max).expect("limit fits a short email");
			assert!(email.chars().count() <= max, "{email} longer than {max}");
			assert!(email.contains('@'));
		}
		assert!(faker.email_within(5).is_none());
	}

	#[test]
	fn decimals_respect_digit_counts() {
		let mut faker = Faker::seeded(3);
		for _ in 0..200 {
			let value = faker.positive_decimal(3, 2);
			let (whole, frac) = value.split_once('.').expect("fraction present");
			assert!(whole.len() <= 3);
			assert_eq!(frac.len(), 2);
		}
		assert!(!faker.positive_decimal(4, 0).contains('.'));
		assert_eq!(faker.positive_decimal(0, 0), "0");
	}

	#[test]
	fn decade_values_stay_in_range() {
		let mut faker = Faker::seeded(11);
		let now = OffsetDateTime::now_utc();
		let start = decade_start(now.year()).expect("valid decade");
		for _ in 0..50 {
			let ts = faker.date_time_this_decade().expect("timestamp");
			assert!(ts.date() >= start && ts <= OffsetDateTime::now_utc());
			let date = faker.date_this_decade().expect("date");
			assert!(date >= start && date <= OffsetDateTime::now_utc().date());
		}
	}

	#[test]
	fn urls_look_like_urls() {
		let mut faker = Faker::seeded(5);
		let url = faker.url();
		assert!(url.starts_with("https://www."));
		assert!(url.ends_with('/'));
	}
}
