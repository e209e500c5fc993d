// src/normalize/product.rs

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::config::MatchingConfig;
use crate::models::record::ProductRecord;

lazy_static! {
	static ref SLASHES: Regex = Regex::new(r"[/\\]").unwrap();
	static ref COPYRIGHT: Regex = Regex::new(r"(?i)\(c\)|©").unwrap();
	static ref TRAILING_VERSION: Regex = Regex::new(r"v\d+$").unwrap();
	static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductColumn {
	Family,
	Name,
}

impl ProductColumn {
	fn raw<'r>(&self, record: &'r ProductRecord) -> Option<&'r str> {
		match self {
			ProductColumn::Family => record.product_family.as_deref(),
			ProductColumn::Name => record.product_name.as_deref(),
		}
	}
}

/// Everything one row's cleaning pass wants to write back. Computed from an
/// immutable view of the record, then applied in one step, so no column is
/// read and rewritten within the same pass.
#[derive(Debug, Default)]
struct RowUpdate {
	cleaned: Option<String>,
	extra_vendors: Vec<String>,
	family_fragments: Vec<String>,
	version: Option<String>,
}

/// Cleans product name/family columns, pulls embedded vendor hints out into
/// the vendor column, and hoists function keywords into their own attribute.
pub struct ProductNormalizer<'a> {
	config: &'a MatchingConfig,
	vendor_patterns: Vec<(String, Vec<Regex>)>,
}

impl<'a> ProductNormalizer<'a> {
	pub fn new(config: &'a MatchingConfig) -> Self {
		let vendor_patterns = config
			.product_regex
			.iter()
			.map(|entry| {
				let compiled = entry
					.patterns
					.iter()
					.filter_map(|raw| match Regex::new(&format!("(?i){}", raw)) {
						Ok(re) => Some(re),
						Err(e) => {
							warn!(
								"Skipping invalid product pattern '{}' for vendor '{}': {}",
								raw, entry.vendor, e
							);
							None
						}
					})
					.collect();
				(entry.vendor.clone(), compiled)
			})
			.collect();
		Self {
			config,
			vendor_patterns,
		}
	}

	/// Runs both column passes (family first, name second so the
	/// family-to-name fallback sees the cleaned family) and the keyword
	/// extraction pass.
	pub fn normalize_records(&self, records: &mut [ProductRecord]) {
		self.clean_column(records, ProductColumn::Family);
		self.clean_column(records, ProductColumn::Name);
		self.extract_keywords(records);
		debug!("Product normalization finished for {} records", records.len());
	}

	pub fn clean_column(&self, records: &mut [ProductRecord], column: ProductColumn) {
		for record in records.iter_mut() {
			let update = self.clean_row(record, column);
			apply_update(record, column, update);
		}
	}

	fn clean_row(&self, record: &ProductRecord, column: ProductColumn) -> RowUpdate {
		let mut update = RowUpdate::default();
		let cleaned = column.raw(record).and_then(basic_clean);

		let mut value = match cleaned {
			Some(v) => v,
			None => {
				// empty product name falls back to the already-cleaned family
				if column == ProductColumn::Name {
					if let Some(family) = non_empty(record.product_family_modified.as_deref()) {
						update.cleaned = Some(family.to_string());
						return update;
					}
				}
				update.cleaned = Some(String::new());
				return update;
			}
		};

		// recognize vendors by their product naming conventions and move the
		// matched fragment into the family column
		let known: Vec<String> = record
			.known_vendors()
			.iter()
			.map(|v| v.to_string())
			.collect();
		for (vendor, patterns) in &self.vendor_patterns {
			for pattern in patterns {
				if let Some(found) = pattern.find(&value) {
					let fragment = found.as_str().to_string();
					if !known.contains(vendor) && !update.extra_vendors.contains(vendor) {
						update.extra_vendors.push(vendor.clone());
					}
					update.family_fragments.push(fragment.clone());
					value = collapse(&value.replace(&fragment, " "));
				}
			}
		}

		// drop vendor tokens already known for the row from the working text
		for vendor in known.iter().chain(update.extra_vendors.iter()) {
			value = remove_case_insensitive(&value, vendor);
		}

		// adopt a trailing "v<digits>" token when no explicit version exists
		update.version = match record.product_version.as_deref() {
			Some(explicit) => Some(explicit.to_string()),
			None => TRAILING_VERSION
				.find(&value)
				.map(|m| m.as_str().to_string()),
		};

		update.cleaned = Some(value);
		update
	}

	/// Finds configured function keywords in the raw name/family columns,
	/// unions and deduplicates them, then deletes every found keyword
	/// word-boundary-wise from both modified columns.
	pub fn extract_keywords(&self, records: &mut [ProductRecord]) {
		if self.config.function_keywords.is_empty() {
			return;
		}
		for record in records.iter_mut() {
			let mut found: BTreeSet<String> = BTreeSet::new();
			for keyword in &self.config.function_keywords {
				let needle = keyword.to_lowercase();
				let in_name = record
					.product_name
					.as_deref()
					.is_some_and(|v| v.to_lowercase().contains(&needle));
				let in_family = record
					.product_family
					.as_deref()
					.is_some_and(|v| v.to_lowercase().contains(&needle));
				if in_name || in_family {
					found.insert(needle);
				}
			}

			for keyword in &found {
				if let Ok(pattern) =
					Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
				{
					if let Some(name) = record.product_name_modified.take() {
						record.product_name_modified =
							Some(collapse(&pattern.replace_all(&name, " ")));
					}
					if let Some(family) = record.product_family_modified.take() {
						record.product_family_modified =
							Some(collapse(&pattern.replace_all(&family, " ")));
					}
				}
			}
			record.function_keywords_found = found;
		}
	}
}

fn apply_update(record: &mut ProductRecord, column: ProductColumn, update: RowUpdate) {
	match column {
		ProductColumn::Family => record.product_family_modified = update.cleaned,
		ProductColumn::Name => record.product_name_modified = update.cleaned,
	}

	for fragment in update.family_fragments {
		match record.product_family_modified.take() {
			Some(existing) if !existing.is_empty() => {
				record.product_family_modified = Some(format!("{}, {}", existing, fragment));
			}
			_ => record.product_family_modified = Some(fragment),
		}
	}

	for vendor in update.extra_vendors {
		match record.vendor_modified.take() {
			Some(existing) if !existing.is_empty() => {
				record.vendor_modified = Some(format!("{}, {}", existing, vendor));
			}
			_ => record.vendor_modified = Some(vendor),
		}
	}

	if let Some(version) = update.version {
		record.product_version_modified = Some(version);
	}
}

/// Lowercase, trim and strip separators; hyphen-joined all-alphabetic
/// compounds split into words while alphanumeric codes keep their hyphens
/// (serial numbers like "7SR1205-2JA87" stay joined).
pub fn basic_clean(value: &str) -> Option<String> {
	let mut text = value.to_lowercase().trim().to_string();
	text = SLASHES.replace_all(&text, " ").into_owned();
	text = COPYRIGHT.replace_all(&text, " ").into_owned();
	text = text.replace(',', " ");
	text = text.replace(['(', ')'], "");

	let mut tokens: Vec<String> = Vec::new();
	for token in text.split_whitespace() {
		if token == "-" {
			continue;
		}
		if token.contains('-') {
			let parts: Vec<&str> = token.split('-').collect();
			if parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_alphabetic())) {
				tokens.extend(parts.into_iter().map(|p| p.to_string()));
			} else {
				tokens.push(token.to_string());
			}
		} else {
			tokens.push(token.to_string());
		}
	}

	let cleaned = tokens.join(" ");
	if cleaned.is_empty() {
		None
	} else {
		Some(cleaned)
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.trim().is_empty())
}

/// Deletes every occurrence of `needle` from `value`, ignoring case.
fn remove_case_insensitive(value: &str, needle: &str) -> String {
	if needle.is_empty() {
		return value.to_string();
	}
	let lower_needle = needle.to_lowercase();
	let mut out = value.to_string();
	let mut removed = false;
	while let Some(pos) = out.to_lowercase().find(&lower_needle) {
		let mut next = String::with_capacity(out.len());
		next.push_str(&out[..pos]);
		next.push_str(&out[pos + lower_needle.len()..]);
		out = next;
		removed = true;
	}
	if removed {
		collapse(&out)
	} else {
		out
	}
}

fn collapse(value: &str) -> String {
	MULTI_SPACE.replace_all(value.trim(), " ").into_owned()
}
