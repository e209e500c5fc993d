// src/normalize/vendor.rs

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

use crate::config::MatchingConfig;
use crate::models::record::ProductRecord;
use crate::normalize::synonym::SynonymResolver;

/// Sentinel written for records without vendor information so they still
/// take part in joins downstream.
pub const MISSING_VENDOR: &str = "None";

lazy_static! {
	static ref BRACKETED: Regex = Regex::new(r"\(.*?\)").unwrap();
	static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
	static ref TRAILING_KG: Regex = Regex::new(r"(?i)\bKG$").unwrap();
	static ref EDGE_DOTS: Regex = Regex::new(r"\s?\.$|^\.\s?|\s\.\s").unwrap();
	static ref EDGE_HYPHENS: Regex = Regex::new(r"\s?-$|^-\s?|\s-\s").unwrap();
	static ref COPYRIGHT: Regex = Regex::new(r"(?i)\(c\)|©").unwrap();
}

/// One recorded change: which stage altered which original vendor string.
#[derive(Debug, Clone, Serialize)]
pub struct VendorAuditEntry {
	pub original: String,
	pub stage: String,
	pub before: String,
	pub after: String,
}

/// Durable per-run log of every vendor-cleaning change, keyed by original
/// value and stage name.
#[derive(Debug, Default)]
pub struct VendorAudit {
	pub entries: Vec<VendorAuditEntry>,
}

impl VendorAudit {
	fn record(&mut self, original: &str, stage: &str, before: &str, after: &str) {
		if before != after {
			self.entries.push(VendorAuditEntry {
				original: original.to_string(),
				stage: stage.to_string(),
				before: before.to_string(),
				after: after.to_string(),
			});
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Multi-stage vendor cleaning: split multi-vendor strings, strip
/// abbreviations and boilerplate, canonicalize through the synonym
/// dictionary and consolidate back to one comma-joined value per record.
pub struct VendorNormalizer<'a> {
	config: &'a MatchingConfig,
	resolver: SynonymResolver<'a>,
	delete_rules: Vec<Regex>,
}

impl<'a> VendorNormalizer<'a> {
	pub fn new(config: &'a MatchingConfig) -> Self {
		let delete_rules = config
			.cleaning
			.pre_delete_vendor
			.iter()
			.filter_map(|raw| match Regex::new(raw) {
				Ok(re) => Some(re),
				Err(e) => {
					warn!("Skipping invalid vendor cleaning pattern '{}': {}", raw, e);
					None
				}
			})
			.collect();
		Self {
			config,
			resolver: SynonymResolver::new(&config.synonyms),
			delete_rules,
		}
	}

	/// Cleans the vendor column of every record in place and returns the
	/// audit of all changes. Cleaning works on the unique raw vendor values
	/// and is mapped back onto the records afterwards, so the row count of
	/// the table can never change here; if the consolidated mapping does not
	/// cover every unique vendor a warning with both counts is emitted and
	/// the uncovered vendors pass through unchanged.
	pub fn normalize_records(&self, records: &mut [ProductRecord]) -> VendorAudit {
		let mut audit = VendorAudit::default();

		let mut uniques: Vec<String> = Vec::new();
		let mut seen: HashSet<String> = HashSet::new();
		for record in records.iter() {
			let key = raw_key(record.vendor.as_deref());
			if seen.insert(key.clone()) {
				uniques.push(key);
			}
		}

		let mut consolidated: HashMap<String, String> = HashMap::new();
		for raw in &uniques {
			let cleaned = self.normalize_vendor(raw, &mut audit);
			consolidated.insert(raw.clone(), cleaned);
		}

		if consolidated.len() != uniques.len() {
			warn!(
				"Vendor consolidation mismatch: {} unique vendors but {} consolidated values; unmapped vendors pass through unchanged",
				uniques.len(),
				consolidated.len()
			);
		}

		for record in records.iter_mut() {
			let key = raw_key(record.vendor.as_deref());
			let value = consolidated
				.get(&key)
				.cloned()
				.unwrap_or_else(|| key.clone());
			record.vendor_modified = Some(value);
		}

		debug!(
			"Vendor normalization finished: {} unique vendors, {} audit entries",
			uniques.len(),
			audit.len()
		);
		audit
	}

	/// Runs the full cleaning pipeline for one raw vendor string.
	pub fn normalize_vendor(&self, raw: &str, audit: &mut VendorAudit) -> String {
		let base = if raw.trim().is_empty() {
			audit.record(raw, "missing", raw, MISSING_VENDOR);
			MISSING_VENDOR.to_string()
		} else {
			raw.to_string()
		};

		let mut cleaned_tokens: Vec<String> = Vec::new();
		for token in split_vendors(&base) {
			let pre = preclean(&token);
			audit.record(raw, "precleaning", &token, &pre);

			let deleted = self.delete_phrases(&pre);
			audit.record(raw, "phrase_deletion", &pre, &deleted);

			let post = self.postclean(&deleted);
			audit.record(raw, "postcleaning", &deleted, &post);

			let resolved = self.apply_synonym(raw, &post);
			audit.record(raw, "synonym", &post, &resolved);

			if !resolved.trim().is_empty() {
				cleaned_tokens.push(resolved);
			}
		}

		let joined = dedupe_join(cleaned_tokens);
		audit.record(raw, "consolidation", &base, &joined);
		joined
	}

	fn delete_phrases(&self, value: &str) -> String {
		let mut out = value.to_string();
		for rule in &self.delete_rules {
			out = rule.replace_all(&out, " ").into_owned();
		}
		collapse(&out)
	}

	fn postclean(&self, value: &str) -> String {
		let mut out = value.replace(" & ", " ");
		out = out.replace('/', " ").replace('\\', " ");
		out = COPYRIGHT.replace_all(&out, " ").into_owned();
		out = collapse(&out);
		out = TRAILING_KG.replace_all(&out, " ").into_owned();
		out = collapse(&out);
		out = EDGE_DOTS.replace_all(&out, "").into_owned();
		out = EDGE_HYPHENS.replace_all(&out, "").into_owned();
		out = collapse(&out);
		for suffix in &self.config.cleaning.web_suffixes {
			if let Some(stripped) = strip_suffix_ignore_case(&out, suffix) {
				out = stripped.to_string();
				break;
			}
		}
		collapse(&out)
	}

	/// Canonicalizes one cleaned token through the synonym dictionary.
	/// A single unambiguous label replaces the token unless it equals the
	/// original raw string case-insensitively (the no-op rule that keeps
	/// canonicalization idempotent). Ambiguous resolutions keep the cleaned
	/// token as the best-effort value.
	fn apply_synonym(&self, raw_original: &str, token: &str) -> String {
		if token.is_empty() {
			return token.to_string();
		}
		let resolved = self.resolver.resolve(token, Some("vendor"));
		if resolved.is_empty() {
			return token.to_string();
		}
		if resolved.contains(", ") {
			warn!(
				"Ambiguous synonym resolution for vendor '{}': {}; keeping cleaned value",
				token, resolved
			);
			return token.to_string();
		}
		if resolved.eq_ignore_ascii_case(raw_original.trim()) {
			// already canonical, no change necessary
			return token.to_string();
		}
		resolved
	}
}

fn raw_key(vendor: Option<&str>) -> String {
	vendor.unwrap_or_default().to_string()
}

/// Explodes a possibly multi-vendor string into one token per vendor.
fn split_vendors(value: &str) -> Vec<String> {
	value
		.replace(" and ", ", ")
		.split(", ")
		.map(|t| t.trim().to_string())
		.filter(|t| !t.is_empty())
		.collect()
}

fn preclean(value: &str) -> String {
	let no_brackets = BRACKETED.replace_all(value, " ");
	collapse(&no_brackets)
}

fn strip_suffix_ignore_case<'v>(value: &'v str, suffix: &str) -> Option<&'v str> {
	if value.len() < suffix.len() || !value.is_char_boundary(value.len() - suffix.len()) {
		return None;
	}
	let (head, tail) = value.split_at(value.len() - suffix.len());
	tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn collapse(value: &str) -> String {
	MULTI_SPACE.replace_all(value.trim(), " ").into_owned()
}

fn dedupe_join(tokens: Vec<String>) -> String {
	let mut seen: HashSet<String> = HashSet::new();
	let mut out: Vec<String> = Vec::new();
	for token in tokens {
		if seen.insert(token.to_lowercase()) {
			out.push(token);
		}
	}
	out.join(", ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SynonymDictionary;
	use std::collections::BTreeMap;

	fn test_config() -> MatchingConfig {
		let mut manufacturer = BTreeMap::new();
		manufacturer.insert(
			"alias".to_string(),
			vec!["Manufacturer".to_string(), "vendor".to_string()],
		);
		manufacturer.insert(
			"Siemens".to_string(),
			vec!["Siemens AG".to_string(), "SIEMENS".to_string(), "siemens.com".to_string()],
		);
		manufacturer.insert(
			"Phoenix Contact".to_string(),
			vec!["Phoenix Contact GmbH".to_string(), "PxC".to_string()],
		);
		let mut dict = BTreeMap::new();
		dict.insert("Manufacturer".to_string(), manufacturer);

		let mut config = MatchingConfig::default();
		config.synonyms = SynonymDictionary(dict);
		config.cleaning.pre_delete_vendor = vec![
			r"\bAG\b".to_string(),
			r"\bGmbH\b".to_string(),
			r"\bInc\.?".to_string(),
			r"\bLtd\.?".to_string(),
		];
		config
	}

	fn normalize(config: &MatchingConfig, raw: &str) -> String {
		let normalizer = VendorNormalizer::new(config);
		let mut audit = VendorAudit::default();
		normalizer.normalize_vendor(raw, &mut audit)
	}

	#[test]
	fn test_legal_suffix_and_synonym() {
		let config = test_config();
		// "Siemens AG" loses the suffix and resolves to the canonical label;
		// "SIEMENS" resolves too but the no-op rule keeps the raw casing
		// because label and raw string are equal case-insensitively
		assert_eq!(normalize(&config, "Siemens AG"), "Siemens");
		assert_eq!(normalize(&config, "SIEMENS"), "SIEMENS");
	}

	#[test]
	fn test_same_canonical_token_for_variant_spellings() {
		let config = test_config();
		let a = normalize(&config, "Siemens AG");
		let b = normalize(&config, "SIEMENS");
		assert!(a.eq_ignore_ascii_case(&b));
	}

	#[test]
	fn test_idempotence() {
		let config = test_config();
		let once = normalize(&config, "Siemens AG");
		let twice = normalize(&config, &once);
		assert_eq!(once, twice);

		let once = normalize(&config, "Phoenix Contact GmbH & Co. KG");
		let twice = normalize(&config, &once);
		assert_eq!(once, twice);
	}

	#[test]
	fn test_multi_vendor_split_and_rejoin() {
		let config = test_config();
		let result = normalize(&config, "Siemens AG and Phoenix Contact GmbH");
		assert_eq!(result, "Siemens, Phoenix Contact");
	}

	#[test]
	fn test_bracketed_abbreviation_removed() {
		let config = test_config();
		assert_eq!(
			normalize(&config, "Phoenix Contact GmbH (PxC)"),
			"Phoenix Contact"
		);
	}

	#[test]
	fn test_trailing_kg_and_web_suffix() {
		let config = test_config();
		assert_eq!(
			normalize(&config, "Phoenix Contact GmbH & Co. KG"),
			"Phoenix Contact Co"
		);
		assert_eq!(normalize(&config, "siemens.com"), "Siemens");
	}

	#[test]
	fn test_missing_vendor_gets_sentinel() {
		let config = test_config();
		assert_eq!(normalize(&config, ""), MISSING_VENDOR);
		assert_eq!(normalize(&config, "   "), MISSING_VENDOR);
	}

	#[test]
	fn test_row_count_preserved_on_records() {
		let config = test_config();
		let normalizer = VendorNormalizer::new(&config);
		let mut records = vec![
			record_with_vendor(Some("Siemens AG")),
			record_with_vendor(Some("Siemens AG")),
			record_with_vendor(Some("SIEMENS")),
			record_with_vendor(None),
		];
		let before = records.len();
		normalizer.normalize_records(&mut records);
		assert_eq!(records.len(), before);
		assert!(records.iter().all(|r| r.vendor_modified.is_some()));
		assert_eq!(records[0].vendor_modified, records[1].vendor_modified);
		assert_eq!(records[3].vendor_modified.as_deref(), Some(MISSING_VENDOR));
	}

	#[test]
	fn test_audit_records_changed_stages_only() {
		let config = test_config();
		let normalizer = VendorNormalizer::new(&config);
		let mut audit = VendorAudit::default();
		normalizer.normalize_vendor("Siemens AG", &mut audit);
		assert!(audit.entries.iter().any(|e| e.stage == "phrase_deletion"));
		assert!(audit.entries.iter().all(|e| e.before != e.after));

		// an already-clean vendor leaves no trace
		let mut audit = VendorAudit::default();
		normalizer.normalize_vendor("Siemens", &mut audit);
		assert!(audit.is_empty());
	}

	fn record_with_vendor(vendor: Option<&str>) -> ProductRecord {
		let mut record = ProductRecord::new("test");
		record.vendor = vendor.map(|v| v.to_string());
		record
	}
}
