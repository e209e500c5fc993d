// src/config/mod.rs

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

/// Reserved row label: the aliases under which a dictionary column itself
/// can be addressed (e.g. "Manufacturer" ≡ "Hersteller").
pub const ALIAS_ROW: &str = "alias";

/// Immutable run configuration. Loaded once at startup and passed by
/// reference into every normalizer and matcher; nothing here is mutated
/// after loading.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingConfig {
	#[serde(default)]
	pub cleaning: CleaningRules,
	#[serde(default)]
	pub synonyms: SynonymDictionary,
	#[serde(default)]
	pub product_regex: Vec<VendorPatterns>,
	#[serde(default)]
	pub function_keywords: Vec<String>,
	#[serde(default)]
	pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleaningRules {
	/// Regex fragments deleted from vendor strings (legal suffixes and
	/// similar boilerplate), each replaced with a space.
	#[serde(default)]
	pub pre_delete_vendor: Vec<String>,
	/// Trailing web suffixes stripped from vendor tokens.
	#[serde(default = "default_web_suffixes")]
	pub web_suffixes: Vec<String>,
}

fn default_web_suffixes() -> Vec<String> {
	[".com", ".de", ".net", ".org"]
		.iter()
		.map(|s| s.to_string())
		.collect()
}

impl Default for CleaningRules {
	fn default() -> Self {
		Self {
			pre_delete_vendor: Vec::new(),
			web_suffixes: default_web_suffixes(),
		}
	}
}

/// The synonym table. Outer key: column name (an attribute category such
/// as "Manufacturer"). Inner key: row label, either a canonical value or
/// the reserved `alias` row. Cell: the searchable alias strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynonymDictionary(pub BTreeMap<String, BTreeMap<String, Vec<String>>>);

impl SynonymDictionary {
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn columns(&self) -> impl Iterator<Item = &String> {
		self.0.keys()
	}
}

/// Detection patterns for one vendor's product naming conventions.
/// Kept as a list (not a map) so the configured order is the search order.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorPatterns {
	pub vendor: String,
	pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Thresholds {
	pub vendor: u8,
	pub product_family: u8,
	pub product_name: u8,
	pub keyword: u8,
	pub version: u8,
}

impl Default for Thresholds {
	fn default() -> Self {
		Self {
			vendor: 80,
			product_family: 80,
			product_name: 80,
			keyword: 80,
			version: 80,
		}
	}
}

impl MatchingConfig {
	/// Loads the configuration from a JSON file. A missing or unreadable
	/// file degrades to the empty default configuration (normalizers become
	/// passthrough) instead of aborting the batch.
	pub fn load_or_default(path: &Path) -> Self {
		match Self::load(path) {
			Ok(config) => {
				info!(
					"Loaded matching configuration from {:?} ({} synonym columns, {} vendor patterns, {} keywords)",
					path,
					config.synonyms.0.len(),
					config.product_regex.len(),
					config.function_keywords.len()
				);
				config
			}
			Err(e) => {
				warn!(
					"Could not load configuration from {:?}: {:#}. Continuing with defaults.",
					path, e
				);
				Self::default()
			}
		}
	}

	pub fn load(path: &Path) -> Result<Self> {
		let file = File::open(path)
			.with_context(|| format!("Failed to open configuration file {:?}", path))?;
		serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("Failed to parse configuration file {:?}", path))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::tempdir;

	#[test]
	fn test_missing_file_degrades_to_default() {
		let config = MatchingConfig::load_or_default(Path::new("/nonexistent/config.json"));
		assert!(config.synonyms.is_empty());
		assert!(config.product_regex.is_empty());
		assert_eq!(config.thresholds.vendor, 80);
	}

	#[test]
	fn test_load_from_json() -> Result<()> {
		let dir = tempdir()?;
		let path = dir.path().join("matching_config.json");
		let mut file = File::create(&path)?;
		write!(
			file,
			r#"{{
				"cleaning": {{ "pre_delete_vendor": ["\\bAG\\b", "\\bGmbH\\b"] }},
				"synonyms": {{
					"Manufacturer": {{
						"alias": ["Manufacturer", "Hersteller", "vendor"],
						"Siemens": ["Siemens AG", "SIEMENS", "siemens.com"]
					}}
				}},
				"product_regex": [
					{{ "vendor": "Siemens", "patterns": ["simatic s7-\\d+"] }}
				],
				"function_keywords": ["firewall", "switch"],
				"thresholds": {{ "vendor": 75 }}
			}}"#
		)?;

		let config = MatchingConfig::load(&path)?;
		assert_eq!(config.cleaning.pre_delete_vendor.len(), 2);
		assert_eq!(config.synonyms.0["Manufacturer"]["Siemens"].len(), 3);
		assert_eq!(config.product_regex[0].vendor, "Siemens");
		assert_eq!(config.thresholds.vendor, 75);
		// unspecified thresholds fall back to their defaults
		assert_eq!(config.thresholds.product_name, 80);
		Ok(())
	}
}
