// src/models/record.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One row of the matching table: either a flattened CSAF product entry or
/// an asset-inventory device. Raw columns keep the source text untouched;
/// `_modified` columns are filled by the normalization passes. A `None` raw
/// column means the source never had the attribute; a `Some("")` modified
/// column means normalization ran and produced no value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
	pub vendor: Option<String>,
	pub vendor_modified: Option<String>,
	pub product_family: Option<String>,
	pub product_family_modified: Option<String>,
	pub product_name: Option<String>,
	pub product_name_modified: Option<String>,
	pub product_version: Option<String>,
	pub product_version_modified: Option<String>,
	pub product_version_range: Option<String>,
	pub product_version_range_modified: Option<String>,
	pub full_product_name: Option<String>,
	pub product_id: Option<String>,
	pub function_keywords_found: BTreeSet<String>,
	pub data_source: String,
}

impl ProductRecord {
	pub fn new(data_source: impl Into<String>) -> Self {
		Self {
			data_source: data_source.into(),
			..Self::default()
		}
	}

	/// Canonical vendor tokens currently known for this record.
	pub fn known_vendors(&self) -> Vec<&str> {
		self.vendor_modified
			.as_deref()
			.map(|v| v.split(", ").filter(|t| !t.is_empty()).collect())
			.unwrap_or_default()
	}

	/// Keyword set as one comparable string, in stable order.
	pub fn keywords_joined(&self) -> String {
		self.function_keywords_found
			.iter()
			.cloned()
			.collect::<Vec<_>>()
			.join(", ")
	}
}
