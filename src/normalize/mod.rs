// src/normalize/mod.rs

pub mod product;
pub mod synonym;
pub mod vendor;
pub mod version;

use crate::config::MatchingConfig;
use crate::models::record::ProductRecord;
use crate::normalize::product::ProductNormalizer;
use crate::normalize::vendor::{VendorAudit, VendorNormalizer};

/// Runs the three normalization passes over one table in their required
/// order (vendor first, since the product pass reads the canonical vendor
/// tokens) and returns the vendor-cleaning audit.
pub fn normalize_table(records: &mut [ProductRecord], config: &MatchingConfig) -> VendorAudit {
	let audit = VendorNormalizer::new(config).normalize_records(records);
	ProductNormalizer::new(config).normalize_records(records);
	version::normalize_versions(records);
	audit
}
