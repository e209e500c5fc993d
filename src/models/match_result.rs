// src/models/match_result.rs

use crate::models::record::ProductRecord;
use crate::models::score::{AttributeScore, MatchVerdict};

/// One scored pair of records, match or not. No-match rows keep their
/// reason so a reviewer can audit why a pair was rejected.
#[derive(Debug, Clone)]
pub struct MatchResult {
	pub vendor_1: Option<String>,
	pub vendor_2: Option<String>,
	pub vendor_1_modified: Option<String>,
	pub vendor_2_modified: Option<String>,
	pub vendor_score: AttributeScore,
	pub product_name_1: Option<String>,
	pub product_name_2: Option<String>,
	pub product_name_score: AttributeScore,
	pub product_family_score: AttributeScore,
	pub keywords_1: String,
	pub keywords_2: String,
	pub keyword_score: AttributeScore,
	pub version_1: Option<String>,
	pub version_2: Option<String>,
	pub version_range_1: Option<String>,
	pub version_score: AttributeScore,
	pub data_source_1: String,
	pub data_source_2: String,
	pub verdict: MatchVerdict,
	pub reason: String,
}

pub struct PairScores {
	pub vendor: AttributeScore,
	pub product_name: AttributeScore,
	pub product_family: AttributeScore,
	pub version: AttributeScore,
	pub keyword: AttributeScore,
}

impl MatchResult {
	pub fn from_pair(
		record1: &ProductRecord,
		record2: &ProductRecord,
		scores: PairScores,
		verdict: MatchVerdict,
		reason: String,
	) -> Self {
		Self {
			vendor_1: record1.vendor.clone(),
			vendor_2: record2.vendor.clone(),
			vendor_1_modified: record1.vendor_modified.clone(),
			vendor_2_modified: record2.vendor_modified.clone(),
			vendor_score: scores.vendor,
			product_name_1: record1.product_name_modified.clone(),
			product_name_2: record2.product_name_modified.clone(),
			product_name_score: scores.product_name,
			product_family_score: scores.product_family,
			keywords_1: record1.keywords_joined(),
			keywords_2: record2.keywords_joined(),
			keyword_score: scores.keyword,
			version_1: record1.product_version_modified.clone(),
			version_2: record2.product_version_modified.clone(),
			version_range_1: record1.product_version_range_modified.clone(),
			version_score: scores.version,
			data_source_1: record1.data_source.clone(),
			data_source_2: record2.data_source.clone(),
			verdict,
			reason,
		}
	}
}
