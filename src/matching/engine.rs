// src/matching/engine.rs

use std::collections::BTreeSet;

use log::{debug, info};

use crate::config::Thresholds;
use crate::matching::aggregate::calculate_overall_score;
use crate::matching::attributes::{
	match_keyword, match_product, match_vendor, match_version, FAMILY_WEIGHTS, NAME_WEIGHTS,
};
use crate::models::match_result::{MatchResult, PairScores};
use crate::models::record::ProductRecord;
use crate::models::score::AttributeScore;

/// Restricts both tables to rows whose canonical vendor token has at least
/// one counterpart on the other side scoring at or above the vendor
/// threshold. Purely a cost cut before the cross join: pairs it removes
/// could never pass the aggregator's vendor gate, so verdicts are
/// unaffected.
pub fn filter_matching_vendors<'r>(
	records_a: &'r [ProductRecord],
	records_b: &'r [ProductRecord],
	vendor_threshold: u8,
) -> (Vec<&'r ProductRecord>, Vec<&'r ProductRecord>) {
	let vendors_a: BTreeSet<&str> = records_a
		.iter()
		.filter_map(|r| r.vendor_modified.as_deref())
		.collect();
	let vendors_b: BTreeSet<&str> = records_b
		.iter()
		.filter_map(|r| r.vendor_modified.as_deref())
		.collect();

	let mut surviving: BTreeSet<&str> = BTreeSet::new();
	for &vendor_a in &vendors_a {
		for &vendor_b in &vendors_b {
			if let AttributeScore::Value(score) = match_vendor(Some(vendor_a), Some(vendor_b)) {
				if score >= vendor_threshold {
					surviving.insert(vendor_a);
					surviving.insert(vendor_b);
				}
			}
		}
	}

	let keep = |record: &&ProductRecord| {
		record
			.vendor_modified
			.as_deref()
			.is_some_and(|v| surviving.contains(v))
	};
	(
		records_a.iter().filter(keep).collect(),
		records_b.iter().filter(keep).collect(),
	)
}

/// Scores every pair of the vendor-filtered cross product and returns one
/// result row per pair, no-matches included, in table-A-major order.
pub fn match_all(
	records_a: &[ProductRecord],
	records_b: &[ProductRecord],
	thresholds: &Thresholds,
) -> Vec<MatchResult> {
	let (filtered_a, filtered_b) =
		filter_matching_vendors(records_a, records_b, thresholds.vendor);
	info!(
		"Vendor pre-filter kept {} of {} and {} of {} records",
		filtered_a.len(),
		records_a.len(),
		filtered_b.len(),
		records_b.len()
	);

	let mut results = Vec::with_capacity(filtered_a.len() * filtered_b.len());
	for record_a in &filtered_a {
		for record_b in &filtered_b {
			results.push(score_pair(record_a, record_b, thresholds));
		}
	}
	debug!("Scored {} record pairs", results.len());
	results
}

fn score_pair(
	record_a: &ProductRecord,
	record_b: &ProductRecord,
	thresholds: &Thresholds,
) -> MatchResult {
	// keyword sets are always populated by extraction, so an empty set is
	// "processed, no value" rather than unknown
	let keywords_a = record_a.keywords_joined();
	let keywords_b = record_b.keywords_joined();
	let scores = PairScores {
		vendor: match_vendor(
			record_a.vendor_modified.as_deref(),
			record_b.vendor_modified.as_deref(),
		),
		product_name: match_product(
			record_a.product_name_modified.as_deref(),
			record_b.product_name_modified.as_deref(),
			NAME_WEIGHTS,
		),
		product_family: match_product(
			record_a.product_family_modified.as_deref(),
			record_b.product_family_modified.as_deref(),
			FAMILY_WEIGHTS,
		),
		version: match_version(
			record_a.product_version_modified.as_deref(),
			record_b.product_version_modified.as_deref(),
			record_a.product_version_range_modified.as_deref(),
		),
		keyword: match_keyword(Some(keywords_a.as_str()), Some(keywords_b.as_str())),
	};

	let decision = calculate_overall_score(
		scores.vendor,
		scores.product_name,
		scores.product_family,
		scores.version,
		scores.keyword,
		thresholds,
	);
	MatchResult::from_pair(record_a, record_b, scores, decision.verdict, decision.reason)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::score::MatchVerdict;

	fn record(
		vendor: &str,
		name: &str,
		family: &str,
		version: Option<&str>,
	) -> ProductRecord {
		let mut r = ProductRecord::new("test");
		r.vendor = Some(vendor.to_string());
		r.vendor_modified = Some(vendor.to_string());
		r.product_name_modified = Some(name.to_string());
		r.product_family_modified = Some(family.to_string());
		r.product_version_modified = version.map(|v| v.to_string());
		r
	}

	fn thresholds() -> Thresholds {
		Thresholds::default()
	}

	#[test]
	fn test_prefilter_drops_unrelated_vendors() {
		let assets = vec![
			record("siemens", "s7-1500", "simatic", None),
			record("acme robotics", "arm", "grippers", None),
		];
		let advisories = vec![record("siemens", "s7-1500 cpu", "simatic", None)];

		let (fa, fb) = filter_matching_vendors(&assets, &advisories, 80);
		assert_eq!(fa.len(), 1);
		assert_eq!(fa[0].vendor_modified.as_deref(), Some("siemens"));
		assert_eq!(fb.len(), 1);
	}

	#[test]
	fn test_prefilter_keeps_fuzzy_vendor_variants() {
		let assets = vec![record("phoenix contact", "axc", "axioline", None)];
		let advisories = vec![record("contact phoenix", "axc f 2152", "axioline", None)];
		let (fa, fb) = filter_matching_vendors(&assets, &advisories, 80);
		assert_eq!(fa.len(), 1);
		assert_eq!(fb.len(), 1);
	}

	#[test]
	fn test_match_all_emits_no_match_rows_too() {
		let assets = vec![
			record("siemens", "s7-1500", "simatic s7", None),
			record("siemens", "totally different device", "other line", None),
		];
		let advisories = vec![record("siemens", "siemens s7-1500 cpu", "simatic s7", None)];

		let results = match_all(&assets, &advisories, &thresholds());
		assert_eq!(results.len(), 2);

		let matched: Vec<_> = results
			.iter()
			.filter(|r| r.verdict == MatchVerdict::Match)
			.collect();
		assert_eq!(matched.len(), 1);
		assert_eq!(matched[0].product_name_1.as_deref(), Some("s7-1500"));

		let rejected: Vec<_> = results
			.iter()
			.filter(|r| r.verdict == MatchVerdict::NoMatch)
			.collect();
		assert_eq!(rejected.len(), 1);
		assert!(!rejected[0].reason.is_empty());
	}

	#[test]
	fn test_version_gate_in_full_pipeline() {
		let assets = vec![record("siemens", "s7-1500", "simatic s7", Some("1.0.0"))];
		let advisories = vec![record("siemens", "s7-1500", "simatic s7", Some("2.0.0"))];
		let results = match_all(&assets, &advisories, &thresholds());
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].verdict, MatchVerdict::NoMatch);
		assert!(results[0].reason.contains("version score"));
	}

	#[test]
	fn test_wildcard_range_matches_any_version() {
		// the range is honored on the first table's records
		let mut advisory = record("siemens", "s7-1500", "simatic s7", Some("1.0.0"));
		advisory.product_version_range_modified = Some("vers:all/*".to_string());
		let assets = vec![record("siemens", "s7-1500", "simatic s7", Some("9.9.9"))];
		let results = match_all(&[advisory], &assets, &thresholds());
		assert_eq!(results[0].verdict, MatchVerdict::Match);
	}

	#[test]
	fn test_output_order_is_stable() {
		let assets = vec![
			record("siemens", "a", "fam", None),
			record("siemens", "b", "fam", None),
		];
		let advisories = vec![
			record("siemens", "x", "fam", None),
			record("siemens", "y", "fam", None),
		];
		let results = match_all(&assets, &advisories, &thresholds());
		let names: Vec<(&str, &str)> = results
			.iter()
			.map(|r| {
				(
					r.product_name_1.as_deref().unwrap(),
					r.product_name_2.as_deref().unwrap(),
				)
			})
			.collect();
		assert_eq!(
			names,
			vec![("a", "x"), ("a", "y"), ("b", "x"), ("b", "y")]
		);
	}
}
