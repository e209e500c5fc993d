// src/matching/aggregate.rs

use log::warn;

use crate::config::Thresholds;
use crate::models::score::{AttributeScore, MatchVerdict};

/// How far below the name threshold a product name may score and still be
/// rescued by the version/keyword boost.
const NAME_BOOST_BAND: u8 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchDecision {
	pub verdict: MatchVerdict,
	pub reason: String,
}

impl MatchDecision {
	fn matched(reason: impl Into<String>) -> Self {
		Self {
			verdict: MatchVerdict::Match,
			reason: reason.into(),
		}
	}

	fn rejected(reason: impl Into<String>) -> Self {
		Self {
			verdict: MatchVerdict::NoMatch,
			reason: reason.into(),
		}
	}
}

/// Combines the five attribute scores into a verdict. The policy is an
/// ordered decision tree: vendor gates everything, then the family score
/// selects the branch, then name, version and keyword refine it. Every
/// branch is explicit; the trailing arm exists only as a guard and logs a
/// warning if it is ever taken.
pub fn calculate_overall_score(
	vendor_score: AttributeScore,
	product_name_score: AttributeScore,
	product_family_score: AttributeScore,
	version_score: AttributeScore,
	keyword_score: AttributeScore,
	thresholds: &Thresholds,
) -> MatchDecision {
	let vendor = match vendor_score.value() {
		Some(v) => v,
		None => return MatchDecision::rejected("no match - vendor missing"),
	};
	if vendor < thresholds.vendor {
		return MatchDecision::rejected(format!(
			"no match - vendor score is below {}% ({}%)",
			thresholds.vendor, vendor
		));
	}

	match product_family_score.value() {
		None => decide_on_name(
			vendor,
			product_name_score,
			version_score,
			keyword_score,
			thresholds,
			true,
		),
		Some(family) if family >= thresholds.product_family => decide_on_name(
			vendor,
			product_name_score,
			version_score,
			keyword_score,
			thresholds,
			false,
		),
		Some(family) => MatchDecision::rejected(format!(
			"no match - product family score is below {}% ({}%)",
			thresholds.product_family, family
		)),
	}
}

/// The shared name/version/keyword sub-tree of both surviving family
/// branches. `family_missing` distinguishes the reasons and the handling of
/// an absent product name: without a family score a missing name rejects,
/// with a sufficient family it still matches.
fn decide_on_name(
	vendor: u8,
	product_name_score: AttributeScore,
	version_score: AttributeScore,
	keyword_score: AttributeScore,
	thresholds: &Thresholds,
	family_missing: bool,
) -> MatchDecision {
	let name = match product_name_score.value() {
		Some(n) => n,
		None if family_missing => {
			return MatchDecision::rejected("no match - product name and family missing")
		}
		None => return MatchDecision::matched("possible match - product name missing"),
	};

	if name >= thresholds.product_name {
		if let Some(version) = version_score.value() {
			if version < thresholds.version {
				return MatchDecision::rejected(format!(
					"no match - version score is below {}% ({}%)",
					thresholds.version, version
				));
			}
		}
		return MatchDecision::matched(if family_missing {
			"match - product family missing"
		} else {
			"match - product name and family given"
		});
	}

	let band_floor = thresholds.product_name.saturating_sub(NAME_BOOST_BAND);
	if name >= band_floor {
		if let (Some(version), Some(keyword)) = (version_score.value(), keyword_score.value()) {
			let boosted = (3.0 * vendor as f64
				+ 2.0 * name as f64
				+ version as f64
				+ keyword as f64)
				/ 7.0;
			if boosted >= thresholds.keyword as f64 {
				return MatchDecision::matched("possible match - version and keyword boost");
			}
			return MatchDecision::rejected(format!(
				"no match - boosted score is below {}% ({:.0}%)",
				thresholds.keyword, boosted
			));
		}
	}

	if name < thresholds.product_name {
		return MatchDecision::rejected(format!(
			"no match - product name score is below {}% ({}%)",
			thresholds.product_name, name
		));
	}

	// every input combination is covered above; reaching this arm means the
	// decision table has a hole
	warn!(
		"Decision fallthrough for vendor {}%, name {}%; rejecting defensively",
		vendor, name
	);
	MatchDecision::rejected("no match - decision fallthrough")
}
