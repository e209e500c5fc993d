// src/matching/attributes.rs

use crate::matching::similarity::{token_set_ratio, token_sort_ratio};
use crate::models::score::AttributeScore;

/// Wildcard sentinel meaning "every version is affected".
pub const VERSION_WILDCARD: &str = "vers:all/*";

/// Default group weights for product-name comparisons: the mixed
/// (serial-like) token group counts double.
pub const NAME_WEIGHTS: (u32, u32, u32) = (1, 1, 2);
/// Default group weights for product-family comparisons.
pub const FAMILY_WEIGHTS: (u32, u32, u32) = (1, 1, 1);

/// Classifies one comparison side. `Err` carries the neutral score to
/// return: absent data is `Unknown`, processed-but-empty is `NotApplicable`.
fn side(value: Option<&str>) -> Result<&str, AttributeScore> {
	match value {
		None => Err(AttributeScore::Unknown),
		Some(s) if s.trim().is_empty() => Err(AttributeScore::NotApplicable),
		Some(s) => Ok(s),
	}
}

fn both<'v>(
	a: Option<&'v str>,
	b: Option<&'v str>,
) -> Result<(&'v str, &'v str), AttributeScore> {
	match (side(a), side(b)) {
		(Ok(a), Ok(b)) => Ok((a, b)),
		// a side that never had the attribute outweighs one that is merely empty
		(Err(AttributeScore::Unknown), _) | (_, Err(AttributeScore::Unknown)) => {
			Err(AttributeScore::Unknown)
		}
		(Err(e), _) | (_, Err(e)) => Err(e),
	}
}

/// Case-insensitive word-order-invariant vendor similarity; neutral when
/// either side has no vendor.
pub fn match_vendor(vendor1: Option<&str>, vendor2: Option<&str>) -> AttributeScore {
	match both(vendor1, vendor2) {
		Ok((a, b)) => AttributeScore::Value(token_sort_ratio(a, b)),
		Err(neutral) => neutral,
	}
}

/// Splits a name into its three character-class token groups: alphabetic,
/// purely numeric, and everything mixed.
fn tokenize_and_group(text: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
	let mut alphabetic = Vec::new();
	let mut numeric = Vec::new();
	let mut mixed = Vec::new();
	for token in text.to_lowercase().split_whitespace() {
		if token.chars().all(|c| c.is_alphabetic()) {
			alphabetic.push(token.to_string());
		} else if token.chars().all(|c| c.is_ascii_digit()) {
			numeric.push(token.to_string());
		} else {
			mixed.push(token.to_string());
		}
	}
	(alphabetic, numeric, mixed)
}

/// Character-class pattern of a token: letter, number or other per
/// position. Serial-like tokens only compare against tokens of identical
/// shape.
fn shape_signature(token: &str) -> String {
	token
		.chars()
		.map(|c| {
			if c.is_alphabetic() {
				'L'
			} else if c.is_ascii_digit() {
				'N'
			} else {
				'O'
			}
		})
		.collect()
}

/// Compares the mixed token groups. `Some(score)` when at least one
/// qualifying pair (equal length over 4, matching shape) exists: the
/// minimum over all qualifying pairs, so one structural mismatch fails the
/// group. `None` when nothing qualifies; the caller then folds the mixed
/// tokens into the alphabetic groups.
fn mixed_group_score(mixed1: &[String], mixed2: &[String]) -> Option<u8> {
	let mut min_score: u8 = 100;
	let mut compared = false;
	for i in mixed1 {
		for j in mixed2 {
			let len = i.chars().count();
			if len != j.chars().count() || len <= 4 {
				continue;
			}
			if shape_signature(i) != shape_signature(j) {
				continue;
			}
			compared = true;
			let score = if i == j { 100 } else { 0 };
			if score < min_score {
				min_score = score;
			}
		}
	}
	compared.then_some(min_score)
}

/// Weighted multi-group product similarity. Full containment of one name in
/// the other short-circuits to 100. Groups with no comparable content drop
/// out of the weighted average; if every group drops out the result is
/// `Value(0)`, not neutral, since conflicting tokens that failed the
/// structural check are a real non-match signal.
pub fn match_product(
	name1: Option<&str>,
	name2: Option<&str>,
	weights: (u32, u32, u32),
) -> AttributeScore {
	let (name1, name2) = match both(name1, name2) {
		Ok(pair) => pair,
		Err(neutral) => return neutral,
	};

	let lower1 = name1.to_lowercase();
	let lower2 = name2.to_lowercase();
	if lower1.contains(&lower2) || lower2.contains(&lower1) {
		return AttributeScore::Value(100);
	}

	let (alpha1, num1, mixed1) = tokenize_and_group(name1);
	let (alpha2, num2, mixed2) = tokenize_and_group(name2);

	let mut alpha1_text = alpha1.join(" ");
	let mut alpha2_text = alpha2.join(" ");

	let mixed_score = if !mixed1.is_empty() && !mixed2.is_empty() {
		let score = mixed_group_score(&mixed1, &mixed2);
		if score.is_none() {
			// no structurally comparable pair: fold the mixed tokens into the
			// alphabetic comparison instead
			alpha1_text = fold(&alpha1_text, &mixed1);
			alpha2_text = fold(&alpha2_text, &mixed2);
		}
		score
	} else {
		None
	};

	let alpha_score = if !alpha1_text.is_empty() && !alpha2_text.is_empty() {
		Some(token_set_ratio(&alpha1_text, &alpha2_text))
	} else {
		None
	};
	let numeric_score = if !num1.is_empty() && !num2.is_empty() {
		Some(token_set_ratio(&num1.join(" "), &num2.join(" ")))
	} else {
		None
	};

	let (w1, w2, w3) = weights;
	let mut numerator: u32 = 0;
	let mut denominator: u32 = 0;
	for (score, weight) in [
		(alpha_score, w1),
		(numeric_score, w2),
		(mixed_score, w3),
	] {
		if let Some(s) = score {
			numerator += weight * s as u32;
			denominator += weight;
		}
	}

	if denominator == 0 {
		AttributeScore::Value(0)
	} else {
		AttributeScore::Value((numerator / denominator) as u8)
	}
}

fn fold(alpha_text: &str, mixed: &[String]) -> String {
	let mixed_text = mixed.join(" ");
	if alpha_text.is_empty() {
		mixed_text
	} else {
		format!("{} {}", alpha_text, mixed_text)
	}
}

/// Positional version similarity. The wildcard sentinel on either version
/// or on the first side's range absorbs everything to 100. Segments are
/// compared left to right after padding the shorter side with placeholders;
/// the first real divergence stops the walk, and earlier segments weigh
/// exponentially more than later ones.
pub fn match_version(
	version1: Option<&str>,
	version2: Option<&str>,
	range1: Option<&str>,
) -> AttributeScore {
	let is_wildcard = |v: Option<&str>| v == Some(VERSION_WILDCARD);
	if is_wildcard(version1) || is_wildcard(version2) || is_wildcard(range1) {
		return AttributeScore::Value(100);
	}

	let (version1, version2) = match both(version1, version2) {
		Ok(pair) => pair,
		Err(neutral) => return neutral,
	};

	let mut segments1: Vec<&str> = version1.split('.').collect();
	let mut segments2: Vec<&str> = version2.split('.').collect();
	let max_length = segments1.len().max(segments2.len());
	segments1.resize(max_length, "x");
	segments2.resize(max_length, "x");

	let mut segment_scores: Vec<u32> = Vec::with_capacity(max_length);
	for i in 0..max_length {
		if segments1[i] == "x" || segments2[i] == "x" {
			segment_scores.push(1);
		} else if segments1[i] == segments2[i] {
			segment_scores.push(1);
		} else {
			segment_scores.push(0);
			break;
		}
	}

	// earlier segments weigh exponentially more; f64 keeps degenerate
	// many-segment strings from overflowing
	let weights: Vec<f64> = (0..max_length)
		.map(|i| 2f64.powi((max_length - i - 1) as i32))
		.collect();
	let total: f64 = weights.iter().sum();
	let weighted: f64 = segment_scores
		.iter()
		.zip(weights.iter())
		.map(|(s, w)| *s as f64 * w)
		.sum();

	AttributeScore::Value(((weighted / total) * 100.0) as u8)
}

/// Keyword-set similarity: containment of one side in the other is a full
/// match, anything else present-but-different is a miss.
pub fn match_keyword(keywords1: Option<&str>, keywords2: Option<&str>) -> AttributeScore {
	let (k1, k2) = match both(keywords1, keywords2) {
		Ok(pair) => pair,
		Err(neutral) => return neutral,
	};
	let lower1 = k1.to_lowercase();
	let lower2 = k2.to_lowercase();
	if lower1.contains(&lower2) || lower2.contains(&lower1) {
		AttributeScore::Value(100)
	} else {
		AttributeScore::Value(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::score::AttributeScore::{NotApplicable, Unknown, Value};

	#[test]
	fn test_match_vendor_neutral_and_exact() {
		assert_eq!(match_vendor(None, Some("siemens")), Unknown);
		assert_eq!(match_vendor(Some("siemens"), None), Unknown);
		assert_eq!(match_vendor(Some(""), Some("siemens")), NotApplicable);
		assert_eq!(
			match_vendor(Some("Siemens"), Some("SIEMENS")),
			Value(100)
		);
		assert_eq!(match_vendor(Some("ABB Ltd"), Some("Ltd ABB")), Value(100));
	}

	#[test]
	fn test_match_product_containment_shortcut() {
		assert_eq!(
			match_product(Some("S7-1500"), Some("Siemens S7-1500 CPU"), NAME_WEIGHTS),
			Value(100)
		);
	}

	#[test]
	fn test_match_product_neutral_sides() {
		assert_eq!(match_product(None, Some("x"), NAME_WEIGHTS), Unknown);
		assert_eq!(match_product(Some(""), Some("x"), NAME_WEIGHTS), NotApplicable);
	}

	#[test]
	fn test_mixed_group_structural_match() {
		// same shape, same length, equal strings -> the mixed group scores
		// 100 at double weight; "cpu" vs "fan" shares no character, so the
		// alphabetic group scores 0 and the weighted average lands at
		// (0*1 + 100*2) / 3 = 66
		let score = match_product(
			Some("cpu 6es7-512"),
			Some("fan 6es7-512"),
			NAME_WEIGHTS,
		);
		assert_eq!(score, Value(66));
	}

	#[test]
	fn test_mixed_group_structural_mismatch_fails_group() {
		// same shape and length but different strings -> mixed group 0;
		// alphabetic tokens differ too, so the weighted result stays low
		let score = match_product(
			Some("cpu 6es7-512"),
			Some("cpu 6es7-513"),
			NAME_WEIGHTS,
		);
		// alphabetic group: "cpu" vs "cpu" = 100 (weight 1), mixed group 0
		// (weight 2) -> (100 + 0 + 0) / 3 = 33
		assert_eq!(score, Value(33));
	}

	#[test]
	fn test_mixed_group_no_qualifying_pair_folds_into_alphabetic() {
		// "6es7 212-1ae40-0xb0" vs "s7-1200": no equal-length pair over 4
		// chars shares a shape, so the mixed tokens fold into the (empty)
		// alphabetic groups and the token-set comparison runs over them
		let score = match_product(
			Some("6es7 212-1ae40-0xb0"),
			Some("s7-1200"),
			NAME_WEIGHTS,
		);
		// both sides are all mixed tokens; the fold makes the alphabetic
		// comparison "6es7 212-1ae40-0xb0" vs "s7-1200", which shares no
		// token -> low but present score, never neutral
		match score {
			Value(v) => assert!(v < 50, "expected a low folded score, got {}", v),
			other => panic!("expected Value, got {:?}", other),
		}
	}

	#[test]
	fn test_all_groups_empty_yields_zero_not_neutral() {
		// one side only alphabetic, the other only numeric: no group has
		// content on both sides, the denominator is 0 and the score is a
		// hard 0 rather than neutral
		assert_eq!(
			match_product(Some("alpha beta"), Some("123 456"), NAME_WEIGHTS),
			Value(0)
		);
	}

	#[test]
	fn test_match_version_wildcard_absorbs() {
		assert_eq!(
			match_version(Some(VERSION_WILDCARD), Some("1.2.3"), Some("1.0-2.0")),
			Value(100)
		);
		assert_eq!(match_version(Some("1.2.3"), Some(VERSION_WILDCARD), None), Value(100));
		assert_eq!(match_version(None, Some("1.2.3"), Some(VERSION_WILDCARD)), Value(100));
	}

	#[test]
	fn test_match_version_neutral_when_missing() {
		assert_eq!(match_version(None, Some("1.2.3"), None), Unknown);
		assert_eq!(match_version(Some("1.2.3"), Some(""), None), NotApplicable);
	}

	#[test]
	fn test_match_version_exact_and_padding() {
		assert_eq!(match_version(Some("1.2.3"), Some("1.2.3"), None), Value(100));
		// "x"-padded segments count as matching
		assert_eq!(match_version(Some("1.2"), Some("1.2.9"), None), Value(100));
	}

	#[test]
	fn test_match_version_monotonic_penalty() {
		let exact = match_version(Some("1.2.3"), Some("1.2.3"), None);
		let patch = match_version(Some("1.2.3"), Some("1.2.4"), None);
		assert_eq!(exact, Value(100));
		assert_eq!(patch, Value(85));
		assert!(patch.value() < exact.value());

		let major = match_version(Some("2.0.0"), Some("1.0.0"), None);
		let minor = match_version(Some("1.2.0"), Some("1.3.0"), None);
		assert_eq!(major, Value(0));
		assert_eq!(minor, Value(57));
		assert!(major.value() < minor.value());
	}

	#[test]
	fn test_match_version_stops_at_first_divergence() {
		// 1.2.3 vs 1.9.3: the walk stops at the second segment, the matching
		// third segment earns no credit
		assert_eq!(match_version(Some("1.2.3"), Some("1.9.3"), None), Value(57));
	}

	#[test]
	fn test_match_keyword() {
		assert_eq!(
			match_keyword(Some("firewall"), Some("Firewall appliance")),
			Value(100)
		);
		assert_eq!(match_keyword(None, Some("x")), Unknown);
		assert_eq!(match_keyword(Some(""), Some("x")), NotApplicable);
		assert_eq!(match_keyword(Some("switch"), Some("router")), Value(0));
	}

	#[test]
	fn test_shape_signature() {
		assert_eq!(shape_signature("6es7-512"), "NLLNONNN");
		assert_eq!(shape_signature("a1-b2"), "LNOLN");
	}
}
