// src/matching/similarity.rs

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Plain edit-distance similarity scaled to [0,100]. Empty input on either
/// side scores 0, not 100, so an all-blank comparison never counts as a hit.
pub fn ratio(a: &str, b: &str) -> u8 {
	if a.is_empty() || b.is_empty() {
		return 0;
	}
	(normalized_levenshtein(a, b) * 100.0).round() as u8
}

fn tokens(value: &str) -> Vec<String> {
	value
		.to_lowercase()
		.split(|c: char| !c.is_alphanumeric())
		.filter(|t| !t.is_empty())
		.map(|t| t.to_string())
		.collect()
}

/// Word-order-invariant similarity: tokens of both strings are sorted and
/// rejoined before the edit-distance comparison, so "ABB Ltd" and
/// "Ltd ABB" score identically.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
	let mut ta = tokens(a);
	let mut tb = tokens(b);
	ta.sort();
	tb.sort();
	ratio(&ta.join(" "), &tb.join(" "))
}

/// Order- and duplicate-insensitive similarity over token sets. Built from
/// the sorted intersection and the two sorted remainders; a token set fully
/// contained in the other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
	let set_a: BTreeSet<String> = tokens(a).into_iter().collect();
	let set_b: BTreeSet<String> = tokens(b).into_iter().collect();
	if set_a.is_empty() || set_b.is_empty() {
		return 0;
	}

	let common: Vec<String> = set_a.intersection(&set_b).cloned().collect();
	let only_a: Vec<String> = set_a.difference(&set_b).cloned().collect();
	let only_b: Vec<String> = set_b.difference(&set_a).cloned().collect();

	let base = common.join(" ");
	let combined_a = join_parts(&base, &only_a.join(" "));
	let combined_b = join_parts(&base, &only_b.join(" "));

	let r1 = ratio(&base, &combined_a);
	let r2 = ratio(&base, &combined_b);
	let r3 = ratio(&combined_a, &combined_b);
	r1.max(r2).max(r3)
}

fn join_parts(base: &str, rest: &str) -> String {
	match (base.is_empty(), rest.is_empty()) {
		(true, _) => rest.to_string(),
		(_, true) => base.to_string(),
		_ => format!("{} {}", base, rest),
	}
}
