// src/normalize/synonym.rs

use log::{info, warn};
use regex::Regex;

use crate::config::{SynonymDictionary, ALIAS_ROW};

/// Resolves raw tokens to canonical labels by whole-word lookup in the
/// synonym dictionary. The dictionary is read-only; one resolver instance
/// serves the whole run.
pub struct SynonymResolver<'a> {
	dict: &'a SynonymDictionary,
}

impl<'a> SynonymResolver<'a> {
	pub fn new(dict: &'a SynonymDictionary) -> Self {
		Self { dict }
	}

	/// Looks up `token` and returns the canonical label(s), comma-joined,
	/// or `""` when nothing matches. `scope` optionally names a dictionary
	/// column (itself addressable through the `alias` row); when it resolves
	/// to exactly one column the search is restricted to it, otherwise the
	/// whole dictionary is searched.
	///
	/// No match is an expected outcome, not an error: the function never
	/// fails, it only logs.
	pub fn resolve(&self, token: &str, scope: Option<&str>) -> String {
		if token.trim().is_empty() {
			warn!("No input string to resolve against the synonym dictionary");
			return String::new();
		}
		if self.dict.is_empty() {
			return String::new();
		}

		let needle = strip_lookup_punctuation(token);
		if needle.is_empty() {
			return String::new();
		}
		let pattern = match whole_word_pattern(&needle) {
			Some(p) => p,
			None => return String::new(),
		};

		let columns: Vec<&String> = match scope {
			Some(scope_name) => self.scoped_columns(scope_name),
			None => self.dict.columns().collect(),
		};

		self.lookup(&needle, &pattern, &columns)
	}

	/// Resolves a scope name through the `alias` row. Exactly one column
	/// hit restricts the search; zero or several fall back to the whole
	/// dictionary with a note.
	fn scoped_columns(&self, scope_name: &str) -> Vec<&String> {
		let scope_lower = scope_name.to_lowercase();
		let hits: Vec<&String> = self
			.dict
			.0
			.iter()
			.filter(|(_, rows)| {
				rows.get(ALIAS_ROW).is_some_and(|aliases| {
					aliases
						.iter()
						.any(|a| a.to_lowercase().contains(&scope_lower))
				})
			})
			.map(|(col, _)| col)
			.collect();

		match hits.len() {
			1 => hits,
			0 => {
				info!(
					"No dictionary column matches scope '{}', searching the whole dictionary",
					scope_name
				);
				self.dict.columns().collect()
			}
			_ => {
				info!(
					"Inconclusive scope '{}' ({} column hits), searching the whole dictionary",
					scope_name,
					hits.len()
				);
				self.dict.columns().collect()
			}
		}
	}

	fn lookup(&self, needle: &str, pattern: &Regex, columns: &[&String]) -> String {
		let mut labels: Vec<&str> = Vec::new();
		for column in columns {
			let rows = match self.dict.0.get(*column) {
				Some(rows) => rows,
				None => continue,
			};
			for (label, aliases) in rows {
				if !aliases.iter().any(|a| pattern.is_match(a)) {
					continue;
				}
				if label == ALIAS_ROW {
					// The token names an attribute, not a value. Answer with
					// every column whose alias row contains it.
					return self.alias_row_hits(needle, pattern);
				}
				if !labels.contains(&label.as_str()) {
					labels.push(label);
				}
			}
		}
		labels.join(", ")
	}

	fn alias_row_hits(&self, needle: &str, pattern: &Regex) -> String {
		let hits: Vec<&str> = self
			.dict
			.0
			.iter()
			.filter(|(_, rows)| {
				rows.get(ALIAS_ROW)
					.is_some_and(|aliases| aliases.iter().any(|a| pattern.is_match(a)))
			})
			.map(|(col, _)| col.as_str())
			.collect();

		if hits.len() > 1 {
			info!(
				"Multiple attribute hits for '{}': {}",
				needle,
				hits.join(", ")
			);
		}
		hits.join(", ")
	}
}

/// Drops the punctuation `()[],-._/` before lookup and collapses the
/// whitespace this leaves behind.
fn strip_lookup_punctuation(token: &str) -> String {
	let replaced: String = token
		.chars()
		.map(|c| {
			if matches!(c, '(' | ')' | '[' | ']' | ',' | '-' | '.' | '_' | '/') {
				' '
			} else {
				c
			}
		})
		.collect();
	replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn whole_word_pattern(needle: &str) -> Option<Regex> {
	Regex::new(&format!(r"(?i)\b{}\b", regex::escape(needle))).ok()
}
