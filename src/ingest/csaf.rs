// src/ingest/csaf.rs

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::models::record::ProductRecord;

/// Value written to `data_source` when a document carries no usable
/// reference URL.
pub const MISSING_SOURCE: &str = "missing";

/// Why a candidate file was excluded from the corpus.
#[derive(Debug, Error)]
pub enum CsafError {
	#[error("file is empty")]
	Empty,
	#[error("file is unreadable: {0}")]
	Unreadable(#[from] std::io::Error),
	#[error("invalid JSON: {0}")]
	InvalidJson(#[from] serde_json::Error),
	#[error("missing required CSAF section `{0}`")]
	MissingSection(&'static str),
}

#[derive(Debug, Default)]
pub struct CorpusStats {
	pub files_found: usize,
	pub files_excluded: usize,
	pub records: usize,
}

/// Walks `directory` recursively and returns the paths of all readable
/// CSAF JSON documents. Anything else is excluded with a log entry;
/// a broken file never aborts the scan.
///
/// # Arguments
///
/// * `directory` - The root directory to scan.
///
/// # Returns
///
/// * `Result<Vec<PathBuf>>` - Paths of the documents that passed validation.
pub fn collect_csaf_sources(directory: &Path) -> Result<Vec<PathBuf>> {
	let mut candidates = Vec::new();
	walk_json_files(directory, &mut candidates)
		.with_context(|| format!("Failed to scan CSAF directory {:?}", directory))?;

	let mut sources = Vec::new();
	for path in candidates {
		match validate_csaf_file(&path) {
			Ok(()) => sources.push(path),
			Err(CsafError::Empty) => {
				debug!("File {:?} is empty. File is excluded.", path);
			}
			Err(CsafError::Unreadable(e)) => {
				warn!("File {:?} is unreadable: {}. File is excluded.", path, e);
			}
			Err(CsafError::InvalidJson(e)) => {
				error!("File {:?} is not valid JSON: {}. File is excluded.", path, e);
			}
			Err(CsafError::MissingSection(section)) => {
				info!(
					"File {:?} does not fit the CSAF standard (missing `{}`). File is excluded.",
					path, section
				);
			}
		}
	}
	Ok(sources)
}

fn walk_json_files(directory: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
	for entry in fs::read_dir(directory)
		.with_context(|| format!("Failed to read directory {:?}", directory))?
	{
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				warn!("Unreadable directory entry under {:?}: {}. Entry is skipped.", directory, e);
				continue;
			}
		};
		let path = entry.path();
		if path.is_dir() {
			walk_json_files(&path, out)?;
		} else if path.extension().is_some_and(|ext| ext == "json") {
			out.push(path);
		} else {
			debug!("File {:?} is not a json file. File is excluded.", path);
		}
	}
	Ok(())
}

fn validate_csaf_file(path: &Path) -> Result<(), CsafError> {
	let metadata = fs::metadata(path)?;
	if metadata.len() == 0 {
		return Err(CsafError::Empty);
	}
	let file = File::open(path)?;
	let document: Value = serde_json::from_reader(BufReader::new(file))?;
	validate_csaf(&document)
}

/// Checks the three sections every CSAF document must carry.
pub fn validate_csaf(document: &Value) -> Result<(), CsafError> {
	for section in ["document", "product_tree", "vulnerabilities"] {
		if document.get(section).is_none() {
			return Err(CsafError::MissingSection(section));
		}
	}
	Ok(())
}

/// Reads one CSAF document the caller explicitly asked for. Unlike the bulk
/// scan this is fatal on a missing or malformed file.
pub fn read_csaf_document(path: &Path) -> Result<Value> {
	let file =
		File::open(path).with_context(|| format!("Could not find the file at {:?}", path))?;
	let document: Value = serde_json::from_reader(BufReader::new(file))
		.with_context(|| format!("Failed to parse CSAF document {:?}", path))?;
	validate_csaf(&document)
		.with_context(|| format!("File {:?} does not fit the CSAF standard", path))?;
	Ok(document)
}

/// First reference URL pointing at a JSON document, or the missing marker.
pub fn document_url(document: &Value, path: &Path) -> String {
	let references = document
		.pointer("/document/references")
		.and_then(Value::as_array);
	if let Some(references) = references {
		for reference in references {
			if let Some(url) = reference.get("url").and_then(Value::as_str) {
				if url.ends_with(".json") {
					return url.to_string();
				}
			}
		}
	}
	info!("No url for the json document provided in {:?}", path);
	MISSING_SOURCE.to_string()
}

/// Flattens the product tree of one document into records, one per leaf.
/// Branch categories accumulate top-down; documents listing
/// `full_product_names` instead of branches yield one record per entry.
pub fn flatten_product_tree(document: &Value, data_source: &str) -> Vec<ProductRecord> {
	let tree = match document.get("product_tree") {
		Some(tree) => tree,
		None => return Vec::new(),
	};

	if let Some(names) = tree.get("full_product_names").and_then(Value::as_array) {
		return names
			.iter()
			.map(|entry| {
				let mut record = ProductRecord::new(data_source);
				record.full_product_name =
					entry.get("name").and_then(Value::as_str).map(String::from);
				record.product_id = entry
					.get("product_id")
					.and_then(Value::as_str)
					.map(String::from);
				record
			})
			.collect();
	}

	let mut records = Vec::new();
	if let Some(branches) = tree.get("branches").and_then(Value::as_array) {
		for branch in branches {
			flatten_branch(branch, &BTreeMap::new(), data_source, &mut records);
		}
	}
	records
}

fn flatten_branch(
	branch: &Value,
	inherited: &BTreeMap<String, String>,
	data_source: &str,
	records: &mut Vec<ProductRecord>,
) {
	let mut attributes = inherited.clone();
	if let (Some(category), Some(name)) = (
		branch.get("category").and_then(Value::as_str),
		branch.get("name").and_then(Value::as_str),
	) {
		attributes.insert(category.to_string(), name.to_string());
	}

	if let Some(children) = branch.get("branches").and_then(Value::as_array) {
		for child in children {
			flatten_branch(child, &attributes, data_source, records);
		}
		return;
	}

	// leaf of the branch tree
	let mut record = ProductRecord::new(data_source);
	for (category, name) in &attributes {
		match category.as_str() {
			"vendor" => record.vendor = Some(name.clone()),
			"product_family" => record.product_family = Some(name.clone()),
			"product_name" => record.product_name = Some(name.clone()),
			"product_version" => record.product_version = Some(name.clone()),
			"product_version_range" => record.product_version_range = Some(name.clone()),
			other => debug!("Unmapped product tree category `{}`", other),
		}
	}
	if let Some(product) = branch.get("product") {
		record.full_product_name = product
			.get("name")
			.and_then(Value::as_str)
			.map(String::from);
		record.product_id = product
			.get("product_id")
			.and_then(Value::as_str)
			.map(String::from);
	}
	records.push(record);
}

/// Loads the whole advisory corpus under `directory` into records.
///
/// # Arguments
///
/// * `directory` - The root directory holding CSAF JSON documents.
///
/// # Returns
///
/// * `Result<(Vec<ProductRecord>, CorpusStats)>` - The flattened records
///   plus counts of processed and excluded files.
pub fn load_corpus(directory: &Path) -> Result<(Vec<ProductRecord>, CorpusStats)> {
	let sources = collect_csaf_sources(directory)?;
	let mut stats = CorpusStats::default();
	let mut records = Vec::new();

	for path in &sources {
		stats.files_found += 1;
		let document = match read_csaf_document(path) {
			Ok(document) => document,
			Err(e) => {
				// validated moments ago, but the file may have changed under us
				warn!("Error while reading file {:?}: {:#}. File is excluded.", path, e);
				stats.files_excluded += 1;
				continue;
			}
		};
		let source = document_url(&document, path);
		let flattened = flatten_product_tree(&document, &source);
		if flattened.is_empty() {
			info!("File {:?} contains no product tree entries", path);
		}
		stats.records += flattened.len();
		records.extend(flattened);
	}

	info!(
		"CSAF corpus loaded: {} files, {} excluded, {} product records",
		stats.files_found, stats.files_excluded, stats.records
	);
	Ok((records, stats))
}
