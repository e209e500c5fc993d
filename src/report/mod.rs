// src/report/mod.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use log::{info, warn};
use serde::Serialize;

use crate::models::match_result::MatchResult;
use crate::normalize::vendor::VendorAudit;

/// One exported result row. Field names become the CSV header.
#[derive(Debug, Serialize)]
struct MatchResultRow<'r> {
	#[serde(rename = "Vendor 1")]
	vendor_1: Option<&'r str>,
	#[serde(rename = "Vendor 2")]
	vendor_2: Option<&'r str>,
	#[serde(rename = "Vendor 1 modified")]
	vendor_1_modified: Option<&'r str>,
	#[serde(rename = "Vendor 2 modified")]
	vendor_2_modified: Option<&'r str>,
	#[serde(rename = "Vendor Score")]
	vendor_score: String,
	#[serde(rename = "Product Name 1")]
	product_name_1: Option<&'r str>,
	#[serde(rename = "Product Name 2")]
	product_name_2: Option<&'r str>,
	#[serde(rename = "Product Name Score")]
	product_name_score: String,
	#[serde(rename = "Product Family Score")]
	product_family_score: String,
	#[serde(rename = "Function Keywords 1")]
	keywords_1: &'r str,
	#[serde(rename = "Function Keywords 2")]
	keywords_2: &'r str,
	#[serde(rename = "Keyword Score")]
	keyword_score: String,
	#[serde(rename = "Version 1 modified")]
	version_1: Option<&'r str>,
	#[serde(rename = "Version 2 modified")]
	version_2: Option<&'r str>,
	#[serde(rename = "Range 1 modified")]
	version_range_1: Option<&'r str>,
	#[serde(rename = "Version Score")]
	version_score: String,
	#[serde(rename = "Data Source 1")]
	data_source_1: &'r str,
	#[serde(rename = "Data Source 2")]
	data_source_2: &'r str,
	#[serde(rename = "Overall Score")]
	overall: u8,
	#[serde(rename = "Reason")]
	reason: &'r str,
}

impl<'r> From<&'r MatchResult> for MatchResultRow<'r> {
	fn from(result: &'r MatchResult) -> Self {
		Self {
			vendor_1: result.vendor_1.as_deref(),
			vendor_2: result.vendor_2.as_deref(),
			vendor_1_modified: result.vendor_1_modified.as_deref(),
			vendor_2_modified: result.vendor_2_modified.as_deref(),
			vendor_score: result.vendor_score.to_string(),
			product_name_1: result.product_name_1.as_deref(),
			product_name_2: result.product_name_2.as_deref(),
			product_name_score: result.product_name_score.to_string(),
			product_family_score: result.product_family_score.to_string(),
			keywords_1: &result.keywords_1,
			keywords_2: &result.keywords_2,
			keyword_score: result.keyword_score.to_string(),
			version_1: result.version_1.as_deref(),
			version_2: result.version_2.as_deref(),
			version_range_1: result.version_range_1.as_deref(),
			version_score: result.version_score.to_string(),
			data_source_1: &result.data_source_1,
			data_source_2: &result.data_source_2,
			overall: result.verdict.as_int(),
			reason: &result.reason,
		}
	}
}

/// Writes all match results, no-match rows included, in their stable pair
/// order. Returns the number of rows written.
pub fn write_match_results(path: &Path, results: &[MatchResult]) -> Result<usize> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create output directory {:?}", parent))?;
	}
	let mut writer = csv::Writer::from_path(path)
		.with_context(|| format!("Failed to create result file {:?}", path))?;

	for result in results {
		writer
			.serialize(MatchResultRow::from(result))
			.context("Failed to write match result row")?;
	}
	writer.flush().context("Failed to flush result file")?;

	info!("Wrote {} match result rows to {:?}", results.len(), path);
	Ok(results.len())
}

/// Writes the vendor-cleaning audit as a timestamped CSV, one file per run.
/// Returns the path of the file written, or `None` for an empty audit.
pub fn write_vendor_audit(directory: &Path, audit: &VendorAudit) -> Result<Option<PathBuf>> {
	if audit.is_empty() {
		info!("Vendor cleaning changed nothing; no audit file written");
		return Ok(None);
	}
	fs::create_dir_all(directory)
		.with_context(|| format!("Failed to create output directory {:?}", directory))?;

	let filename = format!(
		"vendor_cleaning_{}.csv",
		Local::now().format("%Y%m%d_%H%M%S")
	);
	let path = directory.join(filename);
	let mut writer = csv::Writer::from_path(&path)
		.with_context(|| format!("Failed to create audit file {:?}", path))?;

	for entry in &audit.entries {
		writer
			.serialize(entry)
			.context("Failed to write audit entry")?;
	}
	writer.flush().context("Failed to flush audit file")?;

	info!("Wrote {} vendor cleaning entries to {:?}", audit.len(), path);
	Ok(Some(path))
}

/// End-of-run accounting. The batch reports these even when individual
/// records failed along the way.
#[derive(Debug, Default)]
pub struct RunStats {
	pub advisory_files: usize,
	pub advisory_files_excluded: usize,
	pub advisory_records: usize,
	pub asset_records: usize,
	pub asset_rows_skipped: usize,
	pub pairs_scored: usize,
	pub matches: usize,
	pub vendor_audit_entries: usize,
}

impl RunStats {
	pub fn log_summary(&self) {
		info!(
			"Run summary: {} advisory files ({} excluded), {} advisory records, {} asset records ({} rows skipped)",
			self.advisory_files,
			self.advisory_files_excluded,
			self.advisory_records,
			self.asset_records,
			self.asset_rows_skipped
		);
		info!(
			"Run summary: {} pairs scored, {} matches, {} vendor cleaning changes",
			self.pairs_scored, self.matches, self.vendor_audit_entries
		);
		if self.pairs_scored == 0 {
			warn!("No record pairs survived the vendor pre-filter; check vendor normalization");
		}
	}
}
