// src/ingest/inventory.rs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{info, warn};
use serde::Deserialize;

use crate::models::record::ProductRecord;

const EXPECTED_HEADERS: [&str; 5] = [
	"Manufacturer",
	"Device Family",
	"Device Type",
	"Article Number",
	"Version",
];

/// Represents a row in the asset inventory CSV.
///
/// The struct fields are mapped to the actual CSV column headers using
/// `serde`'s `rename` attribute.
#[derive(Debug, Deserialize)]
pub struct AssetCsvRecord {
	#[serde(rename = "Manufacturer")]
	pub manufacturer: Option<String>,

	#[serde(rename = "Device Family")]
	pub device_family: Option<String>,

	#[serde(rename = "Device Type")]
	pub device_type: Option<String>,

	#[serde(rename = "Article Number")]
	pub article_number: Option<String>,

	#[serde(rename = "Version")]
	pub version: Option<String>,
}

#[derive(Debug, Default)]
pub struct InventoryStats {
	pub imported: usize,
	pub skipped: usize,
}

/// Imports asset records from a CSV file.
///
/// A row that fails to deserialize is warned about and skipped; the import
/// carries on, and the caller gets both counts.
///
/// # Arguments
///
/// * `path` - The path to the CSV file.
///
/// # Returns
///
/// * `Result<(Vec<ProductRecord>, InventoryStats)>` - The imported records
///   and the import statistics.
pub fn import_assets_from_csv(path: &Path) -> Result<(Vec<ProductRecord>, InventoryStats)> {
	let file = File::open(path)
		.with_context(|| format!("Failed to open asset inventory file {:?}", path))?;
	let mut reader = ReaderBuilder::new()
		.trim(csv::Trim::All)
		.from_reader(BufReader::new(file));

	validate_csv_headers(&mut reader)?;

	let source = path.to_string_lossy().into_owned();
	let mut stats = InventoryStats::default();
	let mut records = Vec::new();

	for (line_number, result) in reader.deserialize::<AssetCsvRecord>().enumerate() {
		match result {
			Ok(row) => {
				records.push(to_product_record(row, &source));
				stats.imported += 1;
			}
			Err(e) => {
				warn!("Skipping invalid record at line {}: {}", line_number + 2, e);
				stats.skipped += 1;
			}
		}
	}

	info!(
		"Asset inventory import completed: {} records imported, {} skipped",
		stats.imported, stats.skipped
	);
	Ok((records, stats))
}

/// Validates that the CSV headers match the expected headers.
fn validate_csv_headers(reader: &mut csv::Reader<BufReader<File>>) -> Result<()> {
	let headers = reader.headers().context("Failed to read CSV headers")?;

	for expected in EXPECTED_HEADERS {
		if !headers.iter().any(|actual| expected.eq_ignore_ascii_case(actual)) {
			return Err(anyhow::anyhow!(
				"Missing expected column '{}' in asset inventory",
				expected
			));
		}
	}
	Ok(())
}

fn to_product_record(row: AssetCsvRecord, source: &str) -> ProductRecord {
	let mut record = ProductRecord::new(source);
	record.vendor = non_empty_string(row.manufacturer);
	record.product_family = non_empty_string(row.device_family);
	// the article number travels with the device type: serial-style tokens
	// are what the structural name comparison keys on
	record.product_name = match (
		non_empty_string(row.device_type),
		non_empty_string(row.article_number),
	) {
		(Some(device_type), Some(article)) => Some(format!("{} {}", device_type, article)),
		(Some(device_type), None) => Some(device_type),
		(None, article) => article,
	};
	record.product_version = non_empty_string(row.version);
	record
}

/// Converts a cell to `None` if it is empty or whitespace.
fn non_empty_string(cell: Option<String>) -> Option<String> {
	cell.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::tempdir;

	fn write_csv(content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
		let dir = tempdir()?;
		let path = dir.path().join("assets.csv");
		let mut file = File::create(&path)?;
		write!(file, "{}", content)?;
		Ok((dir, path))
	}

	#[test]
	fn test_import_maps_columns() -> Result<()> {
		let (_dir, path) = write_csv(
			"Manufacturer,Device Family,Device Type,Article Number,Version\n\
			 Siemens AG,SIMATIC S7,S7-1500 CPU,6ES7 512-1DK01-0AB0,2.9.2\n\
			 ,,Unknown device,,\n",
		)?;

		let (records, stats) = import_assets_from_csv(&path)?;
		assert_eq!(stats.imported, 2);
		assert_eq!(stats.skipped, 0);

		let first = &records[0];
		assert_eq!(first.vendor.as_deref(), Some("Siemens AG"));
		assert_eq!(first.product_family.as_deref(), Some("SIMATIC S7"));
		assert_eq!(
			first.product_name.as_deref(),
			Some("S7-1500 CPU 6ES7 512-1DK01-0AB0")
		);
		assert_eq!(first.product_version.as_deref(), Some("2.9.2"));
		assert!(first.data_source.ends_with("assets.csv"));

		let second = &records[1];
		assert_eq!(second.vendor, None);
		assert_eq!(second.product_name.as_deref(), Some("Unknown device"));
		Ok(())
	}

	#[test]
	fn test_missing_column_is_an_error() -> Result<()> {
		let (_dir, path) = write_csv("Manufacturer,Device Family\nSiemens,S7\n")?;
		assert!(import_assets_from_csv(&path).is_err());
		Ok(())
	}

	#[test]
	fn test_short_rows_are_skipped_not_fatal() -> Result<()> {
		let (_dir, path) = write_csv(
			"Manufacturer,Device Family,Device Type,Article Number,Version\n\
			 Siemens AG,SIMATIC S7,S7-1500,6ES7,2.9.2\n\
			 only-one-field\n\
			 Phoenix Contact,Axioline,AXC F 2152,2404267,1.0.4\n",
		)?;

		let (records, stats) = import_assets_from_csv(&path)?;
		assert_eq!(stats.imported, 2);
		assert_eq!(stats.skipped, 1);
		assert_eq!(records.len(), 2);
		Ok(())
	}
}
