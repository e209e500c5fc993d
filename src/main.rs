// src/main.rs

mod config;
mod ingest;
mod matching;
mod models;
mod normalize;
mod report;
mod utils;

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use config::MatchingConfig;
use models::record::ProductRecord;
use models::score::MatchVerdict;
use normalize::vendor::VendorAudit;
use report::RunStats;

const DEFAULT_CSAF_DIR: &str = "./data/csaf";
const DEFAULT_INVENTORY_FILE: &str = "./data/assets.csv";
const DEFAULT_CONFIG_FILE: &str = "./data/matching_config.json";
const DEFAULT_OUTPUT_DIR: &str = "./output";

struct App {
	config: MatchingConfig,
	csaf_dir: PathBuf,
	inventory_file: PathBuf,
	output_dir: PathBuf,
}

impl App {
	fn new() -> Self {
		utils::logger::init();
		info!("Starting CSAF asset matcher");

		let mut args = env::args().skip(1);
		let csaf_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_CSAF_DIR.into()));
		let inventory_file =
			PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INVENTORY_FILE.into()));
		let config_file =
			PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_CONFIG_FILE.into()));
		let output_dir = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into()));

		let config = MatchingConfig::load_or_default(&config_file);

		App {
			config,
			csaf_dir,
			inventory_file,
			output_dir,
		}
	}

	fn run(&self) -> Result<()> {
		let mut stats = RunStats::default();

		let (mut advisories, corpus_stats) = ingest::csaf::load_corpus(&self.csaf_dir)
			.with_context(|| format!("Failed to load CSAF corpus from {:?}", self.csaf_dir))?;
		stats.advisory_files = corpus_stats.files_found;
		stats.advisory_files_excluded = corpus_stats.files_excluded;
		stats.advisory_records = corpus_stats.records;

		let (mut assets, inventory_stats) =
			ingest::inventory::import_assets_from_csv(&self.inventory_file)
				.with_context(|| {
					format!("Failed to import asset inventory {:?}", self.inventory_file)
				})?;
		stats.asset_records = inventory_stats.imported;
		stats.asset_rows_skipped = inventory_stats.skipped;

		if advisories.is_empty() || assets.is_empty() {
			warn!(
				"Nothing to match: {} advisory records, {} asset records",
				advisories.len(),
				assets.len()
			);
		}

		let audit = self.normalize_tables(&mut advisories, &mut assets);
		stats.vendor_audit_entries = audit.len();

		// advisories go in first: the version-range wildcard is honored on
		// the first table's records, and ranges come from CSAF entries
		info!("Scoring advisory records against asset records");
		let results =
			matching::engine::match_all(&advisories, &assets, &self.config.thresholds);
		stats.pairs_scored = results.len();
		stats.matches = results
			.iter()
			.filter(|r| r.verdict == MatchVerdict::Match)
			.count();

		let result_file = self.output_dir.join("match_results.csv");
		report::write_match_results(&result_file, &results)?;
		report::write_vendor_audit(&self.output_dir, &audit)?;

		stats.log_summary();
		Ok(())
	}

	fn normalize_tables(
		&self,
		advisories: &mut [ProductRecord],
		assets: &mut [ProductRecord],
	) -> VendorAudit {
		info!("Normalizing {} advisory records", advisories.len());
		let mut audit = normalize::normalize_table(advisories, &self.config);

		info!("Normalizing {} asset records", assets.len());
		let asset_audit = normalize::normalize_table(assets, &self.config);
		audit.entries.extend(asset_audit.entries);
		audit
	}
}

fn main() -> Result<()> {
	App::new().run()
}
