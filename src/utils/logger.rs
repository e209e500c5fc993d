use env_logger::{Builder, Env};

/// Initializes logging for the batch run. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once (tests may race on it), the
/// first caller wins.
pub fn init() {
	Builder::from_env(Env::default().default_filter_or("info"))
		.format_timestamp_millis()
		.format_module_path(true)
		.try_init()
		.ok();
}
