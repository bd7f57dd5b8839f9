use log::info;

use crate::queries::QuerySet;
use crate::stats::AggregateResult;
use crate::transport::RunConfig;

/// Print usage guidance when no queries were given.
pub fn print_usage() {
	println!("dnsbench: no queries specified; use -h for help");
	println!("example: dnsbench --query example.com:A --query example.com:MX --server 22.231.113.64:53");
}

/// Log a summary of the run configuration before starting.
pub fn log_config_summary(queries: &QuerySet, config: &RunConfig) {
	info!("server: {}", config.server);
	info!("threads: {}", config.workers);
	info!("duration: {} s", config.duration.as_secs());
	info!("timeout: {} ms", config.timeout.as_millis());
	if let Some(seed) = config.seed {
		info!("seed: {}", seed);
	}
	info!("queries ({}):", queries.len());
	for query in queries.iter() {
		info!("  - {}", query);
	}
}

/// Render the final summary line.
///
/// An undefined average (some worker completed nothing) renders as NaN.
pub fn format_summary(result: &AggregateResult) -> String {
	format!(
		"iterations: {}; average rtt: {:.2} ms",
		result.iterations, result.average_rtt_ms,
	)
}

pub fn print_summary(result: &AggregateResult) {
	println!("{}", format_summary(result));
}
