use clap::builder::RangedU64ValueParser;
use clap::Parser;

/// DNS server load generator
#[derive(Parser, Debug)]
#[command(name = "dnsbench")]
#[command(about = "Measure DNS server latency and throughput under concurrent load")]
pub struct Cli {
	/// Queries to execute as name[:type], comma-separated (repeatable, type defaults to A)
	#[arg(short = 'q', long = "query")]
	pub queries: Vec<String>,

	/// Hostname or IP address and port of the DNS server to benchmark
	#[arg(short = 's', long = "server", default_value = "127.0.0.1:53")]
	pub server: String,

	/// Number of concurrent workers
	#[arg(
		short = 't',
		long = "threads",
		default_value = "8",
		value_parser = RangedU64ValueParser::<usize>::new().range(1..),
	)]
	pub threads: usize,

	/// Seconds to run the benchmark for
	#[arg(short = 'd', long = "seconds", default_value = "5")]
	pub seconds: u64,

	/// Per-query timeout in milliseconds
	#[arg(long = "timeout", default_value = "2000")]
	pub timeout: u64,

	/// Random seed for reproducible query selection
	#[arg(long = "seed")]
	pub seed: Option<u64>,
}
