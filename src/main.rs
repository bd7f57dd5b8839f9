mod bench;
mod cli;
mod dns;
mod output;
mod queries;
mod stats;
mod transport;

use clap::Parser;
use std::time::Duration;

use crate::cli::Cli;
use crate::dns::UdpClient;
use crate::queries::{QuerySet, QuerySetError};
use crate::stats::AggregateResult;
use crate::transport::{QueryExecutor, RunConfig};

/// Parse the query flags; None means none were given.
fn load_queries(cli: &Cli) -> anyhow::Result<Option<QuerySet>> {
	match QuerySet::parse(&cli.queries) {
		Ok(queries) => Ok(Some(queries)),
		Err(QuerySetError::EmptyQuerySet) => Ok(None),
		Err(e) => Err(e.into()),
	}
}

/// Validate the queries and run the benchmark.
///
/// Returns None after printing usage when no queries were given; in that
/// case `connect` is never called and no worker starts.
async fn run<E, F>(cli: &Cli, connect: F) -> anyhow::Result<Option<AggregateResult>>
where
	E: QueryExecutor,
	F: FnMut(usize) -> E,
{
	let queries = match load_queries(cli)? {
		Some(queries) => queries,
		None => {
			output::print_usage();
			return Ok(None);
		}
	};

	let config = RunConfig {
		server: cli.server.clone(),
		workers: cli.threads,
		duration: Duration::from_secs(cli.seconds),
		timeout: Duration::from_millis(cli.timeout),
		seed: cli.seed,
	};
	output::log_config_summary(&queries, &config);

	let result = bench::run_benchmark(queries, config, connect).await?;
	Ok(Some(result))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::init();
	let cli = Cli::parse();

	let timeout = Duration::from_millis(cli.timeout);
	if let Some(result) = run(&cli, |_| UdpClient::new(timeout)).await? {
		output::print_summary(&result);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::future::Future;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	use anyhow::anyhow;

	use crate::transport::Query;

	/// Executor that counts its calls and always fails.
	struct RefusingClient {
		calls: Arc<AtomicUsize>,
	}

	impl QueryExecutor for RefusingClient {
		fn execute(
			&mut self,
			_query: &Query,
			_server: &str,
		) -> impl Future<Output = anyhow::Result<Duration>> + Send {
			self.calls.fetch_add(1, Ordering::SeqCst);
			async { Err(anyhow!("connection refused")) }
		}
	}

	#[test]
	fn test_no_queries_short_circuits() {
		let cli = Cli::try_parse_from(["dnsbench", "--server", "192.0.2.1:53"]).unwrap();
		assert!(load_queries(&cli).unwrap().is_none());
	}

	#[tokio::test]
	async fn test_no_queries_starts_no_workers() {
		let cli = Cli::try_parse_from(["dnsbench", "--server", "192.0.2.1:53"]).unwrap();
		let created = Arc::new(AtomicUsize::new(0));
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&created);
		let call_counter = Arc::clone(&calls);

		let result = run(&cli, move |_| {
			counter.fetch_add(1, Ordering::SeqCst);
			RefusingClient { calls: Arc::clone(&call_counter) }
		}).await.unwrap();

		assert!(result.is_none());
		assert_eq!(created.load(Ordering::SeqCst), 0);
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_max_seconds_accepted_and_run() {
		let cli = Cli::try_parse_from([
			"dnsbench", "--query", "example.com", "--threads", "2",
			"--seconds", "18446744073709551615",
		]).unwrap();
		assert_eq!(cli.seconds, u64::MAX);
		let calls = Arc::new(AtomicUsize::new(0));
		let call_counter = Arc::clone(&calls);

		let result = run(&cli, move |_| RefusingClient { calls: Arc::clone(&call_counter) })
			.await.unwrap().unwrap();

		// Both workers abort on their sixth error instead of overflowing the deadline
		assert_eq!(result.iterations, 0);
		assert!(result.average_rtt_ms.is_nan());
		assert_eq!(calls.load(Ordering::SeqCst), 12);
	}

	#[test]
	fn test_invalid_query_is_error() {
		let cli = Cli::try_parse_from(["dnsbench", "--query", "example.com:BOGUS"]).unwrap();
		let err = load_queries(&cli).unwrap_err();
		assert!(err.to_string().contains("example.com:BOGUS"));
	}

	#[test]
	fn test_queries_loaded() {
		let cli = Cli::try_parse_from([
			"dnsbench", "--query", "example.com:A", "--query", "example.com:MX",
		]).unwrap();
		let queries = load_queries(&cli).unwrap().unwrap();
		assert_eq!(queries.len(), 2);
	}
}
