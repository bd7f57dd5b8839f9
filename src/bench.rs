use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::queries::QuerySet;
use crate::stats::{aggregate, AggregateResult, WorkerReport};
use crate::transport::{QueryExecutor, RunConfig};

/// Decide whether a worker should give up after its latest error.
///
/// A fresh worker tolerates five errors; every successful query buys five
/// more. The comparison is strict.
pub fn should_abort(errors: usize, iterations: usize) -> bool {
	errors > iterations * 5 + 5
}

/// Build the random source for one worker.
///
/// With a seed, worker i uses seed + i so runs are reproducible.
fn worker_rng(seed: Option<u64>, index: usize) -> StdRng {
	match seed {
		Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
		None => StdRng::from_entropy(),
	}
}

/// Compute the run deadline.
///
/// Durations too large to represent as an instant fall back to roughly 30
/// years from now, which no run reaches.
fn deadline_after(duration: Duration) -> Instant {
	let now = Instant::now();
	now.checked_add(duration)
		.unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

/// Issue random queries until the deadline passes or too many errors occur.
///
/// Failed queries are reported and counted but do not count as iterations.
async fn run_worker<E: QueryExecutor>(
	index: usize,
	queries: &QuerySet,
	config: &RunConfig,
	deadline: Instant,
	client: &mut E,
	rng: &mut StdRng,
) -> WorkerReport {
	let mut rtt_sum = Duration::ZERO;
	let mut iterations = 0usize;
	let mut errors = 0usize;

	while Instant::now() < deadline {
		let query = queries.choose(rng);
		match client.execute(query, &config.server).await {
			Ok(rtt) => {
				rtt_sum += rtt;
				iterations += 1;
			}
			Err(e) => {
				println!("query error: {}", e);
				errors += 1;
				if should_abort(errors, iterations) {
					println!("thread {}/{}: too many errors, quitting", index, config.workers);
					break;
				}
			}
		}
	}

	debug!(
		"worker {} finished: {} iterations, {} errors",
		index, iterations, errors,
	);
	WorkerReport::from_totals(rtt_sum, iterations)
}

/// Run the benchmark and aggregate the per-worker results.
///
/// Spawns `config.workers` workers, each with its own executor from
/// `connect`, and waits for exactly one report from each of them.
pub async fn run_benchmark<E, F>(
	queries: QuerySet,
	config: RunConfig,
	mut connect: F,
) -> Result<AggregateResult>
where
	E: QueryExecutor,
	F: FnMut(usize) -> E,
{
	let deadline = deadline_after(config.duration);
	let worker_count = config.workers;
	let queries = Arc::new(queries);
	let config = Arc::new(config);

	let (report_tx, mut report_rx) = mpsc::channel(worker_count.max(1));

	for index in 0..worker_count {
		let mut client = connect(index);
		let mut rng = worker_rng(config.seed, index);
		let queries = Arc::clone(&queries);
		let config = Arc::clone(&config);
		let report_tx = report_tx.clone();

		tokio::spawn(async move {
			debug!("worker {} started", index);
			let report = run_worker(
				index, &queries, &config, deadline, &mut client, &mut rng,
			).await;
			// The driver holds the receiver until every report is in
			let _ = report_tx.send(report).await;
		});
	}
	drop(report_tx);

	let mut reports = Vec::with_capacity(worker_count);
	while reports.len() < worker_count {
		match report_rx.recv().await {
			Some(report) => reports.push(report),
			None => bail!(
				"only {} of {} workers reported",
				reports.len(), worker_count,
			),
		}
	}

	Ok(aggregate(&reports))
}
