use std::time::Duration;

/// Partial result delivered once by each worker
#[derive(Debug, Clone, Copy)]
pub struct WorkerReport {
	/// Mean round-trip time in milliseconds; NaN when no query succeeded
	pub mean_rtt_ms: f64,
	pub iterations: usize,
}

impl WorkerReport {
	/// Build a report from a worker's accumulated RTT sum and success count.
	pub fn from_totals(rtt_sum: Duration, iterations: usize) -> Self {
		// 0/0 yields NaN for idle workers
		let mean_rtt_ms = rtt_sum.as_secs_f64() * 1000.0 / iterations as f64;
		WorkerReport { mean_rtt_ms, iterations }
	}
}

/// Combined result of a whole run
#[derive(Debug, Clone, Copy)]
pub struct AggregateResult {
	pub iterations: usize,
	pub average_rtt_ms: f64,
}

/// Combine worker reports into the run result.
///
/// The average is the unweighted mean of per-worker means: every worker
/// counts once regardless of how many queries it completed, and a NaN mean
/// from an idle worker propagates into the result.
pub fn aggregate(reports: &[WorkerReport]) -> AggregateResult {
	let iterations = reports.iter().map(|r| r.iterations).sum();
	let worker_count = reports.len() as f64;
	let average_rtt_ms = reports.iter()
		.map(|r| r.mean_rtt_ms / worker_count)
		.sum();
	AggregateResult { iterations, average_rtt_ms }
}
