use std::fmt;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;

/// DNS record type a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
	A,
	AAAA,
	MX,
	NS,
	TXT,
	CNAME,
}

impl QueryType {
	/// Match a record type name case-insensitively.
	///
	/// Returns None for anything outside the supported set.
	pub fn parse(input: &str) -> Option<Self> {
		match input.to_ascii_uppercase().as_str() {
			"A" => Some(QueryType::A),
			"AAAA" => Some(QueryType::AAAA),
			"MX" => Some(QueryType::MX),
			"NS" => Some(QueryType::NS),
			"TXT" => Some(QueryType::TXT),
			"CNAME" => Some(QueryType::CNAME),
			_ => None,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			QueryType::A => "A",
			QueryType::AAAA => "AAAA",
			QueryType::MX => "MX",
			QueryType::NS => "NS",
			QueryType::TXT => "TXT",
			QueryType::CNAME => "CNAME",
		}
	}
}

impl fmt::Display for QueryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single query to issue: name plus record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	pub name: String,
	pub query_type: QueryType,
}

impl fmt::Display for Query {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.name, self.query_type)
	}
}

/// Run configuration, fixed at startup and shared read-only by all workers
#[derive(Debug, Clone)]
pub struct RunConfig {
	/// Server endpoint, passed verbatim to the executor
	pub server: String,
	pub workers: usize,
	pub duration: Duration,
	/// Per-query timeout enforced by the UDP client
	pub timeout: Duration,
	pub seed: Option<u64>,
}

/// Performs one query against a server and reports its round-trip time.
///
/// Each worker owns exactly one executor for its whole lifetime, so
/// implementations may keep per-connection state (sockets, buffers) in self.
pub trait QueryExecutor: Send + 'static {
	fn execute(
		&mut self,
		query: &Query,
		server: &str,
	) -> impl Future<Output = Result<Duration>> + Send;
}
