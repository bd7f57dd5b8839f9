use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use hickory_proto::op::{Message, MessageType, Query as Question};
use hickory_proto::rr::{Name, RecordType};
use log::debug;
use tokio::net::UdpSocket;

use crate::transport::{Query, QueryExecutor, QueryType};

/// Build a DNS query message for the given domain and query type.
///
/// The domain is made fully qualified before encoding.
/// Returns the serialized query bytes ready to send over UDP.
pub fn build_query(
	domain: &str,
	query_type: QueryType,
	txid: u16,
) -> Result<Vec<u8>> {
	let fqdn = if domain.ends_with('.') {
		domain.to_string()
	} else {
		format!("{}.", domain)
	};
	let name = Name::from_ascii(&fqdn)
		.map_err(|e| anyhow!("invalid domain name '{}': {}", domain, e))?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_recursion_desired(true);
	message.add_query(Question::query(name, record_type(query_type)));

	let bytes = message.to_vec()
		.map_err(|e| anyhow!("failed to serialize DNS query: {}", e))?;
	Ok(bytes)
}

fn record_type(query_type: QueryType) -> RecordType {
	match query_type {
		QueryType::A => RecordType::A,
		QueryType::AAAA => RecordType::AAAA,
		QueryType::MX => RecordType::MX,
		QueryType::NS => RecordType::NS,
		QueryType::TXT => RecordType::TXT,
		QueryType::CNAME => RecordType::CNAME,
	}
}

/// Parse a DNS response and validate its transaction ID.
///
/// Any response code is accepted; only malformed messages, queries and
/// foreign transaction IDs are rejected.
pub fn parse_response(bytes: &[u8], expected_txid: u16) -> Result<Message> {
	let message = Message::from_vec(bytes)
		.map_err(|e| anyhow!("failed to parse DNS response: {}", e))?;

	if message.id() != expected_txid {
		return Err(anyhow!(
			"txid mismatch: expected {}, got {}",
			expected_txid, message.id()
		));
	}

	if message.message_type() != MessageType::Response {
		return Err(anyhow!("received a query instead of a response"));
	}

	Ok(message)
}

/// UDP query client owned by a single worker.
///
/// The socket is bound on first use and reused for every later query, and
/// the server endpoint is resolved once.
pub struct UdpClient {
	timeout: Duration,
	target: Option<(String, SocketAddr)>,
	socket: Option<UdpSocket>,
	/// Receive buffer, 4096 bytes covers EDNS-sized responses
	buf: Vec<u8>,
}

impl UdpClient {
	pub fn new(timeout: Duration) -> Self {
		UdpClient {
			timeout,
			target: None,
			socket: None,
			buf: vec![0u8; 4096],
		}
	}

	async fn resolve(&mut self, server: &str) -> Result<SocketAddr> {
		if let Some((cached, addr)) = &self.target {
			if cached == server {
				return Ok(*addr);
			}
		}
		let addr = tokio::net::lookup_host(server).await
			.map_err(|e| anyhow!("failed to resolve server '{}': {}", server, e))?
			.next()
			.ok_or_else(|| anyhow!("no address found for server '{}'", server))?;
		self.target = Some((server.to_string(), addr));
		Ok(addr)
	}

	async fn bind(&mut self, server: SocketAddr) -> Result<()> {
		if self.socket.is_none() {
			let bind_addr = if server.is_ipv4() {
				"0.0.0.0:0"
			} else {
				"[::]:0"
			};
			let socket = UdpSocket::bind(bind_addr).await
				.map_err(|e| anyhow!("failed to bind UDP socket: {}", e))?;
			self.socket = Some(socket);
		}
		Ok(())
	}

	/// Send one query and wait for its matching response.
	///
	/// Stale datagrams (late answers to earlier timed-out queries, other
	/// senders) are skipped until the timeout runs out.
	pub async fn exchange(&mut self, query: &Query, server: &str) -> Result<Duration> {
		let timeout = self.timeout;
		let addr = self.resolve(server).await?;
		self.bind(addr).await?;
		let socket = self.socket.as_ref()
			.ok_or_else(|| anyhow!("UDP socket unavailable"))?;
		let buf = &mut self.buf;

		let txid: u16 = rand::random();
		let query_bytes = build_query(&query.name, query.query_type, txid)?;

		let start = Instant::now();
		socket.send_to(&query_bytes, addr).await
			.map_err(|e| anyhow!("write udp {}: {}", addr, e))?;

		loop {
			let remaining = timeout.saturating_sub(start.elapsed());
			if remaining.is_zero() {
				return Err(anyhow!("read udp {}: i/o timeout", addr));
			}
			let (len, src) = match tokio::time::timeout(remaining, socket.recv_from(&mut buf[..])).await {
				Ok(Ok(received)) => received,
				Ok(Err(e)) => return Err(anyhow!("read udp {}: {}", addr, e)),
				Err(_) => return Err(anyhow!("read udp {}: i/o timeout", addr)),
			};
			let latency = start.elapsed();
			if src != addr {
				debug!("discarding datagram from unexpected source {}", src);
				continue;
			}
			match parse_response(&buf[..len], txid) {
				Ok(_) => return Ok(latency),
				Err(e) => debug!("discarding response from {}: {}", src, e),
			}
		}
	}
}

impl QueryExecutor for UdpClient {
	fn execute(
		&mut self,
		query: &Query,
		server: &str,
	) -> impl Future<Output = Result<Duration>> + Send {
		self.exchange(query, server)
	}
}
