use std::fmt;

use rand::Rng;
use thiserror::Error;

use crate::transport::{Query, QueryType};

/// Configuration errors detected before any worker starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuerySetError {
	#[error("invalid DNS type '{record_type}' in query '{token}'")]
	InvalidRecordType { token: String, record_type: String },
	#[error("empty domain name in query '{token}'")]
	EmptyName { token: String },
	#[error("no queries specified")]
	EmptyQuerySet,
}

/// Ordered, non-empty list of queries the workers pick from
#[derive(Debug, Clone)]
pub struct QuerySet {
	queries: Vec<Query>,
}

impl QuerySet {
	/// Parse one or more `--query` values into a QuerySet.
	///
	/// Each value is a comma-separated list of `name[:type]` tokens. The type
	/// defaults to A and is matched case-insensitively. Order follows the
	/// order of values and tokens; duplicates are kept.
	pub fn parse<S: AsRef<str>>(values: &[S]) -> Result<Self, QuerySetError> {
		let mut queries = Vec::new();
		for value in values {
			for token in value.as_ref().split(',') {
				queries.push(parse_token(token)?);
			}
		}
		if queries.is_empty() {
			return Err(QuerySetError::EmptyQuerySet);
		}
		Ok(QuerySet { queries })
	}

	pub fn len(&self) -> usize {
		self.queries.len()
	}

	/// Always false for a parsed set.
	pub fn is_empty(&self) -> bool {
		self.queries.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Query> {
		self.queries.iter()
	}

	/// Pick a query uniformly at random.
	pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Query {
		// Never empty: parse() rejects an empty list
		debug_assert!(!self.is_empty());
		&self.queries[rng.gen_range(0..self.queries.len())]
	}
}

impl fmt::Display for QuerySet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, query) in self.queries.iter().enumerate() {
			if i > 0 {
				f.write_str(",")?;
			}
			write!(f, "{}", query)?;
		}
		Ok(())
	}
}

/// Parse a single `name[:type]` token, splitting on the first colon.
fn parse_token(token: &str) -> Result<Query, QuerySetError> {
	let (name, query_type) = match token.split_once(':') {
		None => (token, QueryType::A),
		Some((name, type_str)) => {
			let query_type = QueryType::parse(type_str).ok_or_else(|| {
				QuerySetError::InvalidRecordType {
					token: token.to_string(),
					record_type: type_str.to_string(),
				}
			})?;
			(name, query_type)
		}
	};
	if name.is_empty() {
		return Err(QuerySetError::EmptyName { token: token.to_string() });
	}
	Ok(Query { name: name.to_string(), query_type })
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::rngs::StdRng;
	use rand::SeedableRng;

	#[test]
	fn test_default_type_is_a() {
		let set = QuerySet::parse(&["example.com"]).unwrap();
		assert_eq!(set.len(), 1);
		let query = set.iter().next().unwrap();
		assert_eq!(query.name, "example.com");
		assert_eq!(query.query_type, QueryType::A);
	}

	#[test]
	fn test_order_preserved_across_values() {
		let set = QuerySet::parse(&[
			"example.com:A,example.com:mx",
			"example.org:AAAA",
			"example.net:txt,example.com:A",
		]).unwrap();
		let rendered: Vec<String> = set.iter().map(|q| q.to_string()).collect();
		assert_eq!(rendered, vec![
			"example.com:A",
			"example.com:MX",
			"example.org:AAAA",
			"example.net:TXT",
			"example.com:A",
		]);
	}

	#[test]
	fn test_splits_on_first_colon_only() {
		let result = QuerySet::parse(&["example.com:A:MX"]);
		assert_eq!(result.unwrap_err(), QuerySetError::InvalidRecordType {
			token: "example.com:A:MX".to_string(),
			record_type: "A:MX".to_string(),
		});
	}

	#[test]
	fn test_invalid_type_names_token() {
		let result = QuerySet::parse(&["good.com:NS,bad.com:SOA,later.com"]);
		let err = result.unwrap_err();
		assert_eq!(err, QuerySetError::InvalidRecordType {
			token: "bad.com:SOA".to_string(),
			record_type: "SOA".to_string(),
		});
		assert!(err.to_string().contains("bad.com:SOA"));
	}

	#[test]
	fn test_empty_type_suffix_rejected() {
		let result = QuerySet::parse(&["example.com:"]);
		assert!(matches!(result, Err(QuerySetError::InvalidRecordType { .. })));
	}

	#[test]
	fn test_empty_name_rejected() {
		let result = QuerySet::parse(&["example.com,,example.org"]);
		assert_eq!(result.unwrap_err(), QuerySetError::EmptyName { token: String::new() });
	}

	#[test]
	fn test_parsed_set_is_never_empty() {
		let set = QuerySet::parse(&["example.com"]).unwrap();
		assert!(!set.is_empty());
		assert_eq!(set.len(), 1);
	}

	#[test]
	fn test_no_values_is_empty_set() {
		let values: Vec<String> = Vec::new();
		assert_eq!(QuerySet::parse(&values).unwrap_err(), QuerySetError::EmptyQuerySet);
	}

	#[test]
	fn test_display_joins_queries() {
		let set = QuerySet::parse(&["a.com,b.com:cname"]).unwrap();
		assert_eq!(set.to_string(), "a.com:A,b.com:CNAME");
	}

	#[test]
	fn test_choose_covers_every_query() {
		let set = QuerySet::parse(&["a.com,b.com,c.com"]).unwrap();
		let mut rng = StdRng::seed_from_u64(7);
		let mut seen = std::collections::HashSet::new();
		for _ in 0..200 {
			seen.insert(set.choose(&mut rng).name.clone());
		}
		assert_eq!(seen.len(), 3);
	}
}
