//! Parsing for feed URNs such as `sr:sport:1` and `sr:match:12345`.

use anyhow::{anyhow, Result};
use std::fmt;

/// A parsed URN: `{prefix}:{kind}:{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Urn {
    pub prefix: String,
    pub kind: String,
    pub id: i64,
}

impl Urn {
    /// Parse a URN string. The id segment must be a positive integer.
    pub fn parse(urn: &str) -> Result<Self> {
        let mut parts = urn.split(':');
        let (prefix, kind, id) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(k), Some(i), None) if !p.is_empty() && !k.is_empty() => (p, k, i),
            _ => return Err(anyhow!("Malformed URN: {}", urn)),
        };

        let id: i64 = id
            .parse()
            .map_err(|_| anyhow!("Malformed URN id segment: {}", urn))?;
        if id < 0 {
            return Err(anyhow!("Malformed URN id segment: {}", urn));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            kind: kind.to_string(),
            id,
        })
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.prefix, self.kind, self.id)
    }
}
