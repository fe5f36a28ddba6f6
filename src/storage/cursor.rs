//! Opaque continuation tokens for stream listings.
//!
//! A page key encodes the storage key of the last item a listing query
//! evaluated: `stream_id|stream_type|updated_at`. It has no meaning outside
//! repeated calls to the same listing operation. `|` cannot appear inside a
//! field: stream types are validated against it and the other two segments
//! are fixed-alphabet.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{EsError, Result};

const DELIMITER: char = '|';

/// Format a timestamp the way it is stored and compared: RFC 3339 UTC with
/// nanosecond precision, so lexicographic order matches chronological order
/// and encode/decode round-trips losslessly.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// The decoded form of a stream-listing continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPageKey {
    pub stream_id: Uuid,
    pub stream_type: String,
    pub updated_at: DateTime<Utc>,
}

impl StreamPageKey {
    /// Encode into the opaque token handed to callers.
    pub fn encode(&self) -> String {
        format!(
            "{}{DELIMITER}{}{DELIMITER}{}",
            self.stream_id,
            self.stream_type,
            format_ts(self.updated_at),
        )
    }

    /// Decode a caller-supplied token.
    ///
    /// Fails with [`EsError::MalformedCursor`] when the token does not split
    /// into exactly three parts or the id/timestamp segment does not parse.
    pub fn decode(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split(DELIMITER).collect();
        let [id_part, type_part, ts_part] = parts.as_slice() else {
            return Err(EsError::MalformedCursor(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        };

        let stream_id = Uuid::parse_str(id_part)
            .map_err(|e| EsError::MalformedCursor(format!("invalid stream id: {e}")))?;
        let updated_at = parse_ts(ts_part)
            .ok_or_else(|| EsError::MalformedCursor(format!("invalid timestamp: {ts_part}")))?;

        Ok(Self {
            stream_id,
            stream_type: type_part.to_string(),
            updated_at,
        })
    }
}
