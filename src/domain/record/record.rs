//! Record value objects
//!
//! A record is one timestamp-keyed line in a record file, encoded as
//! `"<timestamp>,<payload>"`. The timestamp is milliseconds since the epoch
//! and is the unique key within a file. Summary payloads pack a title and a
//! body joined by `|`.

/// One timestamp-keyed line of a record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: u64,
    pub payload: String,
}

impl Record {
    /// Create a new record
    pub fn new(timestamp: u64, payload: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }

    /// Parse one line of a record file.
    ///
    /// Returns `None` for blank lines and for lines whose timestamp prefix
    /// is missing or non-numeric; readers drop those silently.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.is_empty() {
            return None;
        }
        let (key, payload) = line.split_once(',')?;
        let timestamp = key.parse().ok()?;
        Some(Self {
            timestamp,
            payload: payload.to_string(),
        })
    }

    /// Encode as a record file line (no trailing newline)
    pub fn to_line(&self) -> String {
        format!("{},{}", self.timestamp, self.payload)
    }
}

/// A generated summary: short title plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub title: String,
    pub body: String,
}

impl Summary {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Encode as a record payload: `"<title>|<body>"`
    pub fn to_payload(&self) -> String {
        format!("{}|{}", self.title, self.body)
    }

    /// Split a record payload on the first `|`.
    ///
    /// Payloads without a separator are treated as body-only.
    pub fn from_payload(payload: &str) -> Self {
        match payload.split_once('|') {
            Some((title, body)) => Self::new(title, body),
            None => Self::new("", payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_line() {
        let record = Record::parse("1700000000000,hello world").unwrap();
        assert_eq!(record.timestamp, 1700000000000);
        assert_eq!(record.payload, "hello world");
    }

    #[test]
    fn parse_keeps_commas_in_payload() {
        let record = Record::parse("100,a,b,c").unwrap();
        assert_eq!(record.payload, "a,b,c");
    }

    #[test]
    fn parse_trims_trailing_whitespace() {
        let record = Record::parse("100,payload \r").unwrap();
        assert_eq!(record.payload, "payload");
    }

    #[test]
    fn parse_rejects_blank_line() {
        assert!(Record::parse("").is_none());
        assert!(Record::parse("   ").is_none());
    }

    #[test]
    fn parse_rejects_missing_or_bad_key() {
        assert!(Record::parse("no comma here").is_none());
        assert!(Record::parse(",orphan payload").is_none());
        assert!(Record::parse("abc,payload").is_none());
        assert!(Record::parse("-5,payload").is_none());
    }

    #[test]
    fn line_round_trip() {
        let record = Record::new(1700000000000, "Title|Body text");
        let reread = Record::parse(&record.to_line()).unwrap();
        assert_eq!(reread, record);

        let summary = Summary::from_payload(&reread.payload);
        assert_eq!(summary.title, "Title");
        assert_eq!(summary.body, "Body text");
    }

    #[test]
    fn summary_payload_round_trip() {
        let summary = Summary::new("Morning standup", "Discussed the release.");
        let parsed = Summary::from_payload(&summary.to_payload());
        assert_eq!(parsed, summary);
    }

    #[test]
    fn summary_splits_on_first_separator_only() {
        let summary = Summary::from_payload("Title|body with | pipe");
        assert_eq!(summary.title, "Title");
        assert_eq!(summary.body, "body with | pipe");
    }

    #[test]
    fn summary_without_separator_is_body_only() {
        let summary = Summary::from_payload("just text");
        assert_eq!(summary.title, "");
        assert_eq!(summary.body, "just text");
    }
}
