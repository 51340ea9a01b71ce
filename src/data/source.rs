//! CSV Source Module
//! Where raw collision CSV bytes come from.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("reading body of {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Supplier of raw CSV content.
pub trait CsvSource: Send + Sync {
    /// Human readable origin, used in logs and status messages.
    fn describe(&self) -> String;

    /// Header plus at most `max_rows` data records.
    fn fetch(&self, max_rows: usize) -> Result<Vec<u8>, SourceError>;
}

/// Copy the header and up to `max_rows` CSV records from `reader`, then stop.
///
/// A newline inside a quoted field does not end a record.
pub fn read_records<R: Read>(reader: R, max_rows: usize) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(reader);
    let mut out = Vec::new();
    let mut line = Vec::new();
    let mut in_quotes = false;
    let mut records = 0usize;

    while records <= max_rows {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let quotes = line.iter().filter(|&&b| b == b'"').count();
        in_quotes ^= quotes % 2 == 1;
        out.extend_from_slice(&line);
        if !in_quotes {
            records += 1;
        }
    }
    Ok(out)
}

/// Blocking HTTP GET against a fixed URL, with timeout and bounded retry.
pub struct HttpCsvSource {
    url: String,
    client: reqwest::blocking::Client,
    retries: u32,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self, SourceError> {
        let url = url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(Self {
            url,
            client,
            retries,
        })
    }

    fn fetch_once(&self, max_rows: usize) -> Result<Vec<u8>, SourceError> {
        let http_err = |source| SourceError::Http {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        // Stop reading once enough rows arrived.
        read_records(response, max_rows).map_err(|source| SourceError::Read {
            url: self.url.clone(),
            source,
        })
    }
}

impl CsvSource for HttpCsvSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self, max_rows: usize) -> Result<Vec<u8>, SourceError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(max_rows) {
                Ok(body) => {
                    debug!(url = %self.url, bytes = body.len(), "fetched csv");
                    return Ok(body);
                }
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    warn!(url = %self.url, attempt, error = %err, "csv fetch failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// CSV content held in memory. Counts how often it is fetched.
pub struct StaticCsvSource {
    content: Vec<u8>,
    fetches: AtomicUsize,
}

impl StaticCsvSource {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl CsvSource for StaticCsvSource {
    fn describe(&self) -> String {
        format!("in-memory csv ({} bytes)", self.content.len())
    }

    fn fetch(&self, max_rows: usize) -> Result<Vec<u8>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        read_records(self.content.as_slice(), max_rows).map_err(|source| SourceError::Read {
            url: self.describe(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_source_counts_fetches() {
        let source = StaticCsvSource::new("a,b\n1,2\n");
        assert_eq!(source.fetch_count(), 0);
        assert_eq!(source.fetch(10).unwrap(), b"a,b\n1,2\n".to_vec());
        source.fetch(10).unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn test_read_records_stops_after_max_rows() {
        let csv = "a,b\n1,2\n3,4\n5,6\n";
        let body = read_records(csv.as_bytes(), 2).unwrap();
        assert_eq!(body, b"a,b\n1,2\n3,4\n".to_vec());

        let all = read_records(csv.as_bytes(), 100).unwrap();
        assert_eq!(all, csv.as_bytes().to_vec());
    }

    #[test]
    fn test_read_records_keeps_quoted_newlines_in_one_record() {
        let csv = "a,b\n\"first\nline\",2\n3,4\n";
        let body = read_records(csv.as_bytes(), 1).unwrap();
        assert_eq!(body, b"a,b\n\"first\nline\",2\n".to_vec());
    }

    #[test]
    fn test_http_source_unreachable_host_fails() {
        // Port 9 on localhost is the discard service, normally closed.
        let source =
            HttpCsvSource::new("http://127.0.0.1:9/collisions.csv", Duration::from_millis(500), 1)
                .unwrap();
        let err = source.fetch(10).unwrap_err();
        assert!(matches!(err, SourceError::Http { .. }));
    }
}
