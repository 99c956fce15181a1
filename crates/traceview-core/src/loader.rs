//! One-shot loading of the trace collection

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::models::Trace;

/// Where the trace collection comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceSource {
    /// Local JSON file
    File(PathBuf),
    /// `http://` or `https://` resource
    Url(String),
}

impl TraceSource {
    /// Interpret a CLI/config value as a URL or a path
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for TraceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch and parse the collection. Any failure is a [`Error::Load`];
/// nothing is retried.
pub async fn load_traces(source: &TraceSource) -> Result<Vec<Trace>> {
    let name = source.to_string();
    let bytes = match source {
        TraceSource::File(path) => tokio::fs::read(path)
            .await
            .map_err(|e| Error::load(&name, e))?,
        TraceSource::Url(url) => {
            let response = reqwest::get(url).await.map_err(|e| Error::load(&name, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::load(&name, format!("HTTP {}", status.as_u16())));
            }
            response
                .bytes()
                .await
                .map_err(|e| Error::load(&name, e))?
                .to_vec()
        }
    };

    let traces = parse_traces(&name, &bytes)?;
    info!(source = %name, count = traces.len(), "loaded traces");
    Ok(traces)
}

/// Parse a JSON array of traces
pub fn parse_traces(source_name: &str, bytes: &[u8]) -> Result<Vec<Trace>> {
    serde_json::from_slice(bytes).map_err(|e| Error::load(source_name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            TraceSource::parse("https://example.com/traces.json"),
            TraceSource::Url("https://example.com/traces.json".into())
        );
        assert_eq!(
            TraceSource::parse("data/traces.json"),
            TraceSource::File(PathBuf::from("data/traces.json"))
        );
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let err = parse_traces("inline", br#"{"id": "t"}"#).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().starts_with("Failed to load traces from inline"));
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_traces("inline", b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let source = TraceSource::File(PathBuf::from("/definitely/not/here.json"));
        let err = tokio_test::block_on(load_traces(&source)).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }
}
