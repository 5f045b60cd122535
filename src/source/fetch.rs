use anyhow::{Context, Result};
use tracing::{debug, info};

pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Loads the csv from a local file path or downloads it over HTTP.
#[tracing::instrument]
pub fn read_source(location: &str) -> Result<Vec<u8>> {
    let bytes = if is_url(location) {
        fetch_bytes(location)?
    } else {
        std::fs::read(location).with_context(|| format!("could not read csv file {}", location))?
    };
    debug!(bytes = bytes.len(), "source loaded");
    Ok(bytes)
}

/// blocking GET, non-success status codes are errors
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    info!(url, "downloading");
    let resp = reqwest::blocking::get(url)
        .with_context(|| format!("could not download {}", url))?
        .error_for_status()
        .with_context(|| format!("download of {} failed", url))?;
    let bytes = resp
        .bytes()
        .with_context(|| format!("could not read the body of {}", url))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://data.ca.gov/x.csv"));
        assert!(is_url("http://localhost/x.csv"));
        assert!(!is_url("./nyt-data/us-states.csv"));
    }

    #[test]
    fn test_read_local_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"date,state\n").unwrap();
        let bytes = read_source(f.path().to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"date,state\n");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_source("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
