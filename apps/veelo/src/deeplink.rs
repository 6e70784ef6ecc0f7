use crate::bridge::percent_decode;
use std::path::PathBuf;
use thiserror::Error;

/// The app's reserved URI scheme: `veelo://file?path=<url-encoded-path>`.
pub const SCHEME: &str = "veelo";

#[derive(Debug, Error, PartialEq)]
pub enum DeepLinkError {
    #[error("invalid scheme or action in deep link: {0}")]
    InvalidScheme(String),

    #[error("deep link missing path parameter: {0}")]
    MissingParam(String),

    #[error("deep-linked file does not exist: {0}")]
    FileNotFound(PathBuf),
}

/// Parse a deep-link URI into the file path it names. The same parse path
/// services OS open-url events, second-instance command lines, and the
/// first-instance startup argument.
pub fn parse(uri: &str) -> Result<PathBuf, DeepLinkError> {
    let path = parse_path(uri)?;
    if !path.exists() {
        return Err(DeepLinkError::FileNotFound(path));
    }
    Ok(path)
}

/// Syntax-only half of `parse`, split out so the URI grammar is testable
/// without touching the filesystem.
pub fn parse_path(uri: &str) -> Result<PathBuf, DeepLinkError> {
    let rest = uri
        .strip_prefix(SCHEME)
        .and_then(|r| r.strip_prefix("://"))
        .ok_or_else(|| DeepLinkError::InvalidScheme(uri.to_string()))?;

    let (action, query) = match rest.split_once('?') {
        Some((action, query)) => (action, query),
        None => (rest, ""),
    };
    if action != "file" {
        return Err(DeepLinkError::InvalidScheme(uri.to_string()));
    }

    let encoded = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("path="))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DeepLinkError::MissingParam(uri.to_string()))?;

    // An undecodable value is as good as no value.
    let decoded =
        percent_decode(encoded).ok_or_else(|| DeepLinkError::MissingParam(uri.to_string()))?;
    Ok(PathBuf::from(decoded))
}

/// Scan command-line style arguments for a deep link.
pub fn find_in_args<'a, I: IntoIterator<Item = &'a str>>(args: I) -> Option<&'a str> {
    args.into_iter()
        .find(|arg| arg.starts_with(&format!("{SCHEME}://")))
}
