//! Domain library for the URL Shortener.
//!
//! Holds the domain types, ports (traits), and error definitions for mapping
//! long URLs to short codes. Keep adapters and IO concerns out of this crate;
//! the only dependencies are the hash and regex primitives the core needs.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::Serialize;

/// Number of characters in every short code.
pub const CODE_LEN: usize = 6;

/// Public identifier of a mapping. Always exactly `CODE_LEN` characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ShortCode(String);

impl ShortCode {
    /// Accept a code supplied by a caller for lookup.
    ///
    /// Only the length is checked here. A six character code that was never
    /// produced by shortening simply resolves to nothing.
    pub fn parse<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        let len = val.chars().count();
        if len != CODE_LEN {
            return Err(CoreError::InvalidCode(format!(
                "expected {} characters, got {}",
                CODE_LEN, len
            )));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored short code → original URL pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UrlMapping {
    pub short_code: ShortCode,
    pub original_url: String,
}

impl UrlMapping {
    pub fn new(short_code: ShortCode, original_url: impl Into<String>) -> Self {
        Self {
            short_code,
            original_url: original_url.into(),
        }
    }
}

/// Short code derivation; implementations must be deterministic in `url`.
pub trait CodeGenerator: Send + Sync {
    fn code_for(&self, url: &str) -> ShortCode;
}

/// Repository port for persisting and loading mappings.
pub trait MappingRepository: Send + Sync {
    fn get(&self, code: &ShortCode) -> Result<Option<UrlMapping>, CoreError>;
    /// Insert or replace. An existing row under the same code is overwritten
    /// whether or not it held the same URL.
    fn upsert(&self, mapping: &UrlMapping) -> Result<(), CoreError>;
    /// Number of stored mappings.
    fn count(&self) -> Result<usize, CoreError>;
}

/// Core domain errors (no external error crates to keep deps small).
#[derive(Debug)]
pub enum CoreError {
    /// Nothing was submitted, or only the bare scheme placeholder.
    EmptyUrl,
    InvalidUrl(String),
    InvalidCode(String),
    /// Well-formed code with no stored mapping. `LinkService::resolve` reports
    /// this as `Ok(None)`; HTTP surfaces raise it to build their 404.
    NotFound,
    StorageUnavailable(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::EmptyUrl => write!(f, "empty url"),
            CoreError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            CoreError::InvalidCode(msg) => write!(f, "invalid short code: {}", msg),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::StorageUnavailable(msg) => write!(f, "storage unavailable: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod code;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_code_parse_accepts_six_chars() {
        let c = ShortCode::parse("abc123").expect("valid code");
        assert_eq!(c.as_str(), "abc123");
        assert_eq!(c.to_string(), "abc123");
    }

    #[test]
    fn short_code_rejects_other_lengths() {
        for bad in ["", "abc12", "abc1234", "0000000000"] {
            let err = ShortCode::parse(bad).unwrap_err();
            assert!(matches!(err, CoreError::InvalidCode(_)), "{bad:?}");
        }
    }

    #[test]
    fn short_code_length_counts_characters() {
        // six characters, more than six bytes
        assert!(ShortCode::parse("ééééé1").is_ok());
    }

    #[test]
    fn error_display() {
        assert_eq!(CoreError::NotFound.to_string(), "not found");
        assert_eq!(CoreError::EmptyUrl.to_string(), "empty url");
        assert_eq!(
            CoreError::StorageUnavailable("disk".into()).to_string(),
            "storage unavailable: disk"
        );
    }
}
