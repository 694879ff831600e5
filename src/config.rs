use serde::Deserialize;

/// Construction-time options for a [`crate::SourceExtractor`].
///
/// The library never reads files or environment variables; embedding
/// applications deserialize this from their own config layer or build it in
/// code. Unset fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Hard cap on input size. Sources above it are rejected with
    /// `FILE_TOO_LARGE` before any parsing.
    pub max_file_size_bytes: usize,
    /// Per-file deadline. On expiry the call aborts with `PARSE_TIMEOUT`
    /// and no partial result.
    pub parse_timeout_ms: u64,
    /// Emit entities with no extractable name as `"<anonymous>"` instead of
    /// skipping them.
    pub include_anonymous: bool,
    /// Populate `documentation` metadata from doc comments.
    pub extract_documentation: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            max_file_size_bytes: 5 * 1024 * 1024,
            parse_timeout_ms: 30_000,
            include_anonymous: false,
            extract_documentation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractorConfig::default();
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.parse_timeout_ms, 30_000);
        assert!(!config.include_anonymous);
        assert!(config.extract_documentation);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: ExtractorConfig =
            serde_json::from_str(r#"{"parse_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.parse_timeout_ms, 500);
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024);
        assert!(config.extract_documentation);
    }
}
