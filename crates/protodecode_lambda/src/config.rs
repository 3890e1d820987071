pub const BUCKET_NAME_VAR: &str = "BUCKET_NAME";
pub const OUTPUT_KEY_PREFIX_VAR: &str = "OUTPUT_KEY_PREFIX";

/// Process-wide settings, read once before the runtime starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformConfig {
    pub bucket: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

impl TransformConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bucket = lookup(BUCKET_NAME_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(BUCKET_NAME_VAR))?;
        let key_prefix = lookup(OUTPUT_KEY_PREFIX_VAR).unwrap_or_default();

        Ok(Self { bucket, key_prefix })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn reads_bucket_and_defaults_prefix_to_empty() {
        let config = TransformConfig::from_lookup(lookup_from(&[("BUCKET_NAME", "decoded")]))
            .expect("config should load");

        assert_eq!(
            config,
            TransformConfig {
                bucket: "decoded".to_string(),
                key_prefix: String::new(),
            }
        );
    }

    #[test]
    fn reads_optional_prefix() {
        let config = TransformConfig::from_lookup(lookup_from(&[
            ("BUCKET_NAME", "decoded"),
            ("OUTPUT_KEY_PREFIX", "kinesis/demo"),
        ]))
        .expect("config should load");

        assert_eq!(config.key_prefix, "kinesis/demo");
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let error = TransformConfig::from_lookup(lookup_from(&[]))
            .expect_err("bucket is required");
        assert_eq!(error, ConfigError::Missing("BUCKET_NAME"));
        assert_eq!(error.to_string(), "BUCKET_NAME must be configured");
    }

    #[test]
    fn blank_bucket_is_rejected() {
        let error = TransformConfig::from_lookup(lookup_from(&[("BUCKET_NAME", "  ")]))
            .expect_err("blank bucket is rejected");
        assert_eq!(error, ConfigError::Missing("BUCKET_NAME"));
    }
}
