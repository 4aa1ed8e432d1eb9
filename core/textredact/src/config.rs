use std::collections::HashMap;
use std::env;

use thiserror::Error;

use crate::codec::DEFAULT_JPEG_QUALITY;

/// Why the service configuration could not be loaded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value {value:?} for {var}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The staging bucket is also the source bucket.
    #[error("processing bucket {0} must differ from the source bucket")]
    RecursiveStaging(String),
}

/// Settings for [`crate::RedactionService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bucket uploads arrive in. When set, events for any other bucket are refused.
    pub source_bucket: Option<String>,
    /// Staging bucket for redacted output. Uploads here never trigger processing.
    pub processing_bucket: String,
    /// Destination identifier handed to the notifier.
    pub notification_topic: String,
    /// JPEG quality for re-encoded uploads (1–100).
    pub jpeg_quality: u8,
    /// Send a confirmation when an upload had nothing to redact.
    pub notify_compliant: bool,
}

impl ServiceConfig {
    /// Defaults for everything but the two required settings.
    pub fn new(processing_bucket: impl Into<String>, notification_topic: impl Into<String>) -> Self {
        Self {
            source_bucket: None,
            processing_bucket: processing_bucket.into(),
            notification_topic: notification_topic.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            notify_compliant: true,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from a map instead of the environment (useful for testing).
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let processing_bucket =
            get("PROCESSING_BUCKET_NAME").ok_or(ConfigError::Missing("PROCESSING_BUCKET_NAME"))?;
        let notification_topic = get("NOTIFICATION_TOPIC")
            .or_else(|| get("SNS_TOPIC_ARN"))
            .ok_or(ConfigError::Missing("NOTIFICATION_TOPIC"))?;

        let jpeg_quality = match get("JPEG_QUALITY") {
            None => DEFAULT_JPEG_QUALITY,
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|q| (1..=100).contains(q))
                .ok_or(ConfigError::Invalid {
                    var: "JPEG_QUALITY",
                    value: raw,
                })?,
        };

        let notify_compliant = match get("NOTIFY_COMPLIANT") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "NOTIFY_COMPLIANT",
                value: raw,
            })?,
        };

        let config = Self {
            source_bucket: get("SOURCE_BUCKET_NAME"),
            processing_bucket,
            notification_topic,
            jpeg_quality,
            notify_compliant,
        };
        config.validate()?;
        Ok(config)
    }

    /// Staging into the bucket that triggers processing would loop forever.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_bucket.as_deref() == Some(self.processing_bucket.as_str()) {
            return Err(ConfigError::RecursiveStaging(self.processing_bucket.clone()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid {
                var: "JPEG_QUALITY",
                value: self.jpeg_quality.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
