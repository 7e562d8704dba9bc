pub const OUTPUT_BUCKET_ENV: &str = "OUTPUT_BUCKET";

/// Process-wide copy settings, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyConfig {
    pub output_bucket: String,
}

impl CopyConfig {
    pub fn new(output_bucket: impl Into<String>) -> Self {
        Self {
            output_bucket: output_bucket.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// An unset output bucket resolves to the empty string.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            output_bucket: lookup(OUTPUT_BUCKET_ENV).unwrap_or_default(),
        }
    }

    pub fn has_output_bucket(&self) -> bool {
        !self.output_bucket.is_empty()
    }
}
