//! EXR conversion configuration types

/// EXR compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExrCompression {
    /// No compression (fastest, largest file)
    None,
    /// Run-length encoding (fast, weak on noisy data)
    Rle,
    /// Deflate, one scan line per block
    Zip1,
    /// Deflate, sixteen scan lines per block (default, same as the OpenEXR library)
    #[default]
    Zip16,
    /// Wavelet compression (slow, best for grainy images)
    Piz,
}

impl ExrCompression {
    /// Parses the names accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "rle" => Some(Self::Rle),
            "zip1" | "zips" => Some(Self::Zip1),
            "zip" | "zip16" => Some(Self::Zip16),
            "piz" => Some(Self::Piz),
            _ => None,
        }
    }
}

/// What a batch does when one file fails to convert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the remaining files on the first failure
    #[default]
    FailFast,
    /// Keep converting and report every failure at the end
    ContinueOnError,
}

/// Configuration for RW2 to EXR conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Compression method to use
    pub compression: ExrCompression,
    /// Batch behavior after a per-file failure
    pub failure_policy: FailurePolicy,
    /// Delete the output file when encoding it fails
    pub remove_partial_output: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: ExrCompression::Zip16,
            failure_policy: FailurePolicy::FailFast,
            remove_partial_output: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    compression: Option<ExrCompression>,
    failure_policy: Option<FailurePolicy>,
    remove_partial_output: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, compression: ExrCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    pub fn remove_partial_output(mut self, remove: bool) -> Self {
        self.remove_partial_output = Some(remove);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            compression: self.compression.unwrap_or(default.compression),
            failure_policy: self.failure_policy.unwrap_or(default.failure_policy),
            remove_partial_output: self
                .remove_partial_output
                .unwrap_or(default.remove_partial_output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_unset_fields_from_default() {
        let config = ConversionConfig::builder()
            .failure_policy(FailurePolicy::ContinueOnError)
            .build();

        assert_eq!(config.failure_policy, FailurePolicy::ContinueOnError);
        assert_eq!(config.compression, ExrCompression::Zip16);
        assert!(config.remove_partial_output);
    }

    #[test]
    fn test_builder_overrides_every_field() {
        let config = ConversionConfig::builder()
            .compression(ExrCompression::Piz)
            .failure_policy(FailurePolicy::FailFast)
            .remove_partial_output(false)
            .build();

        assert_eq!(config.compression, ExrCompression::Piz);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert!(!config.remove_partial_output);
    }

    #[test]
    fn test_compression_names_parse_case_insensitively() {
        assert_eq!(ExrCompression::from_name("ZIP"), Some(ExrCompression::Zip16));
        assert_eq!(ExrCompression::from_name("zip1"), Some(ExrCompression::Zip1));
        assert_eq!(ExrCompression::from_name("none"), Some(ExrCompression::None));
        assert_eq!(ExrCompression::from_name("b44"), None);
    }
}
