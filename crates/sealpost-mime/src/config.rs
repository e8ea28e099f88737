//! Builder configuration types.

/// Media type used for containers created without an explicit one.
pub const DEFAULT_MEDIATYPE: &str = "multipart/mixed";

/// How much the builder reports about its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No diagnostics beyond errors.
    #[default]
    Quiet,
    /// Summaries at `info` level.
    Verbose,
    /// Summaries plus a tree dump before writing.
    Debug,
}

impl Verbosity {
    /// Maps a numeric level: `0` is quiet, up to `10` verbose, above
    /// that debug.
    #[must_use]
    pub const fn from_level(level: u32) -> Self {
        match level {
            0 => Self::Quiet,
            1..=10 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Checks whether summaries are logged.
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Checks whether the tree is dumped before writing.
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// MIME builder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Media type for `add_container(None)`.
    pub default_mediatype: String,
    /// Diagnostic level.
    pub verbosity: Verbosity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mediatype: DEFAULT_MEDIATYPE.to_string(),
            verbosity: Verbosity::Quiet,
        }
    }
}

impl Config {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    default_mediatype: Option<String>,
    verbosity: Verbosity,
}

impl ConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the media type used for containers created without one.
    #[must_use]
    pub fn default_mediatype(mut self, mediatype: impl Into<String>) -> Self {
        self.default_mediatype = Some(mediatype.into());
        self
    }

    /// Sets the diagnostic level.
    #[must_use]
    pub const fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            default_mediatype: self
                .default_mediatype
                .unwrap_or_else(|| DEFAULT_MEDIATYPE.to_string()),
            verbosity: self.verbosity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::from_level(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_level(1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_level(10), Verbosity::Verbose);
        assert_eq!(Verbosity::from_level(11), Verbosity::Debug);
        assert!(!Verbosity::Quiet.is_verbose());
        assert!(Verbosity::Debug.is_verbose());
        assert!(!Verbosity::Verbose.is_debug());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_mediatype, "multipart/mixed");
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .default_mediatype("multipart/encrypted")
            .verbosity(Verbosity::Debug)
            .build();

        assert_eq!(config.default_mediatype, "multipart/encrypted");
        assert_eq!(config.verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_config_builder_default_mediatype() {
        let config = Config::builder().verbosity(Verbosity::Verbose).build();
        assert_eq!(config.default_mediatype, DEFAULT_MEDIATYPE);
    }
}
