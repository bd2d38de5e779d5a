//! Harness configuration.

use termcolor::ColorChoice;
use thiserror::Error;

use crate::error_log::{DEFAULT_MESSAGE_SPACE, ENTRY_HEADER, SAFETY_MARGIN};
use crate::output::{Output, StdoutOutput};
use crate::registry::Registry;
use crate::runner::{OutputMode, Runner};

/// Smallest message space that can hold one record and its margin.
pub const MIN_MESSAGE_SPACE: usize = ENTRY_HEADER + SAFETY_MARGIN;

/// Errors reported by [`HarnessConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("message space of {bytes} bytes is below the minimum of {minimum}")]
    MessageSpaceTooSmall { bytes: usize, minimum: usize },
}

/// Configuration for registries and runners.
///
/// Defaults:
/// - 10 KiB of message space per fixture
/// - `Normal` output
/// - colours when standard output supports them
///
/// # Example
///
/// ```rust
/// use simpletest::{HarnessConfig, OutputMode};
///
/// let config = HarnessConfig::new()
///     .message_space(4096)
///     .output_mode(OutputMode::Verbose)
///     .colors(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    message_space: usize,
    output_mode: OutputMode,
    colors: bool,
}

impl HarnessConfig {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self {
            message_space: DEFAULT_MESSAGE_SPACE,
            output_mode: OutputMode::Normal,
            colors: true,
        }
    }

    /// Sets the bytes of failure text kept per fixture.
    pub fn message_space(mut self, bytes: usize) -> Self {
        self.message_space = bytes;
        self
    }

    /// Sets the verbosity of run reports.
    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Enables or disables coloured status lines.
    pub fn colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }

    /// Configured bytes of failure text per fixture.
    pub fn message_space_bytes(&self) -> usize {
        self.message_space
    }

    /// Configured output mode.
    pub fn mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Returns true if status lines are coloured.
    pub fn uses_colors(&self) -> bool {
        self.colors
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_space < MIN_MESSAGE_SPACE {
            return Err(ConfigError::MessageSpaceTooSmall {
                bytes: self.message_space,
                minimum: MIN_MESSAGE_SPACE,
            });
        }
        Ok(())
    }

    /// An empty registry using the configured message space.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        self.validate()?;
        Ok(Registry::new().with_message_space(self.message_space))
    }

    /// A runner that reports to standard output.
    pub fn build_runner(&self) -> Runner<StdoutOutput> {
        let choice = if self.colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        self.build_runner_with(StdoutOutput::with_color_choice(choice))
    }

    /// A runner that reports to `output`.
    pub fn build_runner_with<O: Output>(&self, output: O) -> Runner<O> {
        Runner::new(self.output_mode, output)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferOutput;

    #[test]
    fn config_default_values() {
        let config = HarnessConfig::default();
        assert_eq!(config.message_space_bytes(), DEFAULT_MESSAGE_SPACE);
        assert_eq!(config.mode(), OutputMode::Normal);
        assert!(config.uses_colors());
    }

    #[test]
    fn config_builder_chaining() {
        let config = HarnessConfig::new()
            .message_space(512)
            .output_mode(OutputMode::Silent)
            .colors(false);
        assert_eq!(config.message_space_bytes(), 512);
        assert_eq!(config.mode(), OutputMode::Silent);
        assert!(!config.uses_colors());
    }

    #[test]
    fn config_rejects_tiny_message_space() {
        let config = HarnessConfig::new().message_space(MIN_MESSAGE_SPACE - 1);
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::MessageSpaceTooSmall {
                bytes: MIN_MESSAGE_SPACE - 1,
                minimum: MIN_MESSAGE_SPACE
            }
        );
        assert!(config.build_registry().is_err());
        assert!(HarnessConfig::new().message_space(MIN_MESSAGE_SPACE).validate().is_ok());
    }

    #[test]
    fn config_builds_registry_and_runner() {
        let config = HarnessConfig::new()
            .message_space(2048)
            .output_mode(OutputMode::Verbose);
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.message_space(), 2048);
        let runner = config.build_runner_with(BufferOutput::new());
        assert_eq!(runner.mode(), OutputMode::Verbose);
    }
}
