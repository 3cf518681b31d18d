//! View model configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`ViewModel`](crate::ViewModel).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewModelConfig {
    /// Diagnostic name used in logs and errors.
    pub name: String,
    /// Buffered batches per change-stream receiver before it lags.
    pub change_capacity: usize,
    /// Buffered events per error-stream receiver before it lags.
    pub error_capacity: usize,
    /// Whether reported errors capture a backtrace.
    pub capture_backtraces: bool,
}

impl Default for ViewModelConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl ViewModelConfig {
    /// Standard configuration for general use.
    pub fn standard() -> Self {
        Self {
            name: "view_model".to_string(),
            change_capacity: 256,
            error_capacity: 64,
            capture_backtraces: true,
        }
    }

    /// Minimal configuration for short-lived or high-volume view models.
    pub fn minimal() -> Self {
        Self {
            name: "view_model".to_string(),
            change_capacity: 16,
            error_capacity: 4,
            capture_backtraces: false,
        }
    }

    /// Set the diagnostic name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ViewModelConfig = toml::from_str(
            r#"
            name = "checkout"
            change_capacity = 32
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "checkout");
        assert_eq!(config.change_capacity, 32);
        assert_eq!(config.error_capacity, 64);
        assert!(config.capture_backtraces);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ViewModelConfig::default(), ViewModelConfig::standard());
        let minimal = ViewModelConfig::minimal().named("list");
        assert_eq!(minimal.name, "list");
        assert!(!minimal.capture_backtraces);
    }
}
