//! Accessibility Core Configuration

use serde::{Deserialize, Serialize};

/// Timing and behaviour knobs of the accessibility core.
///
/// All durations are milliseconds of virtual time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct A11yConfig {
    /// Lifetime of an announcement when the caller gives none
    pub announcement_timeout_ms: u64,

    /// Lifetime of error announcements
    pub error_timeout_ms: u64,

    /// Pause between two polite announcements
    pub queue_settle_ms: u64,

    /// Wait between a route change and focus resolution
    pub navigation_settle_ms: u64,

    /// Dialog insertion: mount delay, then settle delay before focusing
    pub dialog_mount_ms: u64,
    pub dialog_settle_ms: u64,

    /// Live region insertion: mount delay, then settle delay before focusing
    pub live_region_mount_ms: u64,
    pub live_region_settle_ms: u64,

    /// Inactivity after which the type-ahead buffer is cleared
    pub typeahead_reset_ms: u64,

    /// Arrow navigation announces "Elemento N de M" above this many items
    pub arrow_announce_threshold: usize,

    /// Delay of the welcome announcement after mount
    pub welcome_delay_ms: u64,

    /// Prefix of the persisted preference keys
    pub storage_key_prefix: String,

    /// Install Alt+1..4, Ctrl+K and Ctrl+Home on mount
    pub enable_global_shortcuts: bool,

    /// Handle Escape as part of the global shortcuts
    pub enable_escape_handling: bool,
}

impl Default for A11yConfig {
    fn default() -> Self {
        Self {
            announcement_timeout_ms: 3000,
            error_timeout_ms: 5000,
            queue_settle_ms: 100,
            navigation_settle_ms: 100,
            dialog_mount_ms: 100,
            dialog_settle_ms: 50,
            live_region_mount_ms: 300,
            live_region_settle_ms: 200,
            typeahead_reset_ms: 1000,
            arrow_announce_threshold: 3,
            welcome_delay_ms: 1000,
            storage_key_prefix: "accessibility_".to_string(),
            enable_global_shortcuts: true,
            enable_escape_handling: true,
        }
    }
}

impl A11yConfig {
    /// Full storage key for a preference field (`fontSize` -> `accessibility_fontSize`)
    pub fn storage_key(&self, field: &str) -> String {
        format!("{}{}", self.storage_key_prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = A11yConfig::default();
        assert_eq!(config.announcement_timeout_ms, 3000);
        assert_eq!(config.error_timeout_ms, 5000);
        assert_eq!(config.storage_key("fontSize"), "accessibility_fontSize");
    }

    #[cfg(feature = "json-store")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config: A11yConfig =
            serde_json::from_str(r#"{"queue_settle_ms": 250, "enable_global_shortcuts": false}"#)
                .unwrap();
        assert_eq!(config.queue_settle_ms, 250);
        assert!(!config.enable_global_shortcuts);
        assert_eq!(config.typeahead_reset_ms, 1000);
    }
}
