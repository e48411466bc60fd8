//! Portal Accessibility
//!
//! Accessibility coordination core of the educational resources portal.
//!
//! Features:
//! - Screen-reader announcements through polite/assertive live regions
//! - Focus placement after navigation and dynamic content insertion
//! - Global shortcuts, Escape handling, arrow and type-ahead navigation
//! - Persisted display preferences applied as body marker classes
//!
//! # Example
//! ```rust,ignore
//! use portal_a11y::{A11yConfig, A11yContext, MemoryStore, SystemSignals};
//!
//! let mut ctx = A11yContext::new(A11yConfig::default(), Box::new(MemoryStore::new()));
//! ctx.mount(&mut doc, &SystemSignals::default());
//! ctx.on_route_changed("/inicio", "/recursos");
//! ctx.advance(&mut doc, 100);
//! ```

mod announcer;
mod config;
mod context;
mod focus;
mod keyboard;
pub mod messages;
mod preferences;
mod shell;
mod storage;
pub mod timer;

pub use announcer::{
    AnnounceOptions, Announcement, AnnouncementId, Announcer, AnnouncerStats, Category, Priority,
    ASSERTIVE_REGION_ID, POLITE_REGION_ID,
};
pub use config::A11yConfig;
pub use context::{A11yContext, SystemSignals};
pub use focus::{FocusCoordinator, FocusElementOptions, SkipTarget, Target};
pub use keyboard::{
    shortcut_table, ArrowNavOptions, KeyEvent, KeyboardDispatcher, KeyboardShortcut, KeyboardState,
    ListenerHandle, Orientation, PointerKind, ShortcutAction, ShortcutBinding,
    DEFAULT_ITEM_SELECTOR, DEFAULT_TYPEAHEAD_SELECTOR,
};
pub use preferences::{
    AccessibilityPreferences, AccessibilityState, ContrastMode, FontSize, PreferenceState,
    MARKER_CLASSES,
};
pub use shell::{ShellHost, StaticShell};
#[cfg(feature = "json-store")]
pub use storage::JsonFileStore;
pub use storage::{MemoryStore, PreferenceStore, StorageError};
pub use timer::TimerTask;

/// Accessibility error
#[derive(Debug, thiserror::Error)]
pub enum A11yError {
    #[error("Invalid {field} value '{value}'")]
    InvalidPreference { field: &'static str, value: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
