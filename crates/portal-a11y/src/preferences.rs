//! Accessibility Preference State
//!
//! User preferences (font size, contrast, motion) merged with system
//! signals, their persistence, and the marker classes they imply on `<body>`.

use std::fmt;
use std::str::FromStr;

use portal_dom::Document;

use crate::{A11yConfig, A11yError, PreferenceStore};

/// Every class owned by [`PreferenceState::apply_classes`]
pub const MARKER_CLASSES: [&str; 8] = [
    "font-normal",
    "font-large",
    "font-extra-large",
    "contrast-normal",
    "contrast-high",
    "reduced-motion",
    "keyboard-navigation",
    "screen-reader-mode",
];

const MOTION_PROPERTIES: [&str; 2] = ["--animation-duration", "--transition-duration"];
const REDUCED_DURATION: &str = "0.01ms";

const FONT_SIZE_FIELD: &str = "fontSize";
const CONTRAST_FIELD: &str = "contrastMode";
const REDUCED_MOTION_FIELD: &str = "reducedMotion";

/// Font scale preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontSize {
    #[default]
    Normal,
    Large,
    ExtraLarge,
}

impl FontSize {
    /// Persisted value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Large => "large",
            Self::ExtraLarge => "extra-large",
        }
    }

    /// Marker class on `<body>`
    pub fn class(&self) -> &'static str {
        match self {
            Self::Normal => "font-normal",
            Self::Large => "font-large",
            Self::ExtraLarge => "font-extra-large",
        }
    }

    /// Spoken label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal (16px)",
            Self::Large => "grande (18px)",
            Self::ExtraLarge => "extra grande (20px)",
        }
    }
}

impl FromStr for FontSize {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "large" => Ok(Self::Large),
            "extra-large" => Ok(Self::ExtraLarge),
            other => Err(A11yError::InvalidPreference {
                field: FONT_SIZE_FIELD,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contrast mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContrastMode {
    #[default]
    Normal,
    High,
}

impl ContrastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Normal => "contrast-normal",
            Self::High => "contrast-high",
        }
    }

    /// Label shown next to the contrast control
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Contraste normal",
            Self::High => "Alto contraste",
        }
    }
}

impl FromStr for ContrastMode {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            other => Err(A11yError::InvalidPreference {
                field: CONTRAST_FIELD,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContrastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit motion choice; only `"true"` and `"false"` are accepted from storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StoredBool(bool);

impl FromStr for StoredBool {
    type Err = A11yError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self(true)),
            "false" => Ok(Self(false)),
            other => Err(A11yError::InvalidPreference {
                field: REDUCED_MOTION_FIELD,
                value: other.to_string(),
            }),
        }
    }
}

/// User-settable preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessibilityPreferences {
    pub font_size: FontSize,
    pub contrast_mode: ContrastMode,
    /// `None` defers to the system signal
    pub reduced_motion: Option<bool>,
}

/// Runtime state: preferences plus detected signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessibilityState {
    pub preferences: AccessibilityPreferences,
    pub system_reduced_motion: bool,
    pub screen_reader_detected: bool,
    pub keyboard_mode_active: bool,
    pub focus_visible: bool,
}

impl Default for AccessibilityState {
    fn default() -> Self {
        Self {
            preferences: AccessibilityPreferences::default(),
            system_reduced_motion: false,
            screen_reader_detected: false,
            keyboard_mode_active: false,
            focus_visible: true,
        }
    }
}

impl AccessibilityState {
    /// Explicit preference if set, else the system signal
    pub fn effective_reduced_motion(&self) -> bool {
        self.preferences.reduced_motion.unwrap_or(self.system_reduced_motion)
    }

    pub fn is_high_contrast(&self) -> bool {
        self.preferences.contrast_mode == ContrastMode::High
    }

    pub fn is_large_font(&self) -> bool {
        self.preferences.font_size != FontSize::Normal
    }

    pub fn font_size_label(&self) -> &'static str {
        self.preferences.font_size.label()
    }

    pub fn contrast_label(&self) -> &'static str {
        self.preferences.contrast_mode.label()
    }

    /// Marker classes implied by this state
    pub fn implied_classes(&self) -> Vec<&'static str> {
        let mut classes = vec![self.preferences.font_size.class()];
        if self.preferences.contrast_mode != ContrastMode::Normal {
            classes.push(self.preferences.contrast_mode.class());
        }
        if self.effective_reduced_motion() {
            classes.push("reduced-motion");
        }
        if self.keyboard_mode_active {
            classes.push("keyboard-navigation");
        }
        if self.screen_reader_detected {
            classes.push("screen-reader-mode");
        }
        classes
    }
}

/// Owner of the runtime state and its persistence
pub struct PreferenceState {
    state: AccessibilityState,
    store: Box<dyn PreferenceStore>,
    font_size_key: String,
    contrast_key: String,
    reduced_motion_key: String,
}

impl PreferenceState {
    pub fn new(config: &A11yConfig, store: Box<dyn PreferenceStore>) -> Self {
        Self {
            state: AccessibilityState::default(),
            store,
            font_size_key: config.storage_key(FONT_SIZE_FIELD),
            contrast_key: config.storage_key(CONTRAST_FIELD),
            reduced_motion_key: config.storage_key(REDUCED_MOTION_FIELD),
        }
    }

    /// Read-only snapshot
    pub fn state(&self) -> AccessibilityState {
        self.state
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    pub fn into_store(self) -> Box<dyn PreferenceStore> {
        self.store
    }

    fn persist(&mut self, key: &str, value: &str) {
        if let Err(err) = self.store.set(key, value) {
            tracing::error!("Failed to persist {}: {}", key, err);
        }
    }

    fn read_entry<T: FromStr<Err = A11yError>>(&self, key: &str) -> Result<Option<T>, A11yError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }

    /// Apply a stored entry if present and valid; log anything else
    fn load_entry<T: FromStr<Err = A11yError>>(&self, key: &str) -> Option<T> {
        match self.read_entry(key) {
            Ok(value) => value,
            Err(A11yError::Storage(err)) => {
                tracing::error!("Failed to read {}: {}", key, err);
                None
            }
            Err(err) => {
                tracing::warn!("Ignoring stored {}: {}", key, err);
                None
            }
        }
    }

    /// Restore persisted preferences. Never fails.
    pub fn load(&mut self) {
        let mut loaded = 0;
        if let Some(size) = self.load_entry::<FontSize>(&self.font_size_key) {
            self.state.preferences.font_size = size;
            loaded += 1;
        }
        if let Some(mode) = self.load_entry::<ContrastMode>(&self.contrast_key) {
            self.state.preferences.contrast_mode = mode;
            loaded += 1;
        }
        if let Some(StoredBool(reduced)) = self.load_entry::<StoredBool>(&self.reduced_motion_key) {
            self.state.preferences.reduced_motion = Some(reduced);
            loaded += 1;
        }
        if loaded > 0 {
            tracing::info!("Loaded accessibility preferences: {:?}", self.state.preferences);
        }
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        tracing::info!("Font size -> {}", size);
        self.state.preferences.font_size = size;
        let key = self.font_size_key.clone();
        self.persist(&key, size.as_str());
    }

    pub fn set_contrast_mode(&mut self, mode: ContrastMode) {
        tracing::info!("Contrast mode -> {}", mode);
        self.state.preferences.contrast_mode = mode;
        let key = self.contrast_key.clone();
        self.persist(&key, mode.as_str());
    }

    /// Flip the effective motion setting into an explicit preference.
    /// Returns the new value.
    pub fn toggle_reduced_motion(&mut self) -> bool {
        let reduced = !self.state.effective_reduced_motion();
        tracing::info!("Reduced motion -> {}", reduced);
        self.state.preferences.reduced_motion = Some(reduced);
        let key = self.reduced_motion_key.clone();
        self.persist(&key, if reduced { "true" } else { "false" });
        reduced
    }

    /// Defaults for the user-settable fields; detected signals are kept
    pub fn reset(&mut self) {
        tracing::info!("Resetting accessibility preferences");
        self.state.preferences = AccessibilityPreferences::default();
        for key in [
            self.font_size_key.clone(),
            self.contrast_key.clone(),
            self.reduced_motion_key.clone(),
        ] {
            if let Err(err) = self.store.remove(&key) {
                tracing::error!("Failed to remove {}: {}", key, err);
            }
        }
    }

    /// System `prefers-reduced-motion` value (initial or changed)
    pub fn set_system_reduced_motion(&mut self, reduced: bool) {
        self.state.system_reduced_motion = reduced;
    }

    /// One-shot: once detected, never cleared
    pub fn mark_screen_reader_detected(&mut self) {
        self.state.screen_reader_detected = true;
    }

    pub fn set_keyboard_mode(&mut self, active: bool) {
        self.state.keyboard_mode_active = active;
    }

    /// Strip every marker class from `<body>` and add back exactly the
    /// implied set. Idempotent.
    pub fn apply_classes(&self, doc: &mut Document) {
        let body = doc.body();
        let implied = self.state.implied_classes();
        if let Some(classes) = doc.class_list_mut(body) {
            classes.remove(&MARKER_CLASSES);
            classes.add(&implied);
        }

        let html = doc.document_element();
        let reduced = self.state.effective_reduced_motion();
        for property in MOTION_PROPERTIES {
            let result = if reduced {
                doc.set_style_property(html, property, REDUCED_DURATION)
            } else {
                doc.remove_style_property(html, property)
            };
            if let Err(err) = result {
                tracing::warn!("Cannot update {}: {}", property, err);
            }
        }
        tracing::debug!("Accessibility classes applied: {:?}", implied);
    }
}

impl fmt::Debug for PreferenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceState")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
