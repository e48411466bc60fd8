//! Accessibility context
//!
//! Owns every component and the timer queue. The host forwards route
//! changes, content insertions, key and pointer events, and advances the
//! virtual clock; the context dispatches due timers to their owners.

use portal_dom::{Document, NodeId};

use crate::keyboard::{KeyEnv, KeyboardDispatcher};
use crate::timer::{TimerQueue, TimerScope, TimerStats};
use crate::{
    messages, A11yConfig, AccessibilityState, AnnounceOptions, AnnouncementId, Announcer,
    ArrowNavOptions, ContrastMode, FocusCoordinator, FocusElementOptions, FontSize, KeyEvent,
    KeyboardState, ListenerHandle, PointerKind, PreferenceState, PreferenceStore, Priority,
    ShellHost, SkipTarget, Target, TimerTask,
};

/// User agents of screen readers known to advertise themselves
const SCREEN_READER_AGENTS: [&str; 3] = ["NVDA", "JAWS", "VoiceOver"];

/// Host environment signals read on mount
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSignals {
    /// `prefers-reduced-motion: reduce`
    pub prefers_reduced_motion: bool,
    pub user_agent: String,
    pub speech_synthesis_available: bool,
}

impl SystemSignals {
    /// Best-effort screen reader heuristic
    pub fn suggests_screen_reader(&self, doc: &Document) -> bool {
        SCREEN_READER_AGENTS.iter().any(|agent| self.user_agent.contains(agent))
            || self.speech_synthesis_available
            || doc.query_selector("[aria-live]").is_some()
    }
}

/// Accessibility context
#[derive(Debug)]
pub struct A11yContext {
    config: A11yConfig,
    timers: TimerQueue<TimerTask>,
    announcer: Announcer,
    focus: FocusCoordinator,
    keyboard: KeyboardDispatcher,
    prefs: PreferenceState,
    mounted: bool,
}

impl A11yContext {
    pub fn new(config: A11yConfig, store: Box<dyn PreferenceStore>) -> Self {
        Self {
            timers: TimerQueue::new(),
            announcer: Announcer::new(&config),
            focus: FocusCoordinator::new(&config),
            keyboard: KeyboardDispatcher::new(&config),
            prefs: PreferenceState::new(&config, store),
            mounted: false,
            config,
        }
    }

    pub fn config(&self) -> &A11yConfig {
        &self.config
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Load preferences, detect signals, apply classes, install listeners
    /// and schedule the welcome message
    pub fn mount(&mut self, doc: &mut Document, signals: &SystemSignals) {
        if self.mounted {
            tracing::debug!("Accessibility context already mounted");
            return;
        }
        self.prefs.load();
        self.prefs.set_system_reduced_motion(signals.prefers_reduced_motion);
        if signals.suggests_screen_reader(doc) {
            self.prefs.mark_screen_reader_detected();
        }
        self.prefs.apply_classes(doc);

        self.keyboard.install_keyboard_mode();
        if self.config.enable_global_shortcuts {
            self.keyboard.install_global_shortcuts();
        }
        self.timers
            .schedule(self.config.welcome_delay_ms, TimerScope::Lifecycle, TimerTask::Welcome);
        self.mounted = true;
        tracing::info!("Accessibility context mounted: {:?}", self.prefs.state());
    }

    /// Cancel every timer, clear announcements and remove all listeners
    pub fn teardown(&mut self, doc: &mut Document) {
        self.keyboard.remove_all(&mut self.timers);
        self.announcer.clear_all(&mut self.timers);
        let cancelled = self.timers.clear();
        self.focus.reset();
        self.mounted = false;
        self.announcer.render_live_regions(doc);
        tracing::info!("Accessibility context torn down ({} timers cancelled)", cancelled);
    }

    /// Move the virtual clock forward, running due timers in order
    pub fn advance(&mut self, doc: &mut Document, elapsed_ms: u64) {
        let until = self.timers.now().saturating_add(elapsed_ms);
        while let Some((_, task)) = self.timers.pop_due(until) {
            self.run(doc, task);
        }
        self.timers.advance_to(until);
        self.announcer.render_live_regions(doc);
    }

    fn run(&mut self, doc: &mut Document, task: TimerTask) {
        tracing::trace!("Timer fired at {}ms: {:?}", self.timers.now(), task);
        match task {
            TimerTask::AnnouncementExpired(id) => self.announcer.on_expired(id),
            TimerTask::PoliteExpired(id) => self.announcer.on_polite_expired(&mut self.timers, id),
            TimerTask::DrainQueue => self.announcer.drain(&mut self.timers),
            TimerTask::NavigationSettled { previous, current } => {
                self.focus.on_navigation_settled(
                    doc,
                    &mut self.timers,
                    &mut self.announcer,
                    &previous,
                    &current,
                );
            }
            TimerTask::DialogMounted(dialog) => {
                self.focus.on_dialog_mounted(doc, &mut self.timers, &mut self.announcer, dialog);
            }
            TimerTask::LiveRegionMounted(region) => {
                self.focus.on_live_region_mounted(doc, &mut self.timers, &mut self.announcer, region);
            }
            TimerTask::FocusElement { target, options } => {
                self.focus.focus_element(doc, &mut self.timers, &mut self.announcer, target, options);
            }
            TimerTask::TypeaheadReset(handle) => self.keyboard.on_typeahead_reset(handle),
            TimerTask::Welcome => {
                self.announcer.announce(
                    &mut self.timers,
                    messages::WELCOME,
                    Priority::Polite,
                    AnnounceOptions::default(),
                );
            }
        }
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.timers.now()
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timers.stats()
    }

    /// Write the active announcements into the live regions now
    pub fn sync_live_regions(&mut self, doc: &mut Document) {
        self.announcer.render_live_regions(doc);
    }

    // ---- announcements ----

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    pub fn announce(&mut self, message: &str, priority: Priority, options: AnnounceOptions) -> Option<AnnouncementId> {
        self.announcer.announce(&mut self.timers, message, priority, options)
    }

    pub fn announce_navigation(&mut self, page_name: &str) -> Option<AnnouncementId> {
        self.announcer.announce_navigation(&mut self.timers, page_name)
    }

    pub fn announce_form_validation(&mut self, message: &str, is_error: bool) -> Option<AnnouncementId> {
        self.announcer.announce_form_validation(&mut self.timers, message, is_error)
    }

    pub fn announce_content_change(&mut self, message: &str) -> Option<AnnouncementId> {
        self.announcer.announce_content_change(&mut self.timers, message)
    }

    pub fn announce_status(&mut self, message: &str) -> Option<AnnouncementId> {
        self.announcer.announce_status(&mut self.timers, message)
    }

    pub fn announce_error(&mut self, message: &str) -> Option<AnnouncementId> {
        self.announcer.announce_error(&mut self.timers, message)
    }

    pub fn announce_success(&mut self, message: &str) -> Option<AnnouncementId> {
        self.announcer.announce_success(&mut self.timers, message)
    }

    pub fn announce_loading(&mut self, is_loading: bool, context: &str) -> Option<AnnouncementId> {
        self.announcer.announce_loading(&mut self.timers, is_loading, context)
    }

    pub fn clear_announcements(&mut self) {
        self.announcer.clear_all(&mut self.timers);
    }

    // ---- preferences ----

    /// Read-only state snapshot
    pub fn state(&self) -> AccessibilityState {
        self.prefs.state()
    }

    pub fn preferences(&self) -> &PreferenceState {
        &self.prefs
    }

    pub fn load_preferences(&mut self, doc: &mut Document) {
        self.prefs.load();
        self.prefs.apply_classes(doc);
    }

    pub fn set_font_size(&mut self, doc: &mut Document, size: FontSize) {
        self.prefs.set_font_size(size);
        self.prefs.apply_classes(doc);
        self.announce(&messages::font_size_changed(size.label()), Priority::Polite, AnnounceOptions::default());
    }

    pub fn set_contrast_mode(&mut self, doc: &mut Document, mode: ContrastMode) {
        self.prefs.set_contrast_mode(mode);
        self.prefs.apply_classes(doc);
        let high = mode == ContrastMode::High;
        self.announce(&messages::contrast_changed(high), Priority::Polite, AnnounceOptions::default());
    }

    /// Returns the new effective value
    pub fn toggle_reduced_motion(&mut self, doc: &mut Document) -> bool {
        let reduced = self.prefs.toggle_reduced_motion();
        self.prefs.apply_classes(doc);
        self.announce(&messages::motion_changed(reduced), Priority::Polite, AnnounceOptions::default());
        reduced
    }

    pub fn reset_preferences(&mut self, doc: &mut Document) {
        self.prefs.reset();
        self.prefs.apply_classes(doc);
        self.announce(messages::PREFERENCES_RESET, Priority::Polite, AnnounceOptions::default());
    }

    pub fn apply_accessibility_classes(&self, doc: &mut Document) {
        self.prefs.apply_classes(doc);
    }

    /// `prefers-reduced-motion` changed; only visible while the preference is unset
    pub fn on_system_reduced_motion_changed(&mut self, doc: &mut Document, matches: bool) {
        tracing::debug!("System reduced motion -> {}", matches);
        self.prefs.set_system_reduced_motion(matches);
        self.prefs.apply_classes(doc);
    }

    // ---- focus ----

    pub fn on_route_changed(&mut self, previous: &str, current: &str) {
        self.focus.on_route_changed(&mut self.timers, previous, current);
    }

    pub fn on_content_inserted(&mut self, doc: &Document, node: NodeId) {
        self.focus.on_dynamic_content_inserted(doc, &mut self.timers, node);
    }

    pub fn on_content_removed(&mut self, doc: &Document, node: NodeId) {
        self.focus.on_content_removed(doc, &mut self.timers, node);
    }

    pub fn focus_element(&mut self, doc: &mut Document, target: Target, options: FocusElementOptions) -> bool {
        self.focus.focus_element(doc, &mut self.timers, &mut self.announcer, target, options)
    }

    pub fn skip_to(&mut self, doc: &mut Document, target: SkipTarget) -> bool {
        self.focus.skip_to(doc, target)
    }

    // ---- keyboard ----

    /// Dispatch a key-down event. Returns whether the default action must be
    /// prevented.
    pub fn on_key_down(&mut self, doc: &mut Document, shell: &mut dyn ShellHost, event: &KeyEvent) -> bool {
        let mut event = event.clone();
        if event.target.is_none() {
            event.target = Some(doc.active_element().unwrap_or(doc.body()));
        }

        let mut env = KeyEnv {
            doc: &mut *doc,
            shell,
            announcer: &mut self.announcer,
            timers: &mut self.timers,
            prefs: &mut self.prefs,
        };
        let outcome = self.keyboard.on_key_down(&mut env, &event);

        if let Some((previous, current)) = outcome.navigated {
            self.focus.on_route_changed(&mut self.timers, &previous, &current);
        }
        self.announcer.render_live_regions(doc);
        outcome.prevent_default
    }

    pub fn on_pointer_down(&mut self, doc: &mut Document, kind: PointerKind) {
        self.keyboard.on_pointer_down(doc, &mut self.prefs, kind);
    }

    pub fn create_arrow_navigation(&mut self, container: Target, options: ArrowNavOptions) -> ListenerHandle {
        self.keyboard.create_arrow_navigation(container, options)
    }

    pub fn create_typeahead_navigation(&mut self, container: Target, item_selector: &str) -> ListenerHandle {
        self.keyboard.create_typeahead_navigation(container, item_selector)
    }

    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.keyboard.remove_listener(&mut self.timers, handle)
    }

    pub fn keyboard(&self) -> &KeyboardDispatcher {
        &self.keyboard
    }

    pub fn keyboard_state(&self, doc: &Document, shell: &dyn ShellHost) -> KeyboardState {
        self.keyboard.keyboard_state(doc, shell, &self.prefs)
    }

    pub fn into_store(self) -> Box<dyn PreferenceStore> {
        self.prefs.into_store()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StaticShell};

    fn context() -> A11yContext {
        A11yContext::new(A11yConfig::default(), Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_screen_reader_heuristic() {
        let mut doc = Document::new("about:blank");
        let mut signals = SystemSignals::default();
        assert!(!signals.suggests_screen_reader(&doc));

        signals.user_agent = "Mozilla/5.0 NVDA/2024.1".into();
        assert!(signals.suggests_screen_reader(&doc));

        signals.user_agent.clear();
        doc.append_element(doc.body(), "div", &[("aria-live", "polite")]).unwrap();
        assert!(signals.suggests_screen_reader(&doc));
    }

    #[test]
    fn test_mount_schedules_welcome() {
        let mut ctx = context();
        let mut doc = Document::new("about:blank");
        ctx.mount(&mut doc, &SystemSignals::default());
        ctx.mount(&mut doc, &SystemSignals::default());
        assert_eq!(ctx.timer_stats().pending, 1);

        ctx.advance(&mut doc, 999);
        assert!(ctx.announcer().active().is_empty());
        ctx.advance(&mut doc, 1);
        assert_eq!(ctx.announcer().active()[0].message, messages::WELCOME);
        assert!(doc.class_list(doc.body()).unwrap().contains("font-normal"));
    }

    #[test]
    fn test_teardown_cancels_everything() {
        let mut ctx = context();
        let mut doc = Document::new("about:blank");
        ctx.mount(&mut doc, &SystemSignals::default());
        ctx.announce("uno", Priority::Polite, AnnounceOptions::default());
        ctx.announce("dos", Priority::Polite, AnnounceOptions::default());
        ctx.on_route_changed("/inicio", "/recursos");

        ctx.teardown(&mut doc);
        assert_eq!(ctx.timer_stats().pending, 0);
        assert_eq!(ctx.announcer().stats().queued, 0);
        assert!(!ctx.is_mounted());
    }

    #[test]
    fn test_tab_and_pointer_toggle_keyboard_mode() {
        let mut ctx = context();
        let mut doc = Document::new("about:blank");
        let mut shell = StaticShell::new("/inicio");
        ctx.mount(&mut doc, &SystemSignals::default());

        assert!(!ctx.on_key_down(&mut doc, &mut shell, &KeyEvent::new("Tab")));
        assert!(ctx.keyboard_state(&doc, &shell).is_keyboard_mode);
        assert!(doc.class_list(doc.body()).unwrap().contains("keyboard-navigation"));

        ctx.on_pointer_down(&mut doc, PointerKind::MouseDown);
        assert!(!ctx.state().keyboard_mode_active);
        assert!(!doc.class_list(doc.body()).unwrap().contains("keyboard-navigation"));
    }
}
