//! Keyboard Dispatcher
//!
//! Global shortcuts, Escape handling, roving-focus arrow navigation,
//! type-ahead and keyboard/pointer mode detection.
//!
//! Every listener sees every key-down event in installation order; the
//! dispatcher reports whether any of them consumed it (`preventDefault`).

use std::fmt;

use portal_dom::{Document, FocusOptions, NodeId};

use crate::timer::{TimerId, TimerQueue, TimerScope};
use crate::{
    messages, A11yConfig, AnnounceOptions, Announcer, PreferenceState, Priority, ShellHost, Target,
    TimerTask,
};

pub const SEARCH_INPUT_ID: &str = "search-resources";
pub const RESOURCES_ROUTE: &str = "/recursos";
pub const DEFAULT_ITEM_SELECTOR: &str = r#"[role="menuitem"], [role="option"], button, [href]"#;
pub const DEFAULT_TYPEAHEAD_SELECTOR: &str = r#"[role="menuitem"], [role="option"]"#;

const PAGE_START_TARGETS: [&str; 3] = [".skip-link", "main", "h1"];
const OPEN_DIALOG_SELECTOR: &str = r#"[role="dialog"][aria-hidden="false"]"#;
const CLOSE_CONTROL_SELECTOR: &str = "[data-close], .close, .modal-close";
const EXPANDED_SELECTOR: &str = r#"[aria-expanded="true"]"#;
const ESCAPABLE_SELECTOR: &str = r#"[data-escapable="true"]"#;
const FOCUS_TRAP_SELECTOR: &str = r#"[data-focus-trap="true"]"#;

/// Alt+1..Alt+4 destinations: (digit, path, spoken name)
pub const FIXED_ROUTES: [(&str, &str, &str); 4] = [
    ("1", "/inicio", "Página de Inicio"),
    ("2", "/recursos", "Recursos Educativos"),
    ("3", "/contacto", "Contacto"),
    ("4", "/accesibilidad", "Declaración de Accesibilidad"),
];

/// Installed listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Key-down event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// `KeyboardEvent.key` value ("Escape", "ArrowDown", "k", "1")
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// Event target; the focused element (or body) when `None`
    pub target: Option<NodeId>,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self { key: key.into(), ctrl: false, alt: false, shift: false, meta: false, target: None }
    }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }
    pub fn meta(mut self) -> Self { self.meta = true; self }
    pub fn on(mut self, target: NodeId) -> Self { self.target = Some(target); self }
}

/// Pointer event kinds that leave keyboard mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    MouseDown,
    TouchStart,
}

/// Keyboard shortcut
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyboardShortcut {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Reject the event when Ctrl or Shift are held but not part of the combo
    pub exclusive: bool,
}

impl KeyboardShortcut {
    pub fn new(key: &str) -> Self { Self { key: key.into(), ctrl: false, alt: false, shift: false, exclusive: false } }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }
    pub fn exclusive(mut self) -> Self { self.exclusive = true; self }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl { parts.push("Ctrl"); }
        if self.alt { parts.push("Alt"); }
        if self.shift { parts.push("Shift"); }
        parts.push(&self.key);
        parts.join("+")
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        if event.key != self.key {
            return false;
        }
        if (self.ctrl && !event.ctrl) || (self.alt && !event.alt) || (self.shift && !event.shift) {
            return false;
        }
        !(self.exclusive && ((event.ctrl && !self.ctrl) || (event.shift && !self.shift)))
    }
}

/// What a global shortcut does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Navigate { route: &'static str, name: &'static str },
    FocusSearch,
    FocusPageStart,
    Escape,
}

/// Static shortcut table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutBinding {
    pub shortcut: KeyboardShortcut,
    pub action: ShortcutAction,
    /// Only active on this route
    pub route: Option<&'static str>,
}

/// The global shortcut table
pub fn shortcut_table() -> Vec<ShortcutBinding> {
    let mut table: Vec<ShortcutBinding> = FIXED_ROUTES
        .iter()
        .map(|&(digit, route, name)| ShortcutBinding {
            shortcut: KeyboardShortcut::new(digit).alt().exclusive(),
            action: ShortcutAction::Navigate { route, name },
            route: None,
        })
        .collect();
    table.push(ShortcutBinding {
        shortcut: KeyboardShortcut::new("k").ctrl(),
        action: ShortcutAction::FocusSearch,
        route: Some(RESOURCES_ROUTE),
    });
    table.push(ShortcutBinding {
        shortcut: KeyboardShortcut::new("Home").ctrl(),
        action: ShortcutAction::FocusPageStart,
        route: None,
    });
    table.push(ShortcutBinding {
        shortcut: KeyboardShortcut::new("Escape"),
        action: ShortcutAction::Escape,
        route: None,
    });
    table
}

/// Arrow keys honoured by a roving-focus container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
    Both,
}

impl Orientation {
    fn vertical(self) -> bool {
        matches!(self, Self::Vertical | Self::Both)
    }

    fn horizontal(self) -> bool {
        matches!(self, Self::Horizontal | Self::Both)
    }
}

/// Options of `create_arrow_navigation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowNavOptions {
    pub item_selector: String,
    pub orientation: Orientation,
    /// Wrap around at both ends (`loop`)
    pub wrap: bool,
    pub focus_on_activate: bool,
}

impl Default for ArrowNavOptions {
    fn default() -> Self {
        Self {
            item_selector: DEFAULT_ITEM_SELECTOR.to_string(),
            orientation: Orientation::Vertical,
            wrap: true,
            focus_on_activate: true,
        }
    }
}

/// Snapshot returned by `keyboard_state`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardState {
    pub is_keyboard_mode: bool,
    pub current_route: String,
    pub focused_element: Option<NodeId>,
    pub has_keyboard_traps: bool,
}

#[derive(Debug)]
struct TypeaheadState {
    container: Target,
    item_selector: String,
    buffer: String,
    reset: Option<TimerId>,
}

#[derive(Debug)]
enum Listener {
    KeyboardMode,
    GlobalShortcuts,
    Arrow { container: Target, options: ArrowNavOptions },
    Typeahead(TypeaheadState),
}

/// Borrowed collaborators of one dispatch
pub(crate) struct KeyEnv<'a> {
    pub doc: &'a mut Document,
    pub shell: &'a mut dyn ShellHost,
    pub announcer: &'a mut Announcer,
    pub timers: &'a mut TimerQueue<TimerTask>,
    pub prefs: &'a mut PreferenceState,
}

/// Result of one key-down dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyOutcome {
    pub prevent_default: bool,
    /// (previous, new) route when a shortcut navigated
    pub navigated: Option<(String, String)>,
}

/// Keyboard dispatcher
#[derive(Debug)]
pub struct KeyboardDispatcher {
    bindings: Vec<ShortcutBinding>,
    listeners: Vec<(ListenerHandle, Listener)>,
    next_handle: u64,
    typeahead_reset_ms: u64,
    announce_threshold: usize,
    escape_handling: bool,
}

impl KeyboardDispatcher {
    pub fn new(config: &A11yConfig) -> Self {
        Self {
            bindings: shortcut_table(),
            listeners: Vec::new(),
            next_handle: 1,
            typeahead_reset_ms: config.typeahead_reset_ms,
            announce_threshold: config.arrow_announce_threshold,
            escape_handling: config.enable_escape_handling,
        }
    }

    fn install(&mut self, listener: Listener) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle);
        self.next_handle += 1;
        tracing::debug!("Installing {} ({:?})", handle, listener);
        self.listeners.push((handle, listener));
        handle
    }

    fn find(&self, pred: impl Fn(&Listener) -> bool) -> Option<ListenerHandle> {
        self.listeners.iter().find(|(_, l)| pred(l)).map(|(h, _)| *h)
    }

    /// Tab / pointer mode detection (installed once)
    pub fn install_keyboard_mode(&mut self) -> ListenerHandle {
        self.find(|l| matches!(l, Listener::KeyboardMode))
            .unwrap_or_else(|| self.install(Listener::KeyboardMode))
    }

    /// Alt+1..4, Ctrl+K, Ctrl+Home, Escape (installed once)
    pub fn install_global_shortcuts(&mut self) -> ListenerHandle {
        self.find(|l| matches!(l, Listener::GlobalShortcuts))
            .unwrap_or_else(|| self.install(Listener::GlobalShortcuts))
    }

    pub fn create_arrow_navigation(&mut self, container: Target, options: ArrowNavOptions) -> ListenerHandle {
        self.install(Listener::Arrow { container, options })
    }

    pub fn create_typeahead_navigation(&mut self, container: Target, item_selector: &str) -> ListenerHandle {
        self.install(Listener::Typeahead(TypeaheadState {
            container,
            item_selector: item_selector.to_string(),
            buffer: String::new(),
            reset: None,
        }))
    }

    /// Uninstall a listener and cancel the timers it owns
    pub fn remove_listener(&mut self, timers: &mut TimerQueue<TimerTask>, handle: ListenerHandle) -> bool {
        let Some(index) = self.listeners.iter().position(|(h, _)| *h == handle) else {
            return false;
        };
        self.listeners.remove(index);
        timers.cancel_scope(TimerScope::Listener(handle));
        tracing::debug!("Removed {}", handle);
        true
    }

    pub fn remove_all(&mut self, timers: &mut TimerQueue<TimerTask>) {
        for (handle, _) in self.listeners.drain(..) {
            timers.cancel_scope(TimerScope::Listener(handle));
        }
    }

    pub fn is_installed(&self, handle: ListenerHandle) -> bool {
        self.listeners.iter().any(|(h, _)| *h == handle)
    }

    /// Current type-ahead buffer of a listener
    pub fn typeahead_buffer(&self, handle: ListenerHandle) -> Option<&str> {
        self.listeners.iter().find_map(|(h, l)| match l {
            Listener::Typeahead(state) if *h == handle => Some(state.buffer.as_str()),
            _ => None,
        })
    }

    pub(crate) fn on_typeahead_reset(&mut self, handle: ListenerHandle) {
        for (h, listener) in &mut self.listeners {
            if let Listener::Typeahead(state) = listener {
                if *h == handle {
                    state.buffer.clear();
                    state.reset = None;
                }
            }
        }
    }

    pub(crate) fn on_key_down(&mut self, env: &mut KeyEnv<'_>, event: &KeyEvent) -> KeyOutcome {
        let mut outcome = KeyOutcome::default();
        let (reset_ms, threshold, escape_handling) =
            (self.typeahead_reset_ms, self.announce_threshold, self.escape_handling);
        let bindings = &self.bindings;

        for (handle, listener) in self.listeners.iter_mut() {
            let consumed = match listener {
                Listener::KeyboardMode => {
                    if event.key == "Tab" {
                        env.prefs.set_keyboard_mode(true);
                        env.prefs.apply_classes(env.doc);
                    }
                    false
                }
                Listener::GlobalShortcuts => {
                    handle_global(bindings, escape_handling, env, event, &mut outcome)
                }
                Listener::Arrow { container, options } => {
                    handle_arrow(env, container, options, threshold, event)
                }
                Listener::Typeahead(state) => handle_typeahead(env, *handle, state, reset_ms, event),
            };
            outcome.prevent_default |= consumed;
        }
        outcome
    }

    pub(crate) fn on_pointer_down(&mut self, doc: &mut Document, prefs: &mut PreferenceState, kind: PointerKind) {
        if self.find(|l| matches!(l, Listener::KeyboardMode)).is_some() {
            tracing::debug!("Pointer input ({:?}) leaves keyboard mode", kind);
            prefs.set_keyboard_mode(false);
            prefs.apply_classes(doc);
        }
    }

    pub fn keyboard_state(
        &self,
        doc: &Document,
        shell: &dyn ShellHost,
        prefs: &PreferenceState,
    ) -> KeyboardState {
        KeyboardState {
            is_keyboard_mode: prefs.state().keyboard_mode_active,
            current_route: shell.current_route().to_string(),
            focused_element: doc.active_element(),
            has_keyboard_traps: doc.query_selector(FOCUS_TRAP_SELECTOR).is_some(),
        }
    }
}

fn handle_global(
    bindings: &[ShortcutBinding],
    escape_handling: bool,
    env: &mut KeyEnv<'_>,
    event: &KeyEvent,
    outcome: &mut KeyOutcome,
) -> bool {
    let binding = bindings.iter().find(|b| {
        b.shortcut.matches(event) && b.route.is_none_or(|r| r == env.shell.current_route())
    });
    let Some(binding) = binding else {
        return false;
    };

    match binding.action {
        ShortcutAction::Navigate { route, name } => {
            let previous = env.shell.current_route().to_string();
            if previous != route {
                tracing::info!("Shortcut {} -> {}", binding.shortcut.display(), name);
                env.shell.navigate(env.doc, route);
                env.announcer.announce_navigation(env.timers, name);
                outcome.navigated = Some((previous, route.to_string()));
            }
            true
        }
        ShortcutAction::FocusSearch => {
            if let Some(input) = env.doc.get_element_by_id(SEARCH_INPUT_ID) {
                env.doc.focus(input, FocusOptions::default());
                announce_polite(env, messages::SEARCH_FOCUSED);
            }
            true
        }
        ShortcutAction::FocusPageStart => {
            let start = PAGE_START_TARGETS.iter().find_map(|s| env.doc.query_selector(s));
            if let Some(start) = start {
                env.doc.focus(start, FocusOptions::default());
                announce_polite(env, messages::PAGE_START_FOCUSED);
            }
            true
        }
        ShortcutAction::Escape => escape_handling && handle_escape(env),
    }
}

fn announce_polite(env: &mut KeyEnv<'_>, message: &str) {
    env.announcer.announce(env.timers, message, Priority::Polite, AnnounceOptions::default());
}

/// Close the topmost open thing. Returns whether something was closed.
fn handle_escape(env: &mut KeyEnv<'_>) -> bool {
    let close = env
        .doc
        .query_selector(OPEN_DIALOG_SELECTOR)
        .and_then(|dialog| env.doc.query_selector_in(dialog, CLOSE_CONTROL_SELECTOR));
    if let Some(close) = close {
        env.shell.activate(env.doc, close);
        announce_polite(env, messages::MODAL_CLOSED);
        return true;
    }

    if let Some(menu) = env.doc.query_selector(EXPANDED_SELECTOR) {
        if let Err(err) = env.doc.set_attribute(menu, "aria-expanded", "false") {
            tracing::warn!("Cannot collapse {}: {}", menu, err);
        }
        env.doc.focus(menu, FocusOptions::default());
        announce_polite(env, messages::MENU_CLOSED);
        return true;
    }

    let escapable = env
        .doc
        .query_selector_all(ESCAPABLE_SELECTOR)
        .into_iter()
        .find(|&n| env.doc.is_rendered(n));
    if let Some(element) = escapable {
        let hidden = env
            .doc
            .set_style_property(element, "display", "none")
            .and_then(|_| env.doc.set_attribute(element, "aria-hidden", "true"));
        if let Err(err) = hidden {
            tracing::warn!("Cannot hide {}: {}", element, err);
        }
        announce_polite(env, messages::ELEMENT_CLOSED);
        return true;
    }
    false
}

/// Container and items of a scoped listener, if the event concerns it
fn scoped_items(doc: &Document, container: &Target, selector: &str, event: &KeyEvent) -> Option<Vec<NodeId>> {
    let container = container.resolve(doc)?;
    let target = event.target?;
    if !doc.contains(container, target) {
        return None;
    }
    Some(doc.query_selector_all_in(container, selector))
}

fn handle_arrow(
    env: &mut KeyEnv<'_>,
    container: &Target,
    options: &ArrowNavOptions,
    announce_threshold: usize,
    event: &KeyEvent,
) -> bool {
    let Some(items) = scoped_items(env.doc, container, &options.item_selector, event) else {
        return false;
    };
    let Some(current) = env.doc.active_element().and_then(|a| items.iter().position(|&n| n == a)) else {
        return false;
    };
    let last = items.len() - 1;
    let forward = if options.wrap && current == last { 0 } else { (current + 1).min(last) };
    let backward = if options.wrap && current == 0 { last } else { current.saturating_sub(1) };

    let next = match event.key.as_str() {
        "ArrowDown" if options.orientation.vertical() => forward,
        "ArrowUp" if options.orientation.vertical() => backward,
        "ArrowRight" if options.orientation.horizontal() => forward,
        "ArrowLeft" if options.orientation.horizontal() => backward,
        "Home" => 0,
        "End" => last,
        _ => return false,
    };

    if next != current {
        if options.focus_on_activate {
            env.doc.focus(items[next], FocusOptions::default());
        }
        if items.len() > announce_threshold {
            announce_polite(env, &messages::item_position(next + 1, items.len()));
        }
    }
    true
}

/// ASCII alphanumerics plus Latin-1 Supplement / Latin Extended-A letters
fn is_typeahead_char(key: &str) -> bool {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii_alphanumeric() || ('\u{00C0}'..='\u{017F}').contains(&c),
        _ => false,
    }
}

/// Visible text, else `aria-label`
fn item_label(doc: &Document, node: NodeId) -> String {
    let text = doc.text_content(node);
    let text = text.trim();
    if text.is_empty() {
        doc.get_attribute(node, "aria-label").unwrap_or_default().trim().to_string()
    } else {
        text.to_string()
    }
}

fn handle_typeahead(
    env: &mut KeyEnv<'_>,
    handle: ListenerHandle,
    state: &mut TypeaheadState,
    reset_ms: u64,
    event: &KeyEvent,
) -> bool {
    if event.ctrl || event.alt || event.meta || !is_typeahead_char(&event.key) {
        return false;
    }
    let Some(items) = scoped_items(env.doc, &state.container, &state.item_selector, event) else {
        return false;
    };

    state.buffer.push_str(&event.key.to_lowercase());
    if let Some(reset) = state.reset.take() {
        env.timers.cancel(reset);
    }

    let found = items.into_iter().find_map(|item| {
        let label = item_label(env.doc, item);
        label.to_lowercase().starts_with(&state.buffer).then_some((item, label))
    });
    match found {
        Some((item, label)) => {
            env.doc.focus(item, FocusOptions::default());
            announce_polite(env, &messages::found(&label));
        }
        None => tracing::debug!("No type-ahead match for '{}'", state.buffer),
    }

    state.reset = Some(env.timers.schedule(
        reset_ms,
        TimerScope::Listener(handle),
        TimerTask::TypeaheadReset(handle),
    ));
    true
}
