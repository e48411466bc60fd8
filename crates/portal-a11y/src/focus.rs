//! Focus Coordinator
//!
//! Decides where focus goes after navigation and after dynamic content is
//! inserted, performs the transfer, then announces.
//!
//! Resolution after a settled navigation, first match wins:
//! 1. page heading `main h1[tabindex="-1"]`
//! 2. main content container `#main-content`
//! 3. nothing (a generic announcement is still made)

use std::collections::HashSet;

use portal_dom::{Document, FocusOptions, NodeId};

use crate::timer::{TimerQueue, TimerScope};
use crate::{messages, A11yConfig, AnnounceOptions, Announcer, Priority, TimerTask};

pub const PAGE_HEADING_SELECTOR: &str = r#"main h1[tabindex="-1"]"#;
pub const MAIN_CONTENT_ID: &str = "main-content";
pub const DIALOG_SELECTOR: &str = r#"[role="dialog"], .modal"#;
pub const LIVE_REGION_SELECTOR: &str = "[aria-live]";
pub const FOCUSABLE_SELECTOR: &str =
    r#"button, [href], input, select, textarea, [tabindex]:not([tabindex="-1"])"#;

/// Dialog focus candidates, in priority order
const DIALOG_TARGETS: [&str; 3] = ["h1, h2", "[autofocus]", "button"];

/// Element reference: a node, or a selector resolved against the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    Selector(String),
}

impl Target {
    /// Resolve to a connected node
    pub fn resolve(&self, doc: &Document) -> Option<NodeId> {
        match self {
            Self::Node(node) => doc.is_connected(*node).then_some(*node),
            Self::Selector(selector) => doc.query_selector(selector),
        }
    }
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

/// Options of [`FocusCoordinator::focus_element`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusElementOptions {
    pub prevent_scroll: bool,
    /// Announce after focusing
    pub announce: bool,
    /// Text to announce; the element's text when `None`
    pub announce_text: Option<String>,
    /// Defer the whole operation
    pub delay_ms: u64,
}

impl FocusElementOptions {
    pub fn announcing(text: &str) -> Self {
        Self {
            announce: true,
            announce_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Skip-link destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipTarget {
    MainContent,
    Navigation,
    Footer,
}

/// Focus coordinator
#[derive(Debug)]
pub struct FocusCoordinator {
    navigation_settle_ms: u64,
    dialog_mount_ms: u64,
    dialog_settle_ms: u64,
    live_region_mount_ms: u64,
    live_region_settle_ms: u64,
    /// Dialogs and live regions already handled. Pruned by `on_content_removed`
    /// and, for nodes the shell dropped silently, when a navigation settles.
    handled: HashSet<NodeId>,
}

impl FocusCoordinator {
    pub fn new(config: &A11yConfig) -> Self {
        Self {
            navigation_settle_ms: config.navigation_settle_ms,
            dialog_mount_ms: config.dialog_mount_ms,
            dialog_settle_ms: config.dialog_settle_ms,
            live_region_mount_ms: config.live_region_mount_ms,
            live_region_settle_ms: config.live_region_settle_ms,
            handled: HashSet::new(),
        }
    }

    /// A new route was entered: drop stale focus work, wait for the render
    pub fn on_route_changed(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        previous: &str,
        current: &str,
    ) {
        let cancelled = timers.cancel_scope(TimerScope::Navigation);
        if cancelled > 0 {
            tracing::debug!("Route change cancelled {} pending focus transfers", cancelled);
        }
        timers.schedule(
            self.navigation_settle_ms,
            TimerScope::Navigation,
            TimerTask::NavigationSettled {
                previous: previous.to_string(),
                current: current.to_string(),
            },
        );
    }

    /// Focus the new page and announce it. Exactly one announcement is made.
    pub fn on_navigation_settled(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerQueue<TimerTask>,
        announcer: &mut Announcer,
        previous: &str,
        current: &str,
    ) -> Option<NodeId> {
        tracing::debug!("Navigation settled: {} -> {}", previous, current);
        self.handled.retain(|&n| doc.is_connected(n));

        if let Some(heading) = doc.query_selector(PAGE_HEADING_SELECTOR) {
            doc.focus(heading, FocusOptions { prevent_scroll: false });
            let title = doc.text_content(heading);
            let title = title.trim();
            if title.is_empty() {
                announcer.announce_navigation(timers, messages::NEW_PAGE_LOADED);
            } else {
                announcer.announce_navigation(timers, title);
            }
            tracing::info!("Focus moved to page heading: {}", title);
            return Some(heading);
        }

        if let Some(main) = doc.get_element_by_id(MAIN_CONTENT_ID) {
            let options = FocusElementOptions::announcing(messages::MAIN_CONTENT_LOADED);
            self.focus_now(doc, timers, announcer, main, &options);
            tracing::info!("Focus moved to main content");
            return Some(main);
        }

        announcer.announce_navigation(timers, messages::NEW_PAGE_LOADED);
        tracing::warn!("No focus target on {}", current);
        None
    }

    /// Handle a subtree the shell attached. Each node is handled once.
    pub fn on_dynamic_content_inserted(
        &mut self,
        doc: &Document,
        timers: &mut TimerQueue<TimerTask>,
        node: NodeId,
    ) {
        if doc.tree.element(node).is_none() {
            return;
        }
        let is_dialog = doc.matches(node, DIALOG_SELECTOR);
        let is_live_region = doc.matches(node, LIVE_REGION_SELECTOR);
        if !is_dialog && !is_live_region {
            return;
        }
        if !self.handled.insert(node) {
            tracing::debug!("Insertion of {} already handled", node);
            return;
        }
        if is_dialog {
            timers.schedule(self.dialog_mount_ms, TimerScope::Navigation, TimerTask::DialogMounted(node));
        }
        if is_live_region {
            timers.schedule(
                self.live_region_mount_ms,
                TimerScope::Navigation,
                TimerTask::LiveRegionMounted(node),
            );
        }
    }

    /// Forget a removed subtree and cancel focus transfers into it
    pub fn on_content_removed(
        &mut self,
        doc: &Document,
        timers: &mut TimerQueue<TimerTask>,
        node: NodeId,
    ) {
        self.handled.retain(|&n| !doc.contains(node, n));
        let cancelled = timers.cancel_where(|task| task.targets_within(doc, node));
        if cancelled > 0 {
            tracing::debug!("Removal of {} cancelled {} focus transfers", node, cancelled);
        }
    }

    pub(crate) fn on_dialog_mounted(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerQueue<TimerTask>,
        announcer: &mut Announcer,
        dialog: NodeId,
    ) {
        if !doc.is_connected(dialog) {
            return;
        }
        let target = DIALOG_TARGETS.iter().find_map(|selector| {
            doc.query_selector_all_in(dialog, selector)
                .into_iter()
                .find(|&n| doc.is_focusable(n))
        });
        let Some(target) = target else {
            tracing::debug!("Dialog {} has no focus target", dialog);
            return;
        };
        let options =
            FocusElementOptions::announcing(messages::DIALOG_OPENED).with_delay(self.dialog_settle_ms);
        self.focus_element(doc, timers, announcer, Target::Node(target), options);
    }

    pub(crate) fn on_live_region_mounted(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerQueue<TimerTask>,
        announcer: &mut Announcer,
        region: NodeId,
    ) {
        if !doc.is_connected(region) {
            return;
        }
        let Some(target) = doc.query_selector_in(region, FOCUSABLE_SELECTOR) else {
            return;
        };
        let options = FocusElementOptions::default().with_delay(self.live_region_settle_ms);
        self.focus_element(doc, timers, announcer, Target::Node(target), options);
    }

    /// Focus a node or selector, optionally announcing. Delayed calls resolve
    /// their target when the timer fires. Returns whether focus moved now.
    pub fn focus_element(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerQueue<TimerTask>,
        announcer: &mut Announcer,
        target: Target,
        options: FocusElementOptions,
    ) -> bool {
        if options.delay_ms > 0 {
            let delay_ms = options.delay_ms;
            let options = FocusElementOptions { delay_ms: 0, ..options };
            timers.schedule(delay_ms, TimerScope::Navigation, TimerTask::FocusElement { target, options });
            return false;
        }
        let Some(node) = target.resolve(doc) else {
            tracing::debug!("Focus target {:?} not found", target);
            return false;
        };
        self.focus_now(doc, timers, announcer, node, &options)
    }

    fn focus_now(
        &mut self,
        doc: &mut Document,
        timers: &mut TimerQueue<TimerTask>,
        announcer: &mut Announcer,
        node: NodeId,
        options: &FocusElementOptions,
    ) -> bool {
        let focused = doc.focus(node, FocusOptions { prevent_scroll: options.prevent_scroll });
        if options.announce {
            let text = match &options.announce_text {
                Some(text) => text.clone(),
                None => doc.text_content(node),
            };
            announcer.announce(timers, &text, Priority::Polite, AnnounceOptions::default());
        }
        focused
    }

    /// Skip-link jump. Returns whether focus moved.
    pub fn skip_to(&mut self, doc: &mut Document, target: SkipTarget) -> bool {
        let (focus, scroll) = match target {
            SkipTarget::MainContent => {
                let main = doc.get_element_by_id(MAIN_CONTENT_ID);
                (main, main)
            }
            SkipTarget::Navigation => {
                let nav = doc
                    .query_selector(r#"nav[role="navigation"]"#)
                    .or_else(|| doc.query_selector("nav"))
                    .or_else(|| doc.get_element_by_id("main-nav"));
                (nav.and_then(|n| doc.query_selector_in(n, "a, button")), nav)
            }
            SkipTarget::Footer => {
                let footer = doc
                    .query_selector(r#"footer[role="contentinfo"]"#)
                    .or_else(|| doc.query_selector("footer"));
                (footer, footer)
            }
        };
        let (Some(focus), Some(scroll)) = (focus, scroll) else {
            tracing::debug!("Skip target {:?} not found", target);
            return false;
        };
        let focused = doc.focus(focus, FocusOptions { prevent_scroll: true });
        doc.scroll_into_view(scroll);
        tracing::debug!("Skip link to {:?} (focused: {})", target, focused);
        focused
    }

    /// Forget every handled insertion
    pub fn reset(&mut self) {
        self.handled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (FocusCoordinator, TimerQueue<TimerTask>, Announcer, Document) {
        let config = A11yConfig::default();
        (
            FocusCoordinator::new(&config),
            TimerQueue::new(),
            Announcer::new(&config),
            Document::new("about:blank"),
        )
    }

    #[test]
    fn test_heading_preferred() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let main = doc
            .append_element(doc.body(), "main", &[("id", "main-content"), ("tabindex", "-1")])
            .unwrap();
        let h1 = doc.append_element(main, "h1", &[("tabindex", "-1")]).unwrap();
        doc.append_text(h1, " Contacto ").unwrap();

        let focused = focus.on_navigation_settled(&mut doc, &mut timers, &mut announcer, "/inicio", "/contacto");
        assert_eq!(focused, Some(h1));
        assert_eq!(doc.active_element(), Some(h1));
        assert_eq!(doc.last_scrolled(), Some(h1));
        assert_eq!(announcer.active()[0].message, "Navegaste a: Contacto");
    }

    #[test]
    fn test_empty_heading_announces_generic() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let main = doc.append_element(doc.body(), "main", &[]).unwrap();
        doc.append_element(main, "h1", &[("tabindex", "-1")]).unwrap();

        focus.on_navigation_settled(&mut doc, &mut timers, &mut announcer, "/a", "/b");
        let stats = announcer.stats();
        assert_eq!(stats.active + stats.queued, 1);
        assert_eq!(announcer.active()[0].message, "Navegaste a: Nueva página cargada");
    }

    #[test]
    fn test_main_content_fallback() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let main = doc
            .append_element(doc.body(), "div", &[("id", "main-content"), ("tabindex", "-1")])
            .unwrap();

        let focused = focus.on_navigation_settled(&mut doc, &mut timers, &mut announcer, "/a", "/b");
        assert_eq!(focused, Some(main));
        assert_eq!(doc.active_element(), Some(main));
        assert_eq!(announcer.active()[0].message, "Contenido principal cargado");
    }

    #[test]
    fn test_dialog_target_priority() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let dialog = doc
            .append_element(doc.body(), "div", &[("role", "dialog")])
            .unwrap();
        let close = doc.append_element(dialog, "button", &[]).unwrap();
        let field = doc.append_element(dialog, "input", &[("autofocus", "")]).unwrap();
        // Plain h2 is not focusable, so [autofocus] wins over it
        doc.append_element(dialog, "h2", &[]).unwrap();

        focus.on_dynamic_content_inserted(&doc, &mut timers, dialog);
        focus.on_dynamic_content_inserted(&doc, &mut timers, dialog);
        assert_eq!(timers.len(), 1);

        let (_, task) = timers.pop_due(100).unwrap();
        assert_eq!(task, TimerTask::DialogMounted(dialog));
        focus.on_dialog_mounted(&mut doc, &mut timers, &mut announcer, dialog);

        let (_, task) = timers.pop_due(150).unwrap();
        let TimerTask::FocusElement { target, options } = task else {
            panic!("expected delayed focus");
        };
        assert_eq!(target, Target::Node(field));
        assert!(focus.focus_element(&mut doc, &mut timers, &mut announcer, target, options));
        assert_ne!(doc.active_element(), Some(close));
        assert_eq!(announcer.active()[0].message, "Diálogo abierto");
    }

    #[test]
    fn test_removal_cancels_pending_transfer() {
        let (mut focus, mut timers, _, mut doc) = setup();
        let region = doc
            .append_element(doc.body(), "section", &[("aria-live", "polite")])
            .unwrap();
        doc.append_element(region, "button", &[]).unwrap();

        focus.on_dynamic_content_inserted(&doc, &mut timers, region);
        assert_eq!(timers.len(), 1);
        doc.remove(region);
        focus.on_content_removed(&doc, &mut timers, region);
        assert!(timers.is_empty());

        // Re-inserted node is handled again
        let body = doc.body();
        doc.append_child(body, region).unwrap();
        focus.on_dynamic_content_inserted(&doc, &mut timers, region);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_plain_insertions_are_not_remembered() {
        let (mut focus, mut timers, _, mut doc) = setup();
        for _ in 0..50 {
            let p = doc.append_element(doc.body(), "p", &[]).unwrap();
            focus.on_dynamic_content_inserted(&doc, &mut timers, p);
        }
        assert!(focus.handled.is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_settle_prunes_detached_insertions() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let dialog = doc
            .append_element(doc.body(), "div", &[("role", "dialog")])
            .unwrap();
        let region = doc
            .append_element(doc.body(), "div", &[("aria-live", "polite")])
            .unwrap();
        focus.on_dynamic_content_inserted(&doc, &mut timers, dialog);
        focus.on_dynamic_content_inserted(&doc, &mut timers, region);
        assert_eq!(focus.handled.len(), 2);

        // Removed by a re-render without a removal notification
        doc.remove(dialog);
        focus.on_navigation_settled(&mut doc, &mut timers, &mut announcer, "/a", "/b");
        assert_eq!(focus.handled.len(), 1);
        assert!(focus.handled.contains(&region));
    }

    #[test]
    fn test_focus_element_unresolvable_is_noop() {
        let (mut focus, mut timers, mut announcer, mut doc) = setup();
        let options = FocusElementOptions::announcing("nada");
        assert!(!focus.focus_element(&mut doc, &mut timers, &mut announcer, "#missing".into(), options));
        assert_eq!(announcer.stats().active, 0);
    }

    #[test]
    fn test_skip_to_navigation() {
        let (mut focus, _, _, mut doc) = setup();
        let nav = doc.append_element(doc.body(), "nav", &[]).unwrap();
        let link = doc.append_element(nav, "a", &[("href", "/inicio")]).unwrap();

        assert!(focus.skip_to(&mut doc, SkipTarget::Navigation));
        assert_eq!(doc.active_element(), Some(link));
        assert_eq!(doc.last_scrolled(), Some(nav));
        assert!(!focus.skip_to(&mut doc, SkipTarget::Footer));
    }
}
