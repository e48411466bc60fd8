//! Announcement Channel
//!
//! Priority-aware announcements for assistive technology.
//!
//! Polite announcements go through a FIFO queue drained by a single worker:
//! at most one is active at a time, and consecutive ones are separated by a
//! settle delay. Assertive (or `skip_queue`) announcements are activated
//! immediately and expire on their own timers.

use std::collections::VecDeque;
use std::fmt;

use portal_dom::Document;

use crate::timer::{TimerQueue, TimerScope};
use crate::{messages, A11yConfig, TimerTask};

pub const POLITE_REGION_ID: &str = "polite-announcements";
pub const ASSERTIVE_REGION_ID: &str = "assertive-announcements";

/// Announcement identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnouncementId(u64);

impl fmt::Display for AnnouncementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "announcement-{}", self.0)
    }
}

/// `aria-live` politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    #[default]
    Polite,
    Assertive,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

/// Announcement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Navigation,
    FormValidation,
    ContentChange,
    Status,
    Error,
    Success,
    Loading,
    #[default]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::FormValidation => "form-validation",
            Self::ContentChange => "content-change",
            Self::Status => "status",
            Self::Error => "error",
            Self::Success => "success",
            Self::Loading => "loading",
            Self::General => "general",
        }
    }
}

/// Options of [`Announcer::announce`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnounceOptions {
    pub category: Category,
    /// `None` or zero means the configured default
    pub timeout_ms: Option<u64>,
    /// Activate immediately even when polite
    pub skip_queue: bool,
}

impl AnnounceOptions {
    pub fn category(category: Category) -> Self {
        Self { category, ..Default::default() }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn skip_queue(mut self) -> Self {
        self.skip_queue = true;
        self
    }
}

/// A timed, categorized message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub message: String,
    pub priority: Priority,
    pub category: Category,
    pub created_at_ms: u64,
    pub timeout_ms: u64,
}

/// Diagnostics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncerStats {
    pub active: usize,
    pub queued: usize,
    pub processing: bool,
    /// Distinct categories currently active, in activation order
    pub categories: Vec<Category>,
}

/// Announcement channel
#[derive(Debug)]
pub struct Announcer {
    default_timeout_ms: u64,
    error_timeout_ms: u64,
    settle_ms: u64,
    next_id: u64,
    queue: VecDeque<Announcement>,
    active: Vec<Announcement>,
    processing: bool,
    /// Bumped on every change of the active set
    revision: u64,
    rendered_revision: Option<u64>,
}

impl Announcer {
    pub fn new(config: &A11yConfig) -> Self {
        Self {
            default_timeout_ms: config.announcement_timeout_ms.max(1),
            error_timeout_ms: config.error_timeout_ms.max(1),
            settle_ms: config.queue_settle_ms,
            next_id: 1,
            queue: VecDeque::new(),
            active: Vec::new(),
            processing: false,
            revision: 0,
            rendered_revision: None,
        }
    }

    /// Queue or activate a message. Empty messages are rejected with a warning.
    pub fn announce(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
        priority: Priority,
        options: AnnounceOptions,
    ) -> Option<AnnouncementId> {
        let message = message.trim();
        if message.is_empty() {
            tracing::warn!("Ignoring empty announcement");
            return None;
        }

        let id = AnnouncementId(self.next_id);
        self.next_id += 1;
        let announcement = Announcement {
            id,
            message: message.to_string(),
            priority,
            category: options.category,
            created_at_ms: timers.now(),
            timeout_ms: options
                .timeout_ms
                .filter(|&t| t > 0)
                .unwrap_or(self.default_timeout_ms),
        };
        tracing::debug!(
            "Announcement {} scheduled ({}): {}",
            id,
            priority.as_str(),
            announcement.message
        );

        if priority == Priority::Assertive || options.skip_queue {
            timers.schedule(
                announcement.timeout_ms,
                TimerScope::Announcements,
                TimerTask::AnnouncementExpired(id),
            );
            self.activate(announcement);
        } else {
            self.queue.push_back(announcement);
            self.drain(timers);
        }
        Some(id)
    }

    fn activate(&mut self, announcement: Announcement) {
        self.active.push(announcement);
        self.revision += 1;
    }

    fn deactivate(&mut self, id: AnnouncementId) {
        let before = self.active.len();
        self.active.retain(|a| a.id != id);
        if self.active.len() != before {
            self.revision += 1;
        }
    }

    /// Activate the queue head unless a polite announcement is in flight
    pub(crate) fn drain(&mut self, timers: &mut TimerQueue<TimerTask>) {
        if self.processing {
            return;
        }
        let Some(next) = self.queue.pop_front() else {
            return;
        };
        self.processing = true;
        timers.schedule(
            next.timeout_ms,
            TimerScope::Announcements,
            TimerTask::PoliteExpired(next.id),
        );
        self.activate(next);
    }

    /// Expiry of an urgent announcement
    pub(crate) fn on_expired(&mut self, id: AnnouncementId) {
        self.deactivate(id);
    }

    /// Expiry of the in-flight polite announcement
    pub(crate) fn on_polite_expired(&mut self, timers: &mut TimerQueue<TimerTask>, id: AnnouncementId) {
        self.deactivate(id);
        self.processing = false;
        if !self.queue.is_empty() {
            timers.schedule(self.settle_ms, TimerScope::Announcements, TimerTask::DrainQueue);
        }
    }

    // ---- wrappers ----

    /// Polite "Navegaste a: {page_name}"
    pub fn announce_navigation(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        page_name: &str,
    ) -> Option<AnnouncementId> {
        self.announce(
            timers,
            &messages::navigated_to(page_name),
            Priority::Polite,
            AnnounceOptions::category(Category::Navigation),
        )
    }

    /// Assertive and unqueued for errors, polite otherwise
    pub fn announce_form_validation(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
        is_error: bool,
    ) -> Option<AnnouncementId> {
        let options = AnnounceOptions::category(Category::FormValidation);
        if is_error {
            self.announce(timers, message, Priority::Assertive, options.skip_queue())
        } else {
            self.announce(timers, message, Priority::Polite, options)
        }
    }

    /// Polite content-change notice
    pub fn announce_content_change(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
    ) -> Option<AnnouncementId> {
        self.announce(timers, message, Priority::Polite, AnnounceOptions::category(Category::ContentChange))
    }

    /// Polite status line
    pub fn announce_status(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
    ) -> Option<AnnouncementId> {
        self.announce(timers, message, Priority::Polite, AnnounceOptions::category(Category::Status))
    }

    /// Assertive "Error: {message}" with the longer error timeout
    pub fn announce_error(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
    ) -> Option<AnnouncementId> {
        if message.trim().is_empty() {
            tracing::warn!("Ignoring empty error announcement");
            return None;
        }
        let options = AnnounceOptions::category(Category::Error)
            .skip_queue()
            .with_timeout(self.error_timeout_ms);
        self.announce(timers, &messages::error(message), Priority::Assertive, options)
    }

    /// Polite "Éxito: {message}"
    pub fn announce_success(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        message: &str,
    ) -> Option<AnnouncementId> {
        if message.trim().is_empty() {
            tracing::warn!("Ignoring empty success announcement");
            return None;
        }
        self.announce(
            timers,
            &messages::success(message),
            Priority::Polite,
            AnnounceOptions::category(Category::Success),
        )
    }

    /// "Cargando {context}..." when `is_loading`, else "Carga completada de {context}"
    pub fn announce_loading(
        &mut self,
        timers: &mut TimerQueue<TimerTask>,
        is_loading: bool,
        context: &str,
    ) -> Option<AnnouncementId> {
        let context = context.trim();
        let message = if is_loading {
            messages::loading(context)
        } else {
            messages::loaded(context)
        };
        self.announce(timers, &message, Priority::Polite, AnnounceOptions::category(Category::Loading))
    }

    /// Drop everything and cancel every announcement timer
    pub fn clear_all(&mut self, timers: &mut TimerQueue<TimerTask>) {
        let cancelled = timers.cancel_scope(TimerScope::Announcements);
        self.queue.clear();
        if !self.active.is_empty() {
            self.active.clear();
            self.revision += 1;
        }
        self.processing = false;
        tracing::debug!("Announcements cleared ({} timers cancelled)", cancelled);
    }

    // ---- observability ----

    /// Snapshot of the active set, in activation order
    pub fn active(&self) -> Vec<Announcement> {
        self.active.clone()
    }

    /// Snapshot of the pending polite queue
    pub fn queued(&self) -> Vec<Announcement> {
        self.queue.iter().cloned().collect()
    }

    /// Active announcements of one category
    pub fn by_category(&self, category: Category) -> Vec<Announcement> {
        self.active
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect()
    }

    /// Counts of active and queued messages, plus the active categories
    pub fn stats(&self) -> AnnouncerStats {
        let mut categories = Vec::new();
        for a in &self.active {
            if !categories.contains(&a.category) {
                categories.push(a.category);
            }
        }
        AnnouncerStats {
            active: self.active.len(),
            queued: self.queue.len(),
            processing: self.processing,
            categories,
        }
    }

    /// Mirror the active set into the polite/assertive live regions,
    /// one `<div>` per message. Regions that do not exist are skipped.
    pub fn render_live_regions(&mut self, doc: &mut Document) {
        if self.rendered_revision == Some(self.revision) {
            return;
        }
        for (region_id, priority) in [
            (POLITE_REGION_ID, Priority::Polite),
            (ASSERTIVE_REGION_ID, Priority::Assertive),
        ] {
            let Some(region) = doc.get_element_by_id(region_id) else {
                continue;
            };
            let lines: Vec<&str> = self
                .active
                .iter()
                .filter(|a| a.priority == priority)
                .map(|a| a.message.as_str())
                .collect();
            if let Err(err) = write_region(doc, region, &lines) {
                tracing::warn!("Cannot update live region #{}: {}", region_id, err);
            }
        }
        self.rendered_revision = Some(self.revision);
    }
}

fn write_region(
    doc: &mut Document,
    region: portal_dom::NodeId,
    lines: &[&str],
) -> Result<(), portal_dom::DomError> {
    doc.set_text_content(region, "")?;
    for line in lines {
        let div = doc.append_element(region, "div", &[])?;
        doc.append_text(div, line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Announcer, TimerQueue<TimerTask>) {
        (Announcer::new(&A11yConfig::default()), TimerQueue::new())
    }

    /// Fire due announcement timers up to `until`
    fn run(announcer: &mut Announcer, timers: &mut TimerQueue<TimerTask>, until: u64) {
        while let Some((_, task)) = timers.pop_due(until) {
            match task {
                TimerTask::AnnouncementExpired(id) => announcer.on_expired(id),
                TimerTask::PoliteExpired(id) => announcer.on_polite_expired(timers, id),
                TimerTask::DrainQueue => announcer.drain(timers),
                other => panic!("unexpected task {other:?}"),
            }
        }
        timers.advance_to(until);
    }

    #[test]
    fn test_empty_message_rejected() {
        let (mut announcer, mut timers) = setup();
        assert!(announcer.announce(&mut timers, "   ", Priority::Polite, AnnounceOptions::default()).is_none());
        assert!(timers.is_empty());
        assert_eq!(announcer.stats().queued, 0);
    }

    #[test]
    fn test_message_trimmed_and_default_timeout() {
        let (mut announcer, mut timers) = setup();
        let options = AnnounceOptions::default().with_timeout(0);
        announcer.announce(&mut timers, "  Hola  ", Priority::Polite, options);
        let active = announcer.active();
        assert_eq!(active[0].message, "Hola");
        assert_eq!(active[0].timeout_ms, 3000);
    }

    #[test]
    fn test_polite_fifo_with_settle_gap() {
        let (mut announcer, mut timers) = setup();
        for msg in ["uno", "dos"] {
            announcer.announce(&mut timers, msg, Priority::Polite, AnnounceOptions::default());
        }
        assert_eq!(announcer.active()[0].message, "uno");
        assert_eq!(announcer.stats().queued, 1);

        run(&mut announcer, &mut timers, 3000);
        assert!(announcer.active().is_empty());
        assert!(!announcer.stats().processing);

        run(&mut announcer, &mut timers, 3099);
        assert!(announcer.active().is_empty());
        run(&mut announcer, &mut timers, 3100);
        assert_eq!(announcer.active()[0].message, "dos");
    }

    #[test]
    fn test_error_wrapper() {
        let (mut announcer, mut timers) = setup();
        announcer.announce_error(&mut timers, "campo requerido");
        let active = announcer.by_category(Category::Error);
        assert_eq!(active[0].message, "Error: campo requerido");
        assert_eq!(active[0].priority, Priority::Assertive);
        assert_eq!(active[0].timeout_ms, 5000);

        run(&mut announcer, &mut timers, 4999);
        assert_eq!(announcer.stats().active, 1);
        run(&mut announcer, &mut timers, 5000);
        assert_eq!(announcer.stats().active, 0);
    }

    #[test]
    fn test_form_validation_priority() {
        let (mut announcer, mut timers) = setup();
        announcer.announce_status(&mut timers, "Guardando");
        announcer.announce_form_validation(&mut timers, "Correo no válido", true);
        announcer.announce_form_validation(&mut timers, "Correo válido", false);

        let stats = announcer.stats();
        assert_eq!(stats.active, 2);
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.categories, vec![Category::Status, Category::FormValidation]);
    }

    #[test]
    fn test_clear_all_cancels_timers() {
        let (mut announcer, mut timers) = setup();
        announcer.announce(&mut timers, "a", Priority::Polite, AnnounceOptions::default());
        announcer.announce(&mut timers, "b", Priority::Polite, AnnounceOptions::default());
        announcer.announce(&mut timers, "c", Priority::Assertive, AnnounceOptions::default());

        announcer.clear_all(&mut timers);
        assert_eq!(timers.pending_in(TimerScope::Announcements), 0);
        let stats = announcer.stats();
        assert_eq!((stats.active, stats.queued, stats.processing), (0, 0, false));

        announcer.announce(&mut timers, "d", Priority::Polite, AnnounceOptions::default());
        assert_eq!(announcer.active()[0].message, "d");
    }

    #[test]
    fn test_render_live_regions() {
        let (mut announcer, mut timers) = setup();
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let polite = doc
            .append_element(body, "div", &[("id", POLITE_REGION_ID), ("aria-live", "polite")])
            .unwrap();
        let assertive = doc
            .append_element(body, "div", &[("id", ASSERTIVE_REGION_ID), ("aria-live", "assertive")])
            .unwrap();

        announcer.announce_success(&mut timers, "Formulario enviado");
        announcer.announce_error(&mut timers, "Sin conexión");
        announcer.render_live_regions(&mut doc);
        assert_eq!(doc.text_content(polite), "Éxito: Formulario enviado");
        assert_eq!(doc.text_content(assertive), "Error: Sin conexión");

        announcer.clear_all(&mut timers);
        announcer.render_live_regions(&mut doc);
        assert_eq!(doc.text_content(polite), "");
        assert_eq!(doc.text_content(assertive), "");
    }
}
