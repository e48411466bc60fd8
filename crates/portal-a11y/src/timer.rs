//! Timer Queue
//!
//! Deterministic virtual-time timers with cancellation.
//!
//! Every deferred step of the core (announcement expiry, queue drain,
//! post-navigation focus, type-ahead reset) is a task in this queue. Nothing
//! runs until the host advances the clock, and every timer can be cancelled
//! by id, by scope or by a predicate over its task.

use portal_dom::{Document, NodeId};

use crate::{AnnouncementId, FocusElementOptions, ListenerHandle, Target};

/// Timer identifier (monotonic, doubles as scheduling order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Owner of a timer, for bulk cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerScope {
    /// Announcement expiry and queue drain
    Announcements,
    /// Focus work tied to the current route
    Navigation,
    /// Owned by an installed keyboard listener
    Listener(ListenerHandle),
    /// Mount-time work (welcome message)
    Lifecycle,
}

#[derive(Debug)]
struct Timer<T> {
    id: TimerId,
    due_ms: u64,
    scope: TimerScope,
    task: T,
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    pub total_scheduled: u64,
    pub total_fired: u64,
    pub total_cancelled: u64,
    pub pending: usize,
}

/// Virtual-time timer queue
#[derive(Debug)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer<T>>,
    total_scheduled: u64,
    total_fired: u64,
    total_cancelled: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            timers: Vec::new(),
            total_scheduled: 0,
            total_fired: 0,
            total_cancelled: 0,
        }
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `task` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, scope: TimerScope, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.total_scheduled += 1;
        self.timers.push(Timer {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            scope,
            task,
        });
        id
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.cancel_matching(|t| t.id == id) > 0
    }

    /// Cancel every timer of a scope
    pub fn cancel_scope(&mut self, scope: TimerScope) -> usize {
        self.cancel_matching(|t| t.scope == scope)
    }

    /// Cancel every timer whose task satisfies `pred`
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        self.cancel_matching(|t| pred(&t.task))
    }

    /// Cancel everything
    pub fn clear(&mut self) -> usize {
        self.cancel_matching(|_| true)
    }

    fn cancel_matching(&mut self, mut pred: impl FnMut(&Timer<T>) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| !pred(t));
        let cancelled = before - self.timers.len();
        self.total_cancelled += cancelled as u64;
        cancelled
    }

    /// Whether a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Pending timers of a scope
    pub fn pending_in(&self, scope: TimerScope) -> usize {
        self.timers.iter().filter(|t| t.scope == scope).count()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due_ms).min()
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerId, T)> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i)?;
        let timer = self.timers.swap_remove(index);
        self.now_ms = self.now_ms.max(timer.due_ms);
        self.total_fired += 1;
        Some((timer.id, timer.task))
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, time_ms: u64) {
        self.now_ms = self.now_ms.max(time_ms);
    }

    pub fn stats(&self) -> TimerStats {
        TimerStats {
            total_scheduled: self.total_scheduled,
            total_fired: self.total_fired,
            total_cancelled: self.total_cancelled,
            pending: self.timers.len(),
        }
    }
}

/// Deferred work of the accessibility core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerTask {
    /// Remove an urgent announcement from the active set
    AnnouncementExpired(AnnouncementId),
    /// Remove the in-flight polite announcement and release the queue
    PoliteExpired(AnnouncementId),
    /// Activate the next queued polite announcement
    DrainQueue,
    /// The view of a new route has rendered
    NavigationSettled { previous: String, current: String },
    /// A dialog finished mounting; pick its focus target
    DialogMounted(NodeId),
    /// A live region finished mounting; pick its first control
    LiveRegionMounted(NodeId),
    /// Delayed `focus_element`
    FocusElement { target: Target, options: FocusElementOptions },
    /// Clear a type-ahead buffer
    TypeaheadReset(ListenerHandle),
    /// Welcome message after mount
    Welcome,
}

impl TimerTask {
    /// Whether the task acts on a node inside `root` (inclusive)
    pub fn targets_within(&self, doc: &Document, root: NodeId) -> bool {
        match self {
            Self::DialogMounted(node) | Self::LiveRegionMounted(node) => doc.contains(root, *node),
            Self::FocusElement { target: Target::Node(node), .. } => doc.contains(root, *node),
            _ => false,
        }
    }
}
