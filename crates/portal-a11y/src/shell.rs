//! Presentation Shell interface
//!
//! The shell owns routing and rendering. The core only asks it for the
//! current route, to navigate, and to activate (click) a control.

use portal_dom::{Document, NodeId};

/// Host side of the accessibility core
pub trait ShellHost {
    /// Path of the route currently shown (`/recursos`)
    fn current_route(&self) -> &str;

    /// Switch to `route` and render it into `doc`
    fn navigate(&mut self, doc: &mut Document, route: &str);

    /// Activate a control, as a click would
    fn activate(&mut self, doc: &mut Document, control: NodeId);
}

/// Shell without a renderer: records navigations, and closing a control
/// hides its enclosing dialog
#[derive(Debug, Clone, Default)]
pub struct StaticShell {
    route: String,
    navigations: Vec<String>,
    activations: Vec<NodeId>,
}

impl StaticShell {
    pub fn new(route: &str) -> Self {
        Self { route: route.to_string(), ..Default::default() }
    }

    /// Routes navigated to, oldest first
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Controls activated, oldest first
    pub fn activations(&self) -> &[NodeId] {
        &self.activations
    }
}

impl ShellHost for StaticShell {
    fn current_route(&self) -> &str {
        &self.route
    }

    fn navigate(&mut self, _doc: &mut Document, route: &str) {
        self.route = route.to_string();
        self.navigations.push(route.to_string());
    }

    fn activate(&mut self, doc: &mut Document, control: NodeId) {
        self.activations.push(control);
        if let Some(dialog) = doc.closest(control, r#"[role="dialog"]"#) {
            if let Err(err) = doc.set_attribute(dialog, "aria-hidden", "true") {
                tracing::warn!("Cannot close dialog {}: {}", dialog, err);
            }
        }
    }
}
