//! Global shortcuts and Escape handling through the mounted context

use portal_a11y::{A11yConfig, A11yContext, KeyEvent, MemoryStore, StaticShell, SystemSignals};
use portal_dom::{Document, NodeId};

struct Portal {
    doc: Document,
    shell: StaticShell,
    ctx: A11yContext,
    skip_link: NodeId,
    menu: NodeId,
    search: NodeId,
}

fn portal(route: &str, config: A11yConfig) -> Portal {
    let mut doc = Document::new(&format!("https://portal.example{route}"));
    let body = doc.body();
    let skip_link = doc
        .append_element(body, "a", &[("href", "#main-content"), ("class", "skip-link")])
        .unwrap();
    doc.append_text(skip_link, "Saltar al contenido principal").unwrap();
    let nav = doc.append_element(body, "nav", &[("role", "navigation")]).unwrap();
    let menu = doc
        .append_element(nav, "button", &[("id", "menu-toggle"), ("aria-expanded", "false")])
        .unwrap();
    let main = doc
        .append_element(body, "main", &[("id", "main-content"), ("tabindex", "-1")])
        .unwrap();
    let h1 = doc.append_element(main, "h1", &[("tabindex", "-1")]).unwrap();
    doc.append_text(h1, "Recursos Educativos").unwrap();
    let search = doc
        .append_element(main, "input", &[("id", "search-resources"), ("type", "search")])
        .unwrap();

    let mut ctx = A11yContext::new(config, Box::new(MemoryStore::new()));
    ctx.mount(&mut doc, &SystemSignals::default());
    Portal { doc, shell: StaticShell::new(route), ctx, skip_link, menu, search }
}

impl Portal {
    fn press(&mut self, event: KeyEvent) -> bool {
        self.ctx.on_key_down(&mut self.doc, &mut self.shell, &event)
    }

    fn messages(&self) -> Vec<String> {
        let ann = self.ctx.announcer();
        ann.active().into_iter().chain(ann.queued()).map(|a| a.message).collect()
    }
}

#[test]
fn test_alt_digit_navigates_once() {
    let mut p = portal("/recursos", A11yConfig::default());

    assert!(p.press(KeyEvent::new("1").alt()));
    assert_eq!(p.shell.navigations(), ["/inicio"]);
    assert_eq!(p.messages(), vec!["Navegaste a: Página de Inicio"]);

    // Already there: consumed, nothing happens
    assert!(p.press(KeyEvent::new("1").alt()));
    assert_eq!(p.shell.navigations().len(), 1);

    // Settled navigation focuses the heading of the rendered view
    p.ctx.advance(&mut p.doc, 100);
    assert!(p.doc.matches(p.doc.active_element().unwrap(), "h1"));
}

#[test]
fn test_alt_digit_with_extra_modifiers_ignored() {
    let mut p = portal("/inicio", A11yConfig::default());
    assert!(!p.press(KeyEvent::new("2").alt().shift()));
    assert!(!p.press(KeyEvent::new("2").alt().ctrl()));
    assert!(!p.press(KeyEvent::new("2")));
    assert!(p.shell.navigations().is_empty());
}

#[test]
fn test_ctrl_k_only_on_resources() {
    let mut p = portal("/contacto", A11yConfig::default());
    assert!(!p.press(KeyEvent::new("k").ctrl()));
    assert_eq!(p.doc.active_element(), None);

    let mut p = portal("/recursos", A11yConfig::default());
    assert!(p.press(KeyEvent::new("k").ctrl()));
    assert_eq!(p.doc.active_element(), Some(p.search));
    assert_eq!(p.messages(), vec!["Enfoque en campo de búsqueda"]);
}

#[test]
fn test_ctrl_home_focuses_skip_link() {
    let mut p = portal("/contacto", A11yConfig::default());
    p.doc.focus(p.search, Default::default());
    assert!(p.press(KeyEvent::new("Home").ctrl()));
    assert_eq!(p.doc.active_element(), Some(p.skip_link));
    assert_eq!(p.messages(), vec!["Enfoque en inicio de página"]);
}

#[test]
fn test_escape_closes_dialog_then_menu() {
    let mut p = portal("/recursos", A11yConfig::default());
    p.doc.set_attribute(p.menu, "aria-expanded", "true").unwrap();
    let body = p.doc.body();
    let dialog = p
        .doc
        .append_element(body, "div", &[("role", "dialog"), ("aria-hidden", "false")])
        .unwrap();
    let close = p.doc.append_element(dialog, "button", &[("class", "modal-close")]).unwrap();

    assert!(p.press(KeyEvent::new("Escape")));
    assert_eq!(p.shell.activations(), [close]);
    assert_eq!(p.doc.get_attribute(dialog, "aria-hidden"), Some("true"));
    assert_eq!(p.doc.get_attribute(p.menu, "aria-expanded"), Some("true"));

    assert!(p.press(KeyEvent::new("Escape")));
    assert_eq!(p.doc.get_attribute(p.menu, "aria-expanded"), Some("false"));
    assert_eq!(p.doc.active_element(), Some(p.menu));
    assert_eq!(p.messages(), vec!["Modal cerrado", "Menú cerrado"]);

    // Nothing left to close
    assert!(!p.press(KeyEvent::new("Escape")));
}

#[test]
fn test_escape_dialog_without_close_control_falls_through() {
    let mut p = portal("/recursos", A11yConfig::default());
    let body = p.doc.body();
    let dialog = p
        .doc
        .append_element(body, "div", &[("role", "dialog"), ("aria-hidden", "false")])
        .unwrap();
    let hidden_panel = p
        .doc
        .append_element(body, "div", &[("data-escapable", "true"), ("hidden", "")])
        .unwrap();
    let panel = p.doc.append_element(body, "div", &[("data-escapable", "true")]).unwrap();

    assert!(p.press(KeyEvent::new("Escape")));
    assert_eq!(p.doc.get_attribute(dialog, "aria-hidden"), Some("false"));
    assert_eq!(p.doc.style_property(panel, "display"), Some("none"));
    assert_eq!(p.doc.get_attribute(panel, "aria-hidden"), Some("true"));
    assert_eq!(p.doc.style_property(hidden_panel, "display"), None);
    assert_eq!(p.messages(), vec!["Elemento cerrado"]);
}

#[test]
fn test_escape_handling_can_be_disabled() {
    let config = A11yConfig { enable_escape_handling: false, ..A11yConfig::default() };
    let mut p = portal("/recursos", config);
    p.doc.set_attribute(p.menu, "aria-expanded", "true").unwrap();

    assert!(!p.press(KeyEvent::new("Escape")));
    assert_eq!(p.doc.get_attribute(p.menu, "aria-expanded"), Some("true"));
}

#[test]
fn test_global_shortcuts_can_be_disabled() {
    let config = A11yConfig { enable_global_shortcuts: false, ..A11yConfig::default() };
    let mut p = portal("/recursos", config);
    assert!(!p.press(KeyEvent::new("3").alt()));
    assert!(p.shell.navigations().is_empty());

    // Mode detection is still installed
    p.press(KeyEvent::new("Tab"));
    assert!(p.ctx.state().keyboard_mode_active);
}

#[test]
fn test_keyboard_state_snapshot() {
    let mut p = portal("/recursos", A11yConfig::default());
    let state = p.ctx.keyboard_state(&p.doc, &p.shell);
    assert!(!state.is_keyboard_mode);
    assert_eq!(state.current_route, "/recursos");
    assert!(!state.has_keyboard_traps);

    let body = p.doc.body();
    p.doc.append_element(body, "div", &[("data-focus-trap", "true")]).unwrap();
    p.press(KeyEvent::new("Tab"));
    p.press(KeyEvent::new("k").ctrl());

    let state = p.ctx.keyboard_state(&p.doc, &p.shell);
    assert!(state.is_keyboard_mode);
    assert_eq!(state.focused_element, Some(p.search));
    assert!(state.has_keyboard_traps);
}
