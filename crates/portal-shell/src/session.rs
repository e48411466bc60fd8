//! Scripted keyboard session
//!
//! Walks the portal the way a keyboard and screen reader user would and
//! prints what the live regions say after every step.

use anyhow::{Context, Result};
use portal_a11y::{
    A11yContext, ContrastMode, FontSize, KeyEvent, PointerKind, ShellHost, SystemSignals, Target,
    DEFAULT_TYPEAHEAD_SELECTOR, POLITE_REGION_ID, ASSERTIVE_REGION_ID,
};
use portal_dom::Document;

use crate::portal::PortalShell;

/// Key presses and waits of one step
enum Step {
    Key(KeyEvent),
    Wait(u64),
}

fn key(k: &str) -> Step {
    Step::Key(KeyEvent::new(k))
}

pub fn run(ctx: &mut A11yContext, shell: &mut PortalShell, doc: &mut Document) -> Result<()> {
    ctx.mount(doc, &SystemSignals::default());
    ctx.advance(doc, 1000);
    report(doc, "mount");

    play(ctx, shell, doc, "tab into the page", [key("Tab"), Step::Wait(0)]);
    play(ctx, shell, doc, "Alt+2", [Step::Key(KeyEvent::new("2").alt()), Step::Wait(150)]);
    play(ctx, shell, doc, "Ctrl+K", [Step::Key(KeyEvent::new("k").ctrl()), Step::Wait(150)]);

    let list = doc
        .get_element_by_id("resource-types")
        .context("resources view has no type list")?;
    let handle = ctx.create_typeahead_navigation(Target::Node(list), DEFAULT_TYPEAHEAD_SELECTOR);
    if let Some(first) = doc.query_selector_in(list, r#"[role="option"]"#) {
        ctx.focus_element(doc, first.into(), Default::default());
    }
    play(ctx, shell, doc, "type-ahead 'ej'", [key("e"), key("j"), Step::Wait(150)]);
    ctx.remove_listener(handle);

    let dialog = shell.open_filters_dialog(doc)?;
    ctx.on_content_inserted(doc, dialog);
    play(ctx, shell, doc, "open filters", [Step::Wait(150)]);
    play(ctx, shell, doc, "Escape", [key("Escape"), Step::Wait(150)]);

    ctx.on_pointer_down(doc, PointerKind::MouseDown);
    ctx.set_contrast_mode(doc, ContrastMode::High);
    ctx.set_font_size(doc, FontSize::Large);
    ctx.advance(doc, 100);
    report(doc, "preferences");

    let previous = shell.current_route().to_string();
    shell.navigate(doc, "/contacto");
    ctx.on_route_changed(&previous, "/contacto");
    ctx.advance(doc, 3300);
    report(doc, "link to /contacto");

    ctx.announce_form_validation("El correo es obligatorio", true);
    ctx.advance(doc, 0);
    report(doc, "form error");

    let state = ctx.state();
    println!(
        "Preferences: font {}, {}, reduced motion {}",
        state.font_size_label(),
        state.contrast_label(),
        state.effective_reduced_motion()
    );
    let stats = ctx.timer_stats();
    println!("Timers: {} scheduled, {} fired, {} cancelled", stats.total_scheduled, stats.total_fired, stats.total_cancelled);

    ctx.teardown(doc);
    Ok(())
}

fn play<const N: usize>(
    ctx: &mut A11yContext,
    shell: &mut PortalShell,
    doc: &mut Document,
    label: &str,
    steps: [Step; N],
) {
    for step in steps {
        match step {
            Step::Key(event) => {
                let prevented = ctx.on_key_down(doc, shell, &event);
                tracing::debug!("{:?} prevented={}", event.key, prevented);
            }
            Step::Wait(ms) => ctx.advance(doc, ms),
        }
    }
    report(doc, label);
}

fn report(doc: &Document, label: &str) {
    let focused = doc
        .active_element()
        .map(|n| {
            let text = doc.text_content(n);
            let text = text.trim();
            if text.is_empty() {
                doc.get_attribute(n, "aria-label").unwrap_or("?").to_string()
            } else {
                text.to_string()
            }
        })
        .unwrap_or_else(|| "body".to_string());
    println!("[{label}] focus: {focused}");
    for id in [POLITE_REGION_ID, ASSERTIVE_REGION_ID] {
        if let Some(region) = doc.get_element_by_id(id) {
            let said = doc.text_content(region);
            if !said.is_empty() {
                println!("  {id}: {said}");
            }
        }
    }
}
