//! Portal views
//!
//! Renders the page frame and the four routed views into a `Document` and
//! implements `ShellHost` for the accessibility core.

use anyhow::{Context, Result};
use portal_a11y::{ShellHost, ASSERTIVE_REGION_ID, POLITE_REGION_ID};
use portal_dom::{Document, NodeId};
use url::Url;

/// (path, title)
pub const ROUTES: [(&str, &str); 4] = [
    ("/inicio", "Página de Inicio"),
    ("/recursos", "Recursos Educativos"),
    ("/contacto", "Contacto"),
    ("/accesibilidad", "Declaración de Accesibilidad"),
];

pub const RESOURCE_TYPES: [&str; 4] = ["Guías didácticas", "Vídeos subtitulados", "Ejercicios", "Mapas"];

/// Headless portal shell
#[derive(Debug)]
pub struct PortalShell {
    base: Url,
    route: String,
    main: Option<NodeId>,
}

impl PortalShell {
    pub fn new(base: Url) -> Self {
        Self { base, route: ROUTES[0].0.to_string(), main: None }
    }

    /// Title of a known route
    pub fn title(route: &str) -> Option<&'static str> {
        ROUTES.iter().find(|(path, _)| *path == route).map(|(_, title)| *title)
    }

    /// Document for the base URL with the frame and the initial view
    pub fn render(&mut self) -> Result<Document> {
        let url = self.base.join(&self.route).context("invalid route URL")?;
        let mut doc = Document::new(url.as_str());
        self.render_frame(&mut doc)?;
        let route = self.route.clone();
        self.render_view(&mut doc, &route)?;
        Ok(doc)
    }

    fn render_frame(&mut self, doc: &mut Document) -> Result<()> {
        let body = doc.body();
        let skip = doc.append_element(body, "a", &[("href", "#main-content"), ("class", "skip-link")])?;
        doc.append_text(skip, "Saltar al contenido principal")?;

        let header = doc.append_element(body, "header", &[])?;
        let nav = doc.append_element(header, "nav", &[("role", "navigation"), ("aria-label", "Principal")])?;
        for (path, title) in ROUTES {
            let link = doc.append_element(nav, "a", &[("href", path)])?;
            doc.append_text(link, title)?;
        }

        self.main = Some(doc.append_element(body, "main", &[("id", "main-content"), ("tabindex", "-1")])?);

        let footer = doc.append_element(body, "footer", &[("role", "contentinfo")])?;
        let note = doc.append_element(footer, "p", &[])?;
        doc.append_text(note, "Portal de Recursos Educativos Accesibles")?;

        for (id, mode) in [(POLITE_REGION_ID, "polite"), (ASSERTIVE_REGION_ID, "assertive")] {
            doc.append_element(
                body,
                "div",
                &[("id", id), ("aria-live", mode), ("aria-atomic", "true"), ("class", "sr-only")],
            )?;
        }
        Ok(())
    }

    fn render_view(&mut self, doc: &mut Document, route: &str) -> Result<()> {
        let main = self.main.context("frame not rendered")?;
        let old: Vec<NodeId> = doc.tree.children(main).map(|(child, _)| child).collect();
        for child in old {
            doc.remove(child);
        }

        let title = Self::title(route).with_context(|| format!("unknown route {route}"))?;
        let h1 = doc.append_element(main, "h1", &[("tabindex", "-1")])?;
        doc.append_text(h1, title)?;

        match route {
            "/recursos" => {
                doc.append_element(
                    main,
                    "input",
                    &[("id", "search-resources"), ("type", "search"), ("aria-label", "Buscar recursos")],
                )?;
                let list = doc.append_element(
                    main,
                    "div",
                    &[("id", "resource-types"), ("role", "listbox"), ("aria-label", "Tipo de recurso")],
                )?;
                for label in RESOURCE_TYPES {
                    let option = doc.append_element(list, "div", &[("role", "option"), ("tabindex", "-1")])?;
                    doc.append_text(option, label)?;
                }
                let filters = doc.append_element(main, "button", &[("id", "filters-button"), ("aria-expanded", "false")])?;
                doc.append_text(filters, "Filtros")?;
            }
            "/contacto" => {
                let form = doc.append_element(main, "form", &[("aria-label", "Contacto")])?;
                doc.append_element(form, "input", &[("id", "email"), ("type", "email"), ("aria-label", "Correo")])?;
                let send = doc.append_element(form, "button", &[("type", "submit")])?;
                doc.append_text(send, "Enviar")?;
            }
            _ => {
                let intro = doc.append_element(main, "p", &[])?;
                doc.append_text(intro, "Materiales educativos para todas las personas.")?;
            }
        }

        let url = self.base.join(route).context("invalid route URL")?;
        doc.set_url(url.as_str());
        self.route = route.to_string();
        tracing::info!("Rendered {}", url);
        Ok(())
    }

    /// Append the filters dialog to the body
    pub fn open_filters_dialog(&mut self, doc: &mut Document) -> Result<NodeId> {
        let body = doc.body();
        let dialog = doc.append_element(
            body,
            "div",
            &[("role", "dialog"), ("aria-hidden", "false"), ("aria-modal", "true")],
        )?;
        let heading = doc.append_element(dialog, "h2", &[])?;
        doc.append_text(heading, "Filtros de búsqueda")?;
        let level = doc.append_element(dialog, "select", &[("aria-label", "Nivel educativo")])?;
        doc.append_text(level, "Primaria")?;
        let close = doc.append_element(dialog, "button", &[("class", "modal-close"), ("data-close", "")])?;
        doc.append_text(close, "Cerrar")?;
        Ok(dialog)
    }
}

impl ShellHost for PortalShell {
    fn current_route(&self) -> &str {
        &self.route
    }

    fn navigate(&mut self, doc: &mut Document, route: &str) {
        if let Err(err) = self.render_view(doc, route) {
            tracing::error!("Navigation to {} failed: {:#}", route, err);
        }
    }

    fn activate(&mut self, doc: &mut Document, control: NodeId) {
        if let Some(dialog) = doc.closest(control, r#"[role="dialog"]"#) {
            let closed = doc
                .set_attribute(dialog, "aria-hidden", "true")
                .and_then(|_| doc.set_style_property(dialog, "display", "none"));
            if let Err(err) = closed {
                tracing::warn!("Cannot close dialog {}: {}", dialog, err);
            }
            return;
        }
        let href = doc.get_attribute(control, "href").map(str::to_string);
        if let Some(route) = href.filter(|h| Self::title(h).is_some()) {
            self.navigate(doc, &route);
        }
    }
}
