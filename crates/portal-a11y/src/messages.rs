//! User-facing announcement texts (locale: es)

pub const MAIN_CONTENT_LOADED: &str = "Contenido principal cargado";
pub const NEW_PAGE_LOADED: &str = "Nueva página cargada";
pub const DIALOG_OPENED: &str = "Diálogo abierto";
pub const MODAL_CLOSED: &str = "Modal cerrado";
pub const MENU_CLOSED: &str = "Menú cerrado";
pub const ELEMENT_CLOSED: &str = "Elemento cerrado";
pub const SEARCH_FOCUSED: &str = "Enfoque en campo de búsqueda";
pub const PAGE_START_FOCUSED: &str = "Enfoque en inicio de página";
pub const PREFERENCES_RESET: &str =
    "Preferencias de accesibilidad restablecidas a valores por defecto";
pub const WELCOME: &str =
    "Portal de Recursos Educativos Accesibles cargado. Use Alt + 1-4 para navegación rápida.";

pub fn navigated_to(page: &str) -> String {
    format!("Navegaste a: {page}")
}

pub fn error(message: &str) -> String {
    format!("Error: {message}")
}

pub fn success(message: &str) -> String {
    format!("Éxito: {message}")
}

pub fn loading(context: &str) -> String {
    if context.is_empty() {
        "Cargando...".to_string()
    } else {
        format!("Cargando {context}...")
    }
}

pub fn loaded(context: &str) -> String {
    if context.is_empty() {
        "Carga completada".to_string()
    } else {
        format!("Carga completada de {context}")
    }
}

pub fn item_position(index: usize, total: usize) -> String {
    format!("Elemento {index} de {total}")
}

pub fn found(label: &str) -> String {
    format!("Encontrado: {label}")
}

pub fn font_size_changed(label: &str) -> String {
    format!("Tamaño de fuente cambiado a {label}")
}

pub fn contrast_changed(high: bool) -> String {
    let mode = if high { "alto contraste" } else { "normal" };
    format!("Modo de contraste cambiado a {mode}")
}

pub fn motion_changed(reduced: bool) -> String {
    let state = if reduced { "desactivadas" } else { "activadas" };
    format!("Animaciones {state}")
}
