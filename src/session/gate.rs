//! # Control de Acceso por Sesión
//! src/session/gate.rs
//!
//! Decide qué se sirve cuando un request cae al servidor de archivos
//! estáticos sin hook:
//!
//! 1. Prefijos públicos (login, css, js, imágenes, static) → 200
//! 2. Cookie `sessionid` válida → 200
//! 3. Cualquier otro caso → 302 a `/login.html`

use super::SessionStore;
use crate::http::request::canonical_path;
use crate::http::StatusCode;

/// Página de login (pública)
pub const LOGIN_PAGE: &str = "/login.html";

/// Página que se sirve tras un login exitoso
pub const LANDING_PAGE: &str = "/index.html";

/// Endpoint que recibe el formulario de login
pub const LOGIN_PATH: &str = "/login";

/// Nombre de la cookie de sesión
pub const SESSION_COOKIE: &str = "sessionid";

/// Paths que no requieren sesión
pub const PUBLIC_PREFIXES: [&str; 5] = ["/login.html", "/css/", "/js/", "/images/", "/static/"];

/// Decisión del gate para un request estático
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Servir `path` con 200
    Allow { path: String },

    /// Servir la página de login con 302 y `Location`
    Redirect { location: &'static str },
}

impl GateDecision {
    pub fn status(&self) -> StatusCode {
        match self {
            GateDecision::Allow { .. } => StatusCode::Ok,
            GateDecision::Redirect { .. } => StatusCode::Found,
        }
    }

    /// Path que termina sirviéndose desde disco
    pub fn served_path(&self) -> &str {
        match self {
            GateDecision::Allow { path } => path,
            GateDecision::Redirect { location } => location,
        }
    }
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Extrae el valor de `sessionid=` del texto crudo del header `Cookie`.
/// El valor termina en `;` o al final del string.
///
/// # Ejemplo
/// ```
/// use http_appserver::session::gate::extract_session_id;
///
/// assert_eq!(extract_session_id("theme=dark; sessionid=abc; x=1"), Some("abc"));
/// assert_eq!(extract_session_id("sessionid=xyz"), Some("xyz"));
/// assert_eq!(extract_session_id("theme=dark"), None);
/// ```
pub fn extract_session_id(cookie_header: &str) -> Option<&str> {
    let marker = "sessionid=";
    let start = cookie_header.find(marker)? + marker.len();
    let rest = &cookie_header[start..];
    let value = rest.split(';').next().unwrap_or("").trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Evalúa el gate para `path` con el header `Cookie` del request
pub fn check(path: &str, cookie_header: Option<&str>, sessions: &SessionStore) -> GateDecision {
    if is_public(path) {
        return GateDecision::Allow { path: path.to_string() };
    }

    let authenticated = cookie_header
        .and_then(extract_session_id)
        .map(|sid| sessions.contains(sid))
        .unwrap_or(false);

    if authenticated {
        GateDecision::Allow { path: canonical_path(path) }
    } else {
        GateDecision::Redirect { location: LOGIN_PAGE }
    }
}
