//! # Tipos MIME y Directorios Base
//! src/http/mime.rs
//!
//! Deriva el `Content-Type` de la extensión del path y elige en qué árbol
//! del disco vive el archivo según la familia del tipo:
//!
//! | Familia                                   | Directorio |
//! |-------------------------------------------|------------|
//! | `text/html` y otros `text/*`              | `www/`     |
//! | `text/{plain,css,csv,xml,javascript}`     | `static/`  |
//! | `application/javascript`, `image/*`       | `static/`  |
//! | resto de `application/*`                  | `apps/`    |
//! | `video/*`                                 | `videos/`  |
//! | `audio/*`                                 | `audios/`  |
//!
//! Cualquier otra familia (`font/*`, `model/*`, ...) es un error de
//! configuración y se reporta con [`MimeError`] antes de escribir nada en
//! el socket.

use thiserror::Error;

/// Tipo por defecto cuando la extensión es desconocida o no existe
pub const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MimeError {
    #[error("unsupported MIME type: {0}")]
    Unsupported(String),
}

/// Resultado de resolver un path estático
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticKind {
    pub content_type: String,
    /// Subdirectorio relativo a la raíz estática, con `/` final
    pub base_dir: &'static str,
}

/// Adivina el tipo MIME a partir de la extensión
pub fn mime_for_path(path: &str) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_MIME.to_string())
}

/// Clasifica un tipo MIME `tipo/subtipo` en su directorio base
pub fn classify(mime: &str) -> Result<StaticKind, MimeError> {
    let (main_type, sub_type) = mime
        .split_once('/')
        .ok_or_else(|| MimeError::Unsupported(mime.to_string()))?;

    let base_dir = match (main_type, sub_type) {
        ("text", "plain" | "css" | "csv" | "xml" | "javascript") => "static/",
        ("text", _) => "www/",
        ("image", _) => "static/",
        ("application", "javascript" | "ecmascript") => "static/",
        ("application", _) => "apps/",
        ("video", _) => "videos/",
        ("audio", _) => "audios/",
        _ => return Err(MimeError::Unsupported(mime.to_string())),
    };

    Ok(StaticKind {
        content_type: mime.to_string(),
        base_dir,
    })
}

/// Resuelve el tipo y el directorio base de un path de request
///
/// # Ejemplo
/// ```
/// use http_appserver::http::mime::resolve;
///
/// let kind = resolve("/index.html").unwrap();
/// assert_eq!(kind.content_type, "text/html");
/// assert_eq!(kind.base_dir, "www/");
/// ```
pub fn resolve(path: &str) -> Result<StaticKind, MimeError> {
    classify(&mime_for_path(path))
}
