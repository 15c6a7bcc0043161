//! # Archivos Estáticos
//! src/server/static_files.rs
//!
//! Resuelve un path de request a un archivo bajo la raíz estática:
//!
//! ```text
//! /css/style.css → text/css → <root>/static/css/style.css
//! /index.html    → text/html → <root>/www/index.html
//! ```
//!
//! Resultados de la lectura:
//! - éxito → status recibido del gate, body = contenido del archivo
//! - archivo inexistente → 404 con body fijo
//! - otro error de I/O → 500 con body fijo
//! - path que escapa del directorio base → 403 con body fijo
//!
//! Un tipo MIME no soportado se devuelve como [`MimeError`] para que el
//! manejador de conexión decida antes de escribir en el socket.

use crate::http::mime::{self, MimeError};
use crate::http::response::{FORBIDDEN_BODY, NOT_FOUND_BODY, SERVER_ERROR_BODY};
use crate::http::{Response, StatusCode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Servidor de archivos estáticos sobre una raíz en disco
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Construye la respuesta para `path` con el `status` ya decidido
    pub fn serve(&self, path: &str, status: StatusCode) -> Result<Response, MimeError> {
        let kind = mime::resolve(path)?;

        if !is_safe_path(path) {
            tracing::warn!(path = %path, "Path traversal bloqueado");
            return Ok(Response::fixed(StatusCode::Forbidden, FORBIDDEN_BODY));
        }

        let base_dir = self.root.join(kind.base_dir);
        let file_path = base_dir.join(path.trim_start_matches('/'));
        tracing::debug!(file = %file_path.display(), "Sirviendo objeto");

        let content = match read_within(&base_dir, &file_path) {
            Ok(content) => content,
            Err(StaticReadError::Escapes) => {
                tracing::warn!(path = %path, "Path resuelto fuera del directorio base");
                return Ok(Response::fixed(StatusCode::Forbidden, FORBIDDEN_BODY));
            }
            Err(StaticReadError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(file = %file_path.display(), "Archivo no encontrado");
                return Ok(Response::fixed(StatusCode::NotFound, NOT_FOUND_BODY));
            }
            Err(StaticReadError::Io(e)) => {
                tracing::error!(file = %file_path.display(), error = %e, "Error leyendo archivo");
                return Ok(Response::fixed(StatusCode::InternalServerError, SERVER_ERROR_BODY));
            }
        };

        Ok(Response::new(status)
            .with_header("Content-Type", &kind.content_type)
            .with_body_bytes(content))
    }
}

enum StaticReadError {
    Escapes,
    Io(io::Error),
}

impl From<io::Error> for StaticReadError {
    fn from(e: io::Error) -> Self {
        StaticReadError::Io(e)
    }
}

/// Lee `file` solo si su ruta canónica queda dentro de `base`
fn read_within(base: &Path, file: &Path) -> Result<Vec<u8>, StaticReadError> {
    let canonical_file = file.canonicalize()?;
    let canonical_base = base.canonicalize()?;

    if !canonical_file.starts_with(&canonical_base) {
        return Err(StaticReadError::Escapes);
    }

    Ok(fs::read(canonical_file)?)
}

/// Rechaza componentes `..` y bytes nulos, también en su forma `%XX`
fn is_safe_path(path: &str) -> bool {
    let decoded = urlencoding::decode(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string());

    if path.contains('\0') || decoded.contains('\0') {
        return false;
    }

    !path.split('/').any(|c| c == "..") && !decoded.split(['/', '\\']).any(|c| c == "..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, StaticFiles) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("www")).unwrap();
        fs::create_dir_all(dir.path().join("static/css")).unwrap();
        fs::write(dir.path().join("www/index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("www/login.html"), "<form></form>").unwrap();
        fs::write(dir.path().join("static/css/style.css"), "body{}").unwrap();
        fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
        let files = StaticFiles::new(dir.path());
        (dir, files)
    }

    #[test]
    fn test_serve_html() {
        let (_dir, files) = fixture();
        let response = files.serve("/index.html", StatusCode::Ok).unwrap();

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body(), b"<h1>home</h1>");
        assert_eq!(response.header("Content-Type"), Some("text/html"));
        assert_eq!(response.header("Content-Length"), Some("13"));
    }

    #[test]
    fn test_serve_css_from_static_tree() {
        let (_dir, files) = fixture();
        let response = files.serve("/css/style.css", StatusCode::Ok).unwrap();

        assert_eq!(response.body(), b"body{}");
        assert_eq!(response.header("Content-Type"), Some("text/css"));
    }

    #[test]
    fn test_status_from_gate_is_kept() {
        let (_dir, files) = fixture();
        let response = files.serve("/login.html", StatusCode::Found).unwrap();

        assert_eq!(response.status(), StatusCode::Found);
        assert_eq!(response.body(), b"<form></form>");
    }

    #[test]
    fn test_missing_file_is_404_not_stale_status() {
        let (_dir, files) = fixture();
        let response = files.serve("/does-not-exist.html", StatusCode::Ok).unwrap();

        assert_eq!(response.status(), StatusCode::NotFound);
        assert_eq!(response.body(), NOT_FOUND_BODY);
    }

    #[test]
    fn test_directory_read_is_500() {
        let (dir, files) = fixture();
        fs::create_dir_all(dir.path().join("www/folder.html")).unwrap();

        let response = files.serve("/folder.html", StatusCode::Ok).unwrap();
        assert_eq!(response.status(), StatusCode::InternalServerError);
        assert_eq!(response.body(), SERVER_ERROR_BODY);
    }

    #[test]
    fn test_traversal_blocked() {
        let (_dir, files) = fixture();

        let response = files.serve("/../secret.txt", StatusCode::Ok).unwrap();
        assert_eq!(response.status(), StatusCode::Forbidden);

        let response = files.serve("/css/%2e%2e/%2e%2e/secret.txt", StatusCode::Ok).unwrap();
        assert_eq!(response.status(), StatusCode::Forbidden);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_blocked() {
        let (dir, files) = fixture();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            dir.path().join("static/leak.txt"),
        )
        .unwrap();

        let response = files.serve("/leak.txt", StatusCode::Ok).unwrap();
        assert_eq!(response.status(), StatusCode::Forbidden);
    }

    #[test]
    fn test_unsupported_mime_is_error() {
        let (_dir, files) = fixture();
        let result = files.serve("/fonts/app.woff2", StatusCode::Ok);
        assert!(matches!(result, Err(MimeError::Unsupported(_))));
    }

    #[test]
    fn test_is_safe_path() {
        assert!(is_safe_path("/index.html"));
        assert!(is_safe_path("/files/report..final.html"));
        assert!(!is_safe_path("/../etc/passwd"));
        assert!(!is_safe_path("/a/%2E%2E/b"));
        assert!(!is_safe_path("/a%00.html"));
    }
}
