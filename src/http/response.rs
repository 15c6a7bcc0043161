//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.1 y convertirlas a bytes.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Date: Mon, 13 Oct 2025 10:00:00 GMT\r\n
//! Server: RedUnix-HTTP/1.1\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 15\r\n
//! Cache-Control: no-cache\r\n
//! Pragma: no-cache\r\n
//! Connection: close\r\n
//! \r\n
//! {"status":"ok"}
//! ```
//!
//! Toda respuesta que sale del servidor pasa por
//! [`Response::with_standard_headers`], que fija el conjunto de headers
//! común y un `Content-Length` igual al largo real del body.

use super::{Headers, StatusCode};
use crate::router::JsonMap;
use std::collections::HashMap;

/// Valor del header `Server`
pub const SERVER_NAME: &str = "RedUnix-HTTP/1.1";

/// Body fijo para archivos estáticos inexistentes
pub const NOT_FOUND_BODY: &[u8] = b"404 Not Found";

/// Body fijo para errores de lectura y tipos MIME no soportados
pub const SERVER_ERROR_BODY: &[u8] = b"500 Internal Server Error";

/// Body fijo para intentos de path traversal
pub const FORBIDDEN_BODY: &[u8] = b"403 Forbidden";

/// Body fijo para un login fallido
pub const UNAUTHORIZED_BODY: &[u8] =
    b"<html><head><title>401 Unauthorized</title></head><body>401 Unauthorized</body></html>";

const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type";

/// Respuesta HTTP completa. Una por request, nunca se reutiliza.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,

    /// Headers de la respuesta. Un nombre repetido sobrescribe al anterior.
    headers: HashMap<String, String>,

    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    ///
    /// # Ejemplo
    /// ```
    /// use http_appserver::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Ok);
    /// assert!(response.body().is_empty());
    /// ```
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Establece el body y su `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self.headers
            .insert("Content-Length".to_string(), self.body.len().to_string());
        self
    }

    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Headers de CORS permisivos
    pub fn with_cors(self) -> Self {
        self.with_header("Access-Control-Allow-Origin", "*")
            .with_header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
            .with_header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
    }

    /// Respuesta a un preflight `OPTIONS`: 200, CORS y body vacío
    pub fn preflight() -> Self {
        Self::new(StatusCode::Ok).with_cors().with_body_bytes(Vec::new())
    }

    /// Serializa el resultado de un hook como JSON (200 + CORS)
    ///
    /// # Ejemplo
    /// ```
    /// use http_appserver::http::{Response, StatusCode};
    /// use http_appserver::router::JsonMap;
    ///
    /// let mut result = JsonMap::new();
    /// result.insert("status".into(), "ok".into());
    ///
    /// let response = Response::from_hook_result(&result).unwrap();
    /// assert_eq!(response.status(), StatusCode::Ok);
    /// assert_eq!(response.body(), br#"{"status":"ok"}"#);
    /// ```
    pub fn from_hook_result(result: &JsonMap) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(result)?;
        Ok(Self::new(StatusCode::Ok)
            .with_header("Content-Type", "application/json")
            .with_cors()
            .with_body_bytes(body))
    }

    /// Respuesta con uno de los bodies fijos de error
    pub fn fixed(status: StatusCode, body: &[u8]) -> Self {
        Self::new(status)
            .with_header("Content-Type", "text/html")
            .with_body_bytes(body.to_vec())
    }

    /// Completa el conjunto de headers que lleva toda respuesta:
    /// `Date`, `Server`, `Content-Type` (por defecto `text/html`),
    /// `Content-Length`, `Cache-Control`, `Pragma`, `Connection` y el
    /// `User-Agent` del cliente si lo envió.
    pub fn with_standard_headers(mut self, request_headers: Option<&Headers>) -> Self {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();

        self.add_header("Date", &date);
        self.add_header("Server", SERVER_NAME);
        if self.header("Content-Type").is_none() {
            self.add_header("Content-Type", "text/html");
        }
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self.add_header("Cache-Control", "no-cache");
        self.add_header("Pragma", "no-cache");
        self.add_header("Connection", "close");

        if let Some(agent) = request_headers.and_then(|h| h.get("user-agent")) {
            self.add_header("User-Agent", agent);
        }

        self
    }

    /// Convierte la respuesta a bytes listos para el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(256 + self.body.len());

        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result.extend_from_slice(&self.body);

        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Busca un header sin importar mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
