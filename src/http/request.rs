//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Convierte los bytes recibidos por el socket en un [`Request`] estructurado.
//!
//! ## Formato
//!
//! ```text
//! POST /login HTTP/1.1\r\n
//! Host: localhost:8000\r\n
//! Cookie: sessionid=4f0c...; theme=dark\r\n
//! \r\n
//! username=admin&password=secret
//! ```
//!
//! 1. **Request Line**: `METHOD /path?query VERSION` (exactamente tres tokens)
//! 2. **Headers**: `Nombre: Valor`, separados en el primer `": "`
//! 3. **Línea vacía**: `\r\n\r\n` separa los headers del body
//! 4. **Body**: todo lo que sigue al separador, tal cual
//!
//! Un mensaje sin separador se trata como si no tuviera headers ni body.
//! El `Content-Length` del request se recalcula siempre a partir del body
//! real; el valor enviado por el cliente solo se usa para decidir cuánto
//! leer del socket ([`read_message`]).

use super::Headers;
use crate::router::{Hook, RouteTable};
use std::collections::HashMap;
use std::io::{self, Read};
use thiserror::Error;

/// Separador entre headers y body
const HEADER_DELIMITER: &[u8] = b"\r\n\r\n";

/// Tamaño de la lectura inicial del socket
const INITIAL_READ: usize = 8192;

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    PATCH,
    /// Preflight CORS; se responde antes de consultar los hooks
    OPTIONS,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no está en el conjunto soportado
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            "OPTIONS" => Ok(Method::OPTIONS),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores de parsing. Todos son terminales para la conexión.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Invalid request line format")]
    InvalidRequestLine,

    #[error("Request head is not valid UTF-8")]
    InvalidEncoding,

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),
}

/// Errores al leer un mensaje completo del socket
#[derive(Debug, Error)]
pub enum ReadError {
    /// El peer cerró sin enviar nada
    #[error("connection closed before any data was received")]
    Closed,

    #[error("timed out waiting for request data")]
    Timeout,

    #[error("request exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Request HTTP parseado. Uno por conexión.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string; `/` se reescribe a `/index.html`
    path: String,

    query_params: HashMap<String, String>,

    version: String,

    /// Incluye siempre `content-length` igual al largo real del body
    headers: Headers,

    /// Derivadas del header `Cookie`
    cookies: HashMap<String, String>,

    body: Vec<u8>,

    /// Hook resuelto en la tabla de rutas durante el parsing
    hook: Option<Hook>,
}

impl Request {
    /// Parsea un mensaje HTTP completo y resuelve su hook en `routes`
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use http_appserver::http::{Method, Request};
    /// use http_appserver::router::RouteTable;
    ///
    /// let raw = b"GET / HTTP/1.1\r\nCookie: sessionid=abc\r\n\r\n";
    /// let request = Request::parse(raw, &RouteTable::new()).unwrap();
    ///
    /// assert_eq!(request.method(), Method::GET);
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.cookie("sessionid"), Some("abc"));
    /// assert_eq!(request.header("Content-Length"), Some("0"));
    /// ```
    pub fn parse(buffer: &[u8], routes: &RouteTable) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let (head, body, has_delimiter) = match find_delimiter(buffer) {
            Some(pos) => (&buffer[..pos], &buffer[pos + HEADER_DELIMITER.len()..], true),
            None => (buffer, &buffer[buffer.len()..], false),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
        let mut lines = head.split("\r\n");
        let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;

        let (method, path, query_params, version) = Self::parse_request_line(request_line)?;

        let mut headers = if has_delimiter {
            Self::parse_headers(lines)
        } else {
            Headers::new()
        };

        let cookies = headers
            .get("cookie")
            .map(parse_cookies)
            .unwrap_or_default();

        // El largo real manda sobre el valor que envió el cliente
        headers.insert("Content-Length", body.len().to_string());

        let hook = routes.lookup(method, &path);

        Ok(Request {
            method,
            path,
            query_params,
            version,
            headers,
            cookies,
            body: body.to_vec(),
            hook,
        })
    }

    /// Formato: `GET /path?query HTTP/1.1`
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, HashMap<String, String>, String), ParseError> {
        let parts: Vec<&str> = line.split_ascii_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD PATH VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::parse(parts[0])?;
        let (path, query_params) = Self::parse_path_and_query(parts[1]);

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((method, canonical_path(&path), query_params, version))
    }

    /// Ejemplo: "/get-list?fresh=1" → ("/get-list", {"fresh": "1"})
    fn parse_path_and_query(target: &str) -> (String, HashMap<String, String>) {
        match target.split_once('?') {
            Some((path, query)) => (path.to_string(), parse_query_string(query)),
            None => (target.to_string(), HashMap::new()),
        }
    }

    /// Cada header: "Nombre: Valor". Las líneas sin `": "` se ignoran.
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Headers {
        let mut headers = Headers::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(": ") {
                headers.insert(name, value);
            }
        }
        headers
    }

    // === Accesores ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Obtiene un header (sin importar mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn hook(&self) -> Option<&Hook> {
        self.hook.as_ref()
    }
}

/// Reescribe `/` a `/index.html`. Aplicarla dos veces da el mismo resultado.
pub fn canonical_path(path: &str) -> String {
    if path == "/" {
        "/index.html".to_string()
    } else {
        path.to_string()
    }
}

/// Parsea el valor de un header `Cookie`: `a=1; b=2`.
/// Los segmentos sin `=` se descartan.
pub fn parse_cookies(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|segment| segment.trim().split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Ejemplo: "num=10&text=hello%20world" → {"num": "10", "text": "hello world"}
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for param in query.split('&').filter(|p| !p.is_empty()) {
        match param.split_once('=') {
            Some((key, value)) => params.insert(decode_component(key), decode_component(value)),
            None => params.insert(decode_component(param), String::new()),
        };
    }
    params
}

/// Decodifica un componente `application/x-www-form-urlencoded`
/// (`+` → espacio, luego `%XX`). Si la secuencia no es UTF-8 válida se
/// devuelve el texto tal cual.
pub fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn find_delimiter(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_DELIMITER.len())
        .position(|window| window == HEADER_DELIMITER)
}

/// Busca un `Content-Length` en los datos parciales ya leídos
fn declared_content_length(partial: &[u8]) -> Option<usize> {
    let head = match find_delimiter(partial) {
        Some(pos) => &partial[..pos],
        None => partial,
    };
    let head = String::from_utf8_lossy(head);
    head.split("\r\n").skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn body_len(partial: &[u8]) -> usize {
    find_delimiter(partial)
        .map(|pos| partial.len() - (pos + HEADER_DELIMITER.len()))
        .unwrap_or(0)
}

fn map_read_error(e: io::Error) -> ReadError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ReadError::Timeout,
        _ => ReadError::Io(e),
    }
}

/// Lee un mensaje HTTP del socket
///
/// Hace una lectura inicial acotada. Solo si en esos datos aparece un
/// `Content-Length`, sigue leyendo hasta que el body alcance ese largo o el
/// peer cierre la conexión. Nunca acumula más de `max_bytes`.
pub fn read_message<R: Read>(reader: &mut R, max_bytes: usize) -> Result<Vec<u8>, ReadError> {
    let mut chunk = [0u8; INITIAL_READ];

    let n = reader.read(&mut chunk).map_err(map_read_error)?;
    if n == 0 {
        return Err(ReadError::Closed);
    }

    let mut message = chunk[..n].to_vec();
    if message.len() > max_bytes {
        return Err(ReadError::TooLarge { limit: max_bytes });
    }

    let Some(declared) = declared_content_length(&message) else {
        return Ok(message);
    };
    if declared > max_bytes {
        return Err(ReadError::TooLarge { limit: max_bytes });
    }

    while body_len(&message) < declared {
        let n = reader.read(&mut chunk).map_err(map_read_error)?;
        if n == 0 {
            break;
        }
        message.extend_from_slice(&chunk[..n]);
        if message.len() > max_bytes {
            return Err(ReadError::TooLarge { limit: max_bytes });
        }
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::JsonMap;
    use std::io::Cursor;

    fn parse(raw: &[u8]) -> Result<Request, ParseError> {
        Request::parse(raw, &RouteTable::new())
    }

    /// Reader que entrega los datos en trozos, como un socket real
    struct ChunkedReader {
        chunks: Vec<Vec<u8>>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    struct TimeoutReader;

    impl Read for TimeoutReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "timeout"))
        }
    }

    #[test]
    fn test_parse_simple_get() {
        let request = parse(b"GET /login.html HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/login.html");
        assert_eq!(request.version(), "HTTP/1.1");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_root_rewritten_to_index() {
        let request = parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/index.html");

        // Idempotente
        assert_eq!(canonical_path(request.path()), "/index.html");
        assert_eq!(canonical_path(&canonical_path("/")), "/index.html");
    }

    #[test]
    fn test_parse_with_query_params() {
        let request = parse(b"GET /get-list?user=bob%20smith&all HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(request.path(), "/get-list");
        assert_eq!(request.query_param("user"), Some("bob smith"));
        assert_eq!(request.query_param("all"), Some(""));
    }

    #[test]
    fn test_headers_lowercased_and_last_wins() {
        let raw = b"GET /a.html HTTP/1.1\r\nHost: example\r\nX-Trace: one\r\nx-trace: two\r\nbroken-line\r\n\r\n";
        let request = parse(raw).unwrap();

        assert_eq!(request.header("host"), Some("example"));
        assert_eq!(request.header("HOST"), Some("example"));
        assert_eq!(request.header("X-Trace"), Some("two"));
        assert_eq!(request.header("broken-line"), None);
    }

    #[test]
    fn test_cookies_parsed_and_malformed_skipped() {
        let raw = b"GET /index.html HTTP/1.1\r\nCookie: sessionid=abc-123; junk; theme=dark=blue\r\n\r\n";
        let request = parse(raw).unwrap();

        assert_eq!(request.cookie("sessionid"), Some("abc-123"));
        assert_eq!(request.cookie("theme"), Some("dark=blue"));
        assert_eq!(request.cookies().len(), 2);
    }

    #[test]
    fn test_body_verbatim_and_content_length_recomputed() {
        let raw = b"POST /login HTTP/1.1\r\nContent-Length: 999\r\n\r\nusername=a&password=b\r\nmore";
        let request = parse(raw).unwrap();

        assert_eq!(request.body(), b"username=a&password=b\r\nmore");
        assert_eq!(request.header("Content-Length"), Some("27"));
    }

    #[test]
    fn test_content_length_counts_bytes_not_chars() {
        let raw = "POST /send-peer HTTP/1.1\r\n\r\nmensaje=ñandú".as_bytes();
        let request = parse(raw).unwrap();

        assert_eq!(request.header("content-length"), Some(request.body().len().to_string().as_str()));
        assert_eq!(request.body().len(), 15);
    }

    #[test]
    fn test_message_without_delimiter_is_headerless() {
        let request = parse(b"GET /index.html HTTP/1.1\r\nHost: x").unwrap();

        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.header("host"), None);
        assert!(request.body().is_empty());
        assert_eq!(request.header("content-length"), Some("0"));
    }

    #[test]
    fn test_invalid_request_line() {
        assert_eq!(parse(b"GET\r\n\r\n").unwrap_err(), ParseError::InvalidRequestLine);
        assert_eq!(
            parse(b"GET / HTTP/1.1 extra\r\n\r\n").unwrap_err(),
            ParseError::InvalidRequestLine
        );
    }

    #[test]
    fn test_unsupported_method() {
        let result = parse(b"BREW /pot HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnsupportedMethod(m)) if m == "BREW"));
    }

    #[test]
    fn test_invalid_version() {
        let result = parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(parse(b"").unwrap_err(), ParseError::EmptyRequest);
        assert_eq!(parse(b"\r\n\r\n").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_invalid_utf8_head() {
        let result = parse(b"GET /\xff\xfe HTTP/1.1\r\n\r\n");
        assert_eq!(result.unwrap_err(), ParseError::InvalidEncoding);
    }

    #[test]
    fn test_hook_resolved_at_parse_time() {
        let mut routes = RouteTable::new();
        routes.register(Method::POST, "/submit-info", |_, _| Ok(JsonMap::new()));

        let hooked = Request::parse(b"POST /submit-info HTTP/1.1\r\n\r\n", &routes).unwrap();
        assert!(hooked.hook().is_some());

        let other_method = Request::parse(b"GET /submit-info HTTP/1.1\r\n\r\n", &routes).unwrap();
        assert!(other_method.hook().is_none());
    }

    #[test]
    fn test_parse_cookies_helper() {
        let cookies = parse_cookies("a=1;b=2 ; =empty; c");
        assert_eq!(cookies.get("a").map(String::as_str), Some("1"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("2"));
        assert_eq!(cookies.get("").map(String::as_str), Some("empty"));
        assert!(!cookies.contains_key("c"));
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("hello+world"), "hello world");
        assert_eq!(decode_component("a%40b.com"), "a@b.com");
        assert_eq!(decode_component("plain"), "plain");
    }

    #[test]
    fn test_read_message_without_content_length() {
        let mut reader = Cursor::new(b"GET /index.html HTTP/1.1\r\n\r\n".to_vec());
        let message = read_message(&mut reader, 1024).unwrap();
        assert_eq!(message, b"GET /index.html HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn test_read_message_follows_content_length() {
        let mut reader = ChunkedReader {
            chunks: vec![
                b"POST /login HTTP/1.1\r\nContent-Length: 10\r\n\r\nuser".to_vec(),
                b"name".to_vec(),
                b"=a".to_vec(),
                b"IGNORED".to_vec(),
            ],
        };

        let message = read_message(&mut reader, 1024).unwrap();
        assert!(message.ends_with(b"\r\n\r\nusername=a"));
    }

    #[test]
    fn test_read_message_stops_on_peer_close() {
        let mut reader = ChunkedReader {
            chunks: vec![b"POST /x HTTP/1.1\r\ncontent-length: 50\r\n\r\nshort".to_vec()],
        };

        let message = read_message(&mut reader, 1024).unwrap();
        assert!(message.ends_with(b"short"));
    }

    #[test]
    fn test_read_message_closed() {
        let mut reader = Cursor::new(Vec::new());
        assert!(matches!(read_message(&mut reader, 1024), Err(ReadError::Closed)));
    }

    #[test]
    fn test_read_message_too_large() {
        let mut reader = Cursor::new(b"POST /x HTTP/1.1\r\nContent-Length: 5000\r\n\r\n".to_vec());
        assert!(matches!(
            read_message(&mut reader, 1024),
            Err(ReadError::TooLarge { limit: 1024 })
        ));

        let mut reader = Cursor::new(vec![b'a'; 200]);
        assert!(matches!(read_message(&mut reader, 100), Err(ReadError::TooLarge { .. })));
    }

    #[test]
    fn test_read_message_timeout() {
        assert!(matches!(read_message(&mut TimeoutReader, 1024), Err(ReadError::Timeout)));
    }
}
