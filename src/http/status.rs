//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos que puede emitir el servidor de aplicaciones y el proxy:
//!
//! - **2xx**: 200 OK (hooks, estáticos, preflight CORS)
//! - **3xx**: 302 Found (redirección al login)
//! - **4xx**: 400, 401, 403, 404, 408, 413
//! - **5xx**: 500, 502

/// Códigos de estado que soporta el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,

    /// 302 Found - Sesión ausente o inválida, se redirige a la página de login
    Found = 302,

    /// 400 Bad Request - Request line malformada
    BadRequest = 400,

    /// 401 Unauthorized - Credenciales incorrectas en el login
    Unauthorized = 401,

    /// 403 Forbidden - Intento de salir del directorio base (path traversal)
    Forbidden = 403,

    /// 404 Not Found - Archivo estático o virtual host inexistente
    NotFound = 404,

    /// 408 Request Timeout - El cliente no terminó de enviar el request a tiempo
    RequestTimeout = 408,

    /// 413 Payload Too Large - El request excede el límite configurado
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - Error de lectura o tipo MIME no soportado
    InternalServerError = 500,

    /// 502 Bad Gateway - El proxy no pudo hablar con el backend
    BadGateway = 502,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use http_appserver::http::StatusCode;
    /// assert_eq!(StatusCode::Found.as_u16(), 302);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Found => "Found",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::BadGateway => "Bad Gateway",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
