//! # Módulo HTTP
//!
//! Motor del protocolo HTTP/1.1 implementado a mano:
//!
//! - Lectura de un mensaje desde el socket (guiada por `Content-Length`)
//! - Parsing del request: request line, headers, cookies y body
//! - Construcción de responses con el conjunto de headers estándar
//! - Códigos de estado
//! - Resolución de tipos MIME y directorios base para archivos estáticos
//!
//! Una conexión transporta exactamente un request y una respuesta
//! (`Connection: close`); no hay keep-alive ni chunked encoding.

pub mod headers;
pub mod mime;
pub mod request;
pub mod response;
pub mod status;

pub use headers::Headers;
pub use request::{read_message, Method, ParseError, ReadError, Request};
pub use response::Response;
pub use status::StatusCode;
