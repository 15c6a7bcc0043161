//! # Headers HTTP
//! src/http/headers.rs
//!
//! Mapa de headers insensible a mayúsculas. Las claves se guardan en
//! minúsculas; una inserción posterior con la misma clave sobrescribe
//! la anterior (no hay headers multi-valor).

use std::collections::HashMap;

/// Headers de un request, indexados por nombre en minúsculas
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta un header, reemplazando cualquier valor previo
    ///
    /// # Ejemplo
    /// ```
    /// use http_appserver::http::Headers;
    ///
    /// let mut headers = Headers::new();
    /// headers.insert("Content-Type", "text/html");
    /// assert_eq!(headers.get("content-type"), Some("text/html"));
    /// assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
    /// ```
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.inner.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Itera sobre (nombre en minúsculas, valor)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
