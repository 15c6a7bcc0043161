//! # Cuentas de Usuario
//! src/session/accounts.rs
//!
//! Lista de credenciales consultada por el login. Se carga una vez al
//! arrancar desde un archivo JSON:
//!
//! ```json
//! [
//!   { "username": "admin", "password": "admin123" },
//!   { "username": "guest", "password": "guest" }
//! ]
//! ```

use crate::http::request::decode_component;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("cannot read accounts file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid accounts file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Credenciales conocidas por el servidor
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    accounts: Vec<Account>,
}

impl Accounts {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Carga las cuentas desde un archivo JSON
    pub fn load(path: &Path) -> Result<Self, AccountsError> {
        let reader = BufReader::new(File::open(path)?);
        let accounts: Vec<Account> = serde_json::from_reader(reader)?;
        Ok(Self { accounts })
    }

    /// Como [`Accounts::load`], pero un archivo ausente o inválido deja la
    /// lista vacía (todo login falla con 401) en lugar de abortar.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(accounts) => {
                tracing::info!(path = %path.display(), count = accounts.len(), "Cuentas cargadas");
                accounts
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Sin cuentas: todo login será rechazado");
                Self::default()
            }
        }
    }

    /// Verifica un par usuario/contraseña
    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.accounts
            .iter()
            .any(|acc| acc.username == username && acc.password == password)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Decodifica un body `application/x-www-form-urlencoded`
///
/// Ejemplo: "username=admin&password=s3cr%3Dt" → {"username": "admin", "password": "s3cr=t"}
pub fn parse_form(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (decode_component(key.trim()), decode_component(value.trim())))
        .collect()
}
