//! # Sesiones y Autenticación
//!
//! - `store`: almacén `sessionid → usuario` con vencimiento
//! - `gate`: decide si un request estático se sirve o se redirige al login
//! - `accounts`: credenciales y decodificación del formulario de login
//!
//! ## Flujo de login
//!
//! ```text
//! POST /login (username=..&password=..)
//!     ├── credenciales válidas → nueva sesión, Set-Cookie, se sirve /index.html
//!     └── inválidas            → 401 con body fijo, se cierra la conexión
//! ```

pub mod accounts;
pub mod gate;
pub mod store;

pub use accounts::{Account, Accounts, AccountsError};
pub use gate::GateDecision;
pub use store::{Session, SessionStore};

/// Resultado de procesar un formulario de login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated {
        username: String,
        session_id: String,
    },
    Rejected,
}

impl LoginOutcome {
    /// Valor del header `Set-Cookie` para una sesión nueva
    pub fn set_cookie(&self) -> Option<String> {
        match self {
            LoginOutcome::Authenticated { session_id, .. } => Some(set_cookie_value(session_id)),
            LoginOutcome::Rejected => None,
        }
    }
}

/// `sessionid=<token>; Path=/; HttpOnly`
pub fn set_cookie_value(session_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly", gate::SESSION_COOKIE, session_id)
}

/// Procesa el body de un `POST /login`
///
/// Si el par usuario/contraseña existe, crea una sesión en `sessions`.
/// Es la única operación que inserta sesiones.
pub fn login(body: &[u8], accounts: &Accounts, sessions: &SessionStore) -> LoginOutcome {
    let form = accounts::parse_form(&String::from_utf8_lossy(body));

    let (Some(username), Some(password)) = (form.get("username"), form.get("password")) else {
        return LoginOutcome::Rejected;
    };

    if !accounts.verify(username, password) {
        return LoginOutcome::Rejected;
    }

    let session_id = sessions.create(username);
    LoginOutcome::Authenticated {
        username: username.clone(),
        session_id,
    }
}
