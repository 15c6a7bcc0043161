//! # Almacén de Sesiones
//! src/session/store.rs
//!
//! Mapa `sessionid → usuario` compartido por todos los threads de conexión.
//! Las escrituras (login) y lecturas (cada GET protegido) pasan por un
//! `RwLock`. Las sesiones vencen tras un TTL configurable; las vencidas se
//! eliminan al consultarlas o con [`SessionStore::purge_expired`], que el
//! servidor invoca periódicamente desde un thread de limpieza.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Sesión autenticada
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub created_at: Instant,
}

impl Session {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.created_at.elapsed() >= ttl,
            None => false,
        }
    }
}

/// Almacén de sesiones thread-safe
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,

    /// `None` = las sesiones duran lo que dure el proceso
    ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Crea una sesión nueva para `username` y retorna su identificador
    pub fn create(&self, username: &str) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = Session {
            username: username.to_string(),
            created_at: Instant::now(),
        };

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.clone(), session);

        session_id
    }

    /// Retorna el usuario de una sesión vigente
    pub fn validate(&self, session_id: &str) -> Option<String> {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(session_id) {
                None => return None,
                Some(session) if !session.is_expired(self.ttl) => {
                    return Some(session.username.clone())
                }
                Some(_) => {}
            }
        }

        // Vencida: se elimina al consultarla
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
        None
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.validate(session_id).is_some()
    }

    /// Elimina todas las sesiones vencidas; retorna cuántas borró
    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_create_and_validate() {
        let store = SessionStore::default();
        let sid = store.create("admin");

        assert_eq!(store.validate(&sid), Some("admin".to_string()));
        assert!(store.contains(&sid));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::default();
        assert_eq!(store.validate("not-a-session"), None);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let store = SessionStore::default();
        let a = store.create("admin");
        let b = store.create("admin");
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_session_is_evicted_on_lookup() {
        let store = SessionStore::new(Some(Duration::ZERO));
        let sid = store.create("admin");

        assert_eq!(store.validate(&sid), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = SessionStore::new(Some(Duration::ZERO));
        store.create("a");
        store.create("b");

        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let store = SessionStore::new(None);
        store.create("a");
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_logins() {
        let store = Arc::new(SessionStore::default());

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.create(&format!("user{}", i)))
            })
            .collect();

        let ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(store.len(), 10);
        for id in &ids {
            assert!(store.contains(id));
        }
    }
}
