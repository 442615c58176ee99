//! Visitor and session identifiers kept in client-side storage.

use rand::Rng;
use std::collections::HashMap;

pub const VISITOR_ID_KEY: &str = "folio_visitor_id";
pub const SESSION_ID_KEY: &str = "folio_session_id";
pub const HAS_VISITED_KEY: &str = "folio_has_visited";
pub const LAST_VISIT_DATE_KEY: &str = "folio_last_visit_date";

const ID_RANDOM_LENGTH: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Key/value storage owned by the visitor's browser.
pub trait ClientStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// `<prefix>_<unix millis>_<9 base36 chars>`. Not a security token.
pub fn generate_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_RANDOM_LENGTH)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!(
        "{}_{}_{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}

fn get_or_create<S: ClientStorage + ?Sized>(storage: &mut S, key: &str, prefix: &str) -> String {
    match storage.get(key).filter(|v| !v.is_empty()) {
        Some(id) => id,
        None => {
            let id = generate_id(prefix);
            storage.set(key, &id);
            id
        }
    }
}

/// Generated once and reused until the visitor clears their storage.
pub fn visitor_id<S: ClientStorage + ?Sized>(storage: &mut S) -> String {
    get_or_create(storage, VISITOR_ID_KEY, "visitor")
}

/// No expiry check is made here; how long it lives is up to the storage
/// backend (the cookie adapter makes it a browser-session cookie). The
/// per-day session boundary used for counting is `LAST_VISIT_DATE_KEY`.
pub fn session_id<S: ClientStorage + ?Sized>(storage: &mut S) -> String {
    get_or_create(storage, SESSION_ID_KEY, "session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generate_id("visitor");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "visitor");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_RANDOM_LENGTH);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_visitor_id_is_stable_until_cleared() {
        let mut storage = MemoryStorage::new();
        let first = visitor_id(&mut storage);
        assert_eq!(visitor_id(&mut storage), first);

        storage.clear();
        assert_ne!(visitor_id(&mut storage), first);
    }

    #[test]
    fn test_session_and_visitor_ids_are_independent() {
        let mut storage = MemoryStorage::new();
        let visitor = visitor_id(&mut storage);
        let session = session_id(&mut storage);
        assert!(visitor.starts_with("visitor_"));
        assert!(session.starts_with("session_"));

        storage.remove(SESSION_ID_KEY);
        assert_eq!(visitor_id(&mut storage), visitor);
        assert_ne!(session_id(&mut storage), session);
    }
}
