//! `localStorage` backing for the cached session

use larkauth_core::{SessionCache, SessionError, SessionStore};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// The browser's `localStorage`
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// Open `window.localStorage`
    pub fn open() -> Result<Self, SessionError> {
        let window = web_sys::window().ok_or_else(|| SessionError::storage("no window"))?;
        let storage = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| SessionError::storage("localStorage is unavailable"))?;
        Ok(Self { storage })
    }
}

impl SessionStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.storage.get_item(key).map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.storage.set_item(key, value).map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.storage.remove_item(key).map_err(js_error)
    }
}

fn js_error(err: JsValue) -> SessionError {
    SessionError::storage(
        err.as_string()
            .unwrap_or_else(|| format!("{err:?}")),
    )
}

/// Session cache over `localStorage`
pub fn session_cache() -> Result<SessionCache<LocalStorageStore>, SessionError> {
    LocalStorageStore::open().map(SessionCache::new)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use larkauth_core::{AUTH_DATA_KEY, ExistingSession};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_local_storage_round_trip() {
        let store = LocalStorageStore::open().unwrap();
        store.set("larkauth-test", "value").unwrap();
        assert_eq!(store.get("larkauth-test").unwrap().as_deref(), Some("value"));
        store.remove("larkauth-test").unwrap();
        assert_eq!(store.get("larkauth-test").unwrap(), None);
    }

    #[wasm_bindgen_test]
    fn test_corrupt_record_is_cleared() {
        let cache = session_cache().unwrap();
        cache.store().set(AUTH_DATA_KEY, "not json").unwrap();
        let state = cache.check_existing(chrono::Utc::now()).unwrap();
        assert_eq!(state, ExistingSession::Corrupt);
        assert_eq!(cache.store().get(AUTH_DATA_KEY).unwrap(), None);
    }
}
