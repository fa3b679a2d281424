//! Browser LocalStorage access
//!
//! Native builds have no storage: reads miss and writes are dropped.

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Raw string stored under `key`
#[cfg(target_arch = "wasm32")]
pub fn read(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn read(_key: &str) -> Option<String> {
    None
}

#[cfg(target_arch = "wasm32")]
pub fn write(key: &str, value: &str) {
    let Some(storage) = local_storage() else {
        return;
    };
    if let Err(e) = storage.set_item(key, value) {
        log::warn!("Could not store {key}: {e:?}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write(_key: &str, _value: &str) {}

/// Deserialize the value under `key`. Corrupt entries are logged and ignored.
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = read(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring stored {key}: {e}");
            None
        }
    }
}

pub fn save_json<T: Serialize>(key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => write(key, &json),
        Err(e) => log::warn!("Could not serialize {key}: {e}"),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_native_reads_miss() {
        save_json("fish_frenzy_test", &42u32);
        assert_eq!(read("fish_frenzy_test"), None);
        assert_eq!(load_json::<u32>("fish_frenzy_test"), None);
    }
}
