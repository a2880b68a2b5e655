//! Runtime configuration read from the hosting page

use wasm_bindgen::prelude::*;

/// Backend used when the page does not set `window.BACKEND_URL`
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[wasm_bindgen(inline_js = "
export function backend_url_override() {
    if (typeof window === 'undefined' || !window.BACKEND_URL) {
        return undefined;
    }
    return String(window.BACKEND_URL);
}
")]
extern "C" {
    #[wasm_bindgen(js_name = backend_url_override)]
    fn backend_url_override() -> Option<String>;
}

/// Base URL of the sign-in backend
pub fn backend_url() -> String {
    resolve_backend_url(backend_url_override())
}

fn resolve_backend_url(value: Option<String>) -> String {
    value
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}
