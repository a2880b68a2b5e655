//! Page routing and browser navigation

use web_sys::UrlSearchParams;

/// Page the login screen sends an already signed-in user to
pub const SUCCESS_PAGE: &str = "login-success.html";

/// Page logout returns to
pub const LOGIN_PAGE: &str = "index.html";

/// Pages of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Success,
}

impl Page {
    /// Pick the page for a location pathname
    ///
    /// The widget is served at `/` by the frontend listener and under
    /// `/static/` by the API listener, so only the file name counts.
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or_default();
        if file == "login-success.html" || file == "login-success" {
            Self::Success
        } else {
            Self::Login
        }
    }
}

/// Current page from `window.location`
pub fn current_page() -> Page {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .map_or(Page::Login, |path| Page::from_path(&path))
}

/// Path of widget file `file` next to the current page
///
/// `/login-success.html` maps `index.html` to `/index.html`, while
/// `/static/login-success.html` maps it to `/static/index.html`.
pub fn sibling_path(current: &str, file: &str) -> String {
    let dir = current.rfind('/').map_or("/", |i| &current[..=i]);
    let dir = if dir.starts_with('/') { dir } else { "/" };
    format!("{dir}{file}")
}

/// Navigate to widget page `file` in the directory the widget is served from
pub fn open_page(file: &str) {
    let current = web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default();
    redirect(&sibling_path(&current, file));
}

/// Read a query string parameter of the current location
pub fn query_param(name: &str) -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    UrlSearchParams::new_with_str(&search)
        .ok()?
        .get(name)
        .filter(|value| !value.is_empty())
}

/// Send the browser to `url`
pub fn redirect(url: &str) {
    if let Some(window) = web_sys::window()
        && let Err(e) = window.location().set_href(url)
    {
        tracing::error!("Failed to navigate to {url}: {e:?}");
    }
}
