//! Sign-in page

use crate::config::backend_url;
use crate::navigation::{SUCCESS_PAGE, open_page, redirect};
use crate::storage::session_cache;
use chrono::{DateTime, Utc};
use larkauth_core::{ExistingSession, SessionCache, SessionError, SessionStore};
use larkauth_http::client::LarkAuthClient;
use tracing::{debug, error};
use yew::prelude::*;

/// Page to skip to when a valid session is already cached
fn resume_page<S: SessionStore>(
    cache: &SessionCache<S>,
    now: DateTime<Utc>,
) -> Result<Option<&'static str>, SessionError> {
    match cache.check_existing(now)? {
        ExistingSession::Active(_) => Ok(Some(SUCCESS_PAGE)),
        state => {
            debug!("No active session: {state:?}");
            Ok(None)
        }
    }
}

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    use_effect_with((), |()| {
        match session_cache().and_then(|cache| resume_page(&cache, Utc::now())) {
            Ok(Some(page)) => open_page(page),
            Ok(None) => {}
            Err(e) => error!("Failed to read cached session: {e}"),
        }
        || ()
    });

    let on_login = Callback::from(|_: MouseEvent| {
        match LarkAuthClient::new(backend_url()).and_then(|client| client.login_url()) {
            Ok(url) => redirect(url.as_str()),
            Err(e) => error!("Invalid backend URL: {e}"),
        }
    });

    html! {
        <div class="login">
            <h1>{"Welcome"}</h1>
            <p class="message">{"Sign in with your Lark account to continue."}</p>
            <button id="larkLoginBtn" class="lark-button" onclick={on_login}>
                {"Sign in with Lark"}
            </button>
        </div>
    }
}
