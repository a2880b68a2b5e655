//! Login-success page: shows the signed-in user and keeps the tokens fresh

use crate::config::backend_url;
use crate::navigation::{LOGIN_PAGE, open_page, query_param};
use crate::storage::session_cache;
use chrono::Utc;
use gloo::timers::callback::Interval;
use larkauth_core::{
    RefreshOutcome, RefreshPolicy, SessionCache, SessionStore, UserProfile, UserSession,
};
use larkauth_http::client::LarkAuthClient;
use larkauth_http::client::error::ClientError;
use tracing::{debug, error};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

const LOAD_ERROR: &str = "Error loading user information. Please try again.";
const NO_USER: &str = "No user information found. Please log in again.";

enum View {
    Loading,
    User(UserProfile),
    Message(&'static str),
}

pub enum Msg {
    Loaded(Result<UserProfile, &'static str>),
    CheckRefresh,
    Logout,
}

pub struct SuccessPage {
    view: View,
    client: Option<LarkAuthClient>,
    _refresh: Interval,
}

impl Component for SuccessPage {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let client = LarkAuthClient::new(backend_url())
            .inspect_err(|e| error!("Invalid backend URL: {e}"))
            .ok();

        // First refresh check runs once this page's session is cached
        match query_param("userId") {
            Some(user_id) => {
                let link = ctx.link().clone();
                let client = client.clone();
                spawn_local(async move {
                    link.send_message(Msg::Loaded(load_from_backend(client, &user_id).await));
                    link.send_message(Msg::CheckRefresh);
                });
            }
            None => {
                let loaded = session_cache()
                    .map_err(|e| {
                        error!("Error parsing user data: {e}");
                        LOAD_ERROR
                    })
                    .and_then(|cache| cached_user(&cache));
                ctx.link().send_message(Msg::Loaded(loaded));
                ctx.link().send_message(Msg::CheckRefresh);
            }
        }

        let link = ctx.link().clone();
        let interval = Interval::new(RefreshPolicy::default().interval_millis(), move || {
            link.send_message(Msg::CheckRefresh);
        });

        Self {
            view: View::Loading,
            client,
            _refresh: interval,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(Ok(user)) => {
                self.view = View::User(user);
                true
            }
            Msg::Loaded(Err(message)) => {
                self.view = View::Message(message);
                true
            }
            Msg::CheckRefresh => {
                if let Some(client) = self.client.clone() {
                    spawn_local(check_refresh(client));
                }
                false
            }
            Msg::Logout => {
                match session_cache().and_then(|cache| cache.clear()) {
                    Ok(()) => debug!("Cleared cached session"),
                    Err(e) => error!("Failed to clear cached session: {e}"),
                }
                open_page(LOGIN_PAGE);
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let body = match &self.view {
            View::Loading => html! {
                <p id="loadingMessage" class="message">{"Loading user information..."}</p>
            },
            View::Message(message) => html! {
                <p id="loadingMessage" class="message">{ *message }</p>
            },
            View::User(user) => user_info(user),
        };

        html! {
            <div class="login-success">
                <h1>{"Login Successful"}</h1>
                { body }
                <button
                    id="logoutBtn"
                    class="logout-button"
                    onclick={ctx.link().callback(|_| Msg::Logout)}
                >
                    {"Logout"}
                </button>
            </div>
        }
    }
}

fn user_info(user: &UserProfile) -> Html {
    html! {
        <div id="userInfo" class="user-info">
            <div id="avatarContainer">
                if let Some(avatar) = user.avatar_url.as_deref().filter(|url| !url.is_empty()) {
                    <img class="avatar" src={avatar.to_string()} alt="User Avatar" />
                }
            </div>
            <p>
                <strong>{"Name: "}</strong>
                <span id="userName">{ or_na(Some(&user.name)) }</span>
            </p>
            <p>
                <strong>{"Email: "}</strong>
                <span id="userEmail">{ or_na(user.email.as_deref()) }</span>
            </p>
            <p>
                <strong>{"User ID: "}</strong>
                <span id="userId">{ or_na(Some(&user.id)) }</span>
            </p>
        </div>
    }
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

/// Fetch the session the callback just created and cache it
async fn load_from_backend(
    client: Option<LarkAuthClient>,
    user_id: &str,
) -> Result<UserProfile, &'static str> {
    let client = client.ok_or(LOAD_ERROR)?;
    let fetched = client.user_session(user_id).await;
    match session_cache() {
        Ok(cache) => cache_fetched(&cache, fetched),
        Err(e) => {
            error!("Failed to open session cache: {e}");
            fetched.map(|session| session.user).map_err(|e| {
                error!("Error fetching user data: {e}");
                LOAD_ERROR
            })
        }
    }
}

/// Cache a fetched session and return the user to show
fn cache_fetched<S: SessionStore>(
    cache: &SessionCache<S>,
    fetched: Result<UserSession, ClientError>,
) -> Result<UserProfile, &'static str> {
    let session = fetched.map_err(|e| {
        error!("Error fetching user data: {e}");
        LOAD_ERROR
    })?;

    if let Err(e) = cache.store_session(&session) {
        error!("Failed to cache session: {e}");
    }
    Ok(session.user)
}

/// The cached user, or the message to show instead
fn cached_user<S: SessionStore>(cache: &SessionCache<S>) -> Result<UserProfile, &'static str> {
    match cache.user() {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(NO_USER),
        Err(e) => {
            error!("Error parsing user data: {e}");
            Err(LOAD_ERROR)
        }
    }
}

async fn check_refresh(client: LarkAuthClient) {
    let cache = match session_cache() {
        Ok(cache) => cache,
        Err(e) => {
            error!("Error refreshing token: {e}");
            return;
        }
    };

    let outcome = cache
        .refresh_if_due(Utc::now(), |token| async move { client.refresh(&token).await })
        .await;
    if let RefreshOutcome::Refreshed(tokens) = outcome {
        debug!("Access token now expires at {}", tokens.expires_at);
    }
}
