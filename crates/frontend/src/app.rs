use crate::navigation::{Page, current_page};
use crate::pages::{LoginPage, SuccessPage};
use yew::prelude::*;

#[function_component(App)]
pub fn app() -> Html {
    html! {
        <main class="card">
            {
                match current_page() {
                    Page::Login => html! { <LoginPage /> },
                    Page::Success => html! { <SuccessPage /> },
                }
            }
        </main>
    }
}
