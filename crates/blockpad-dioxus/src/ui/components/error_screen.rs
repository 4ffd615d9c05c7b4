use dioxus::prelude::*;

/// Full-window error shown when the workspace cannot be opened
#[component]
pub fn ErrorScreen(
    title: String,
    message: String,
    #[props(!optional)] details: Option<String>,
) -> Element {
    rsx! {
        div {
            class: "error-screen",
            h1 { class: "error-title", "{title}" }
            p { "{message}" }
            if let Some(ref detail_text) = details {
                pre { class: "error-details", "{detail_text}" }
            }
            p {
                class: "error-hint",
                "Fix or move the file and restart blockpad."
            }
        }
    }
}
