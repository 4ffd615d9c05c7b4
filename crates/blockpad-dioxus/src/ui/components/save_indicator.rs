use blockpad_engine::SaveStatus;
use dioxus::prelude::*;

#[component]
pub fn SaveIndicator(status: SaveStatus) -> Element {
    let class = match status {
        SaveStatus::Idle => "save-status idle",
        SaveStatus::Saving => "save-status saving",
        SaveStatus::Saved => "save-status saved",
        SaveStatus::Error(_) => "save-status error",
    };
    let text = status.label().to_string();

    rsx! {
        span {
            class: "{class}",
            role: "status",
            "{text}"
        }
    }
}
