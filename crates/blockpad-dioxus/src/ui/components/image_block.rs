use std::path::{Path, PathBuf};

use blockpad_engine::editing::{BlockKey, ImageContent};
use blockpad_engine::{ImageUpload, ImageUploader, UploadError};
use dioxus::events::Key;
use dioxus::prelude::*;

use crate::ui::components::editor::EditorHandle;
use crate::ui::context::AppContext;

/// What the user typed into an empty image block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Empty,
    Link(String),
    File(PathBuf),
}

pub fn classify_source(input: &str) -> SourceInput {
    let input = input.trim();
    if input.is_empty() {
        return SourceInput::Empty;
    }
    let lower = input.to_ascii_lowercase();
    if ["http://", "https://", "data:image/", "file://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        SourceInput::Link(input.to_string())
    } else {
        SourceInput::File(PathBuf::from(input))
    }
}

fn read_upload(path: &Path) -> Result<ImageUpload, UploadError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload {
        file_name,
        content_type: None,
        bytes,
    })
}

#[component]
pub fn ImageBlock(block_key: BlockKey, image: ImageContent, handle: EditorHandle) -> Element {
    let ctx = use_context::<AppContext>();
    let mut source_input = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut uploading = use_signal(|| false);

    let attach = {
        let handle = handle.clone();
        move || match classify_source(&source_input.peek()) {
            SourceInput::Empty => {}
            SourceInput::Link(url) => {
                error.set(None);
                handle.update(|s| s.set_image_source(block_key, url));
            }
            SourceInput::File(path) => {
                let uploader = ctx.uploader.clone();
                let handle = handle.clone();
                uploading.set(true);
                spawn(async move {
                    let result = match read_upload(&path) {
                        Ok(upload) => uploader.upload(upload).await,
                        Err(e) => Err(e),
                    };
                    uploading.set(false);
                    match result {
                        Ok(uploaded) => {
                            error.set(None);
                            handle.update(|s| s.set_image_source(block_key, uploaded.url));
                        }
                        Err(e) => {
                            log::warn!("Upload of {} failed: {e}", path.display());
                            error.set(Some(e.to_string()));
                        }
                    }
                });
            }
        }
    };

    if image.source.is_empty() {
        let mut attach_on_enter = attach.clone();
        let mut attach_on_click = attach;
        return rsx! {
            div {
                class: "image-block empty",
                input {
                    class: "image-source",
                    placeholder: "Paste an image URL or a file path",
                    value: "{source_input}",
                    disabled: uploading(),
                    oninput: move |evt| source_input.set(evt.value()),
                    onkeydown: move |evt: KeyboardEvent| {
                        if evt.key() == Key::Enter {
                            evt.prevent_default();
                            attach_on_enter();
                        }
                    },
                }
                button {
                    disabled: uploading(),
                    onclick: move |_| attach_on_click(),
                    if uploading() { "Uploading…" } else { "Add image" }
                }
                if let Some(message) = error() {
                    p { class: "image-error", "{message}" }
                }
            }
        };
    }

    let alt = image.alt_text.clone().unwrap_or_default();
    let (width, height) = (image.width, image.height);

    let resize_width = {
        let handle = handle.clone();
        move |evt: FormEvent| match evt.value().parse::<u32>() {
            Ok(w) if w > 0 => {
                handle.update(|s| s.resize_image(block_key, w, height));
            }
            _ => error.set(Some("Width must be a positive number".to_string())),
        }
    };
    let resize_height = {
        let handle = handle.clone();
        move |evt: FormEvent| match evt.value().parse::<u32>() {
            Ok(h) if h > 0 => {
                handle.update(|s| s.resize_image(block_key, width, h));
            }
            _ => error.set(Some("Height must be a positive number".to_string())),
        }
    };
    let change_alt = {
        let handle = handle.clone();
        move |evt: FormEvent| {
            handle.update(|s| s.set_alt_text(block_key, &evt.value()));
        }
    };
    let replace = {
        let handle = handle.clone();
        move |_| {
            handle.update(|s| s.set_image_source(block_key, String::new()));
        }
    };

    rsx! {
        figure {
            class: "image-block",
            img {
                src: "{image.source}",
                alt: "{alt}",
                width: "{width}",
                height: "{height}",
            }
            figcaption {
                label {
                    "W "
                    input { r#type: "number", min: "1", value: "{width}", onchange: resize_width }
                }
                label {
                    "H "
                    input { r#type: "number", min: "1", value: "{height}", onchange: resize_height }
                }
                input {
                    class: "image-alt",
                    placeholder: "Alt text",
                    value: "{alt}",
                    onchange: change_alt,
                }
                button { onclick: replace, "Replace" }
            }
            if let Some(message) = error() {
                p { class: "image-error", "{message}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/cat.png")]
    #[case("HTTP://EXAMPLE.COM/CAT.PNG")]
    #[case("data:image/png;base64,iVBORw0KGgo=")]
    #[case("file:///tmp/cat.png")]
    fn test_links_are_used_directly(#[case] input: &str) {
        assert_eq!(classify_source(input), SourceInput::Link(input.to_string()));
    }

    #[test]
    fn test_paths_are_uploaded() {
        assert_eq!(
            classify_source("  /home/me/photo.heic "),
            SourceInput::File(PathBuf::from("/home/me/photo.heic"))
        );
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(classify_source("   "), SourceInput::Empty);
    }

    #[test]
    fn test_read_upload_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let upload = read_upload(&path).unwrap();
        assert_eq!(upload.file_name, "cat.png");
        assert_eq!(upload.bytes, b"\x89PNG".to_vec());
    }

    #[test]
    fn test_read_upload_missing_file() {
        let result = read_upload(Path::new("/definitely/not/here.png"));
        assert!(matches!(result, Err(UploadError::Io(_))));
    }
}
