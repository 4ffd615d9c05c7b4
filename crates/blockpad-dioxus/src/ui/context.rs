use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use blockpad_config::{Config, EditorSettings};
use blockpad_engine::editing::MenuMode;
use blockpad_engine::{EditorConfig, FileSystemUploader, InMemoryBlockApi, Workspace};

/// Services shared by every component, provided once at the root
#[derive(Clone)]
pub struct AppContext {
    pub api: Arc<InMemoryBlockApi>,
    pub uploader: Arc<FileSystemUploader>,
    pub editor: EditorConfig,
    pub user_id: String,
    pub data_path: PathBuf,
}

impl AppContext {
    pub fn new(config: &Config, workspace: &Workspace) -> Self {
        Self {
            api: Arc::new(InMemoryBlockApi::with_blocks(workspace.blocks())),
            uploader: Arc::new(FileSystemUploader::new(config.uploads_path())),
            editor: editor_config(&config.editor),
            user_id: config.user_id.clone(),
            data_path: config.data_path.clone(),
        }
    }
}

pub fn editor_config(settings: &EditorSettings) -> EditorConfig {
    EditorConfig {
        quiet_period: Duration::from_millis(settings.quiet_period_ms),
        max_wait: Duration::from_millis(settings.max_wait_ms),
        max_retries: settings.max_retries,
        retry_base_delay: Duration::from_millis(settings.retry_base_delay_ms),
        saved_display: Duration::from_millis(settings.saved_display_ms),
        drag_threshold_px: settings.drag_threshold_px,
        history_capacity: settings.history_capacity,
        menu_mode: if settings.filter_menu {
            MenuMode::Filtering
        } else {
            MenuMode::Fixed
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings_match_engine_defaults() {
        assert_eq!(
            editor_config(&EditorSettings::default()),
            EditorConfig::default()
        );
    }

    #[test]
    fn test_filter_menu_selects_filtering_mode() {
        let settings = EditorSettings {
            filter_menu: true,
            quiet_period_ms: 150,
            ..EditorSettings::default()
        };
        let config = editor_config(&settings);
        assert_eq!(config.menu_mode, MenuMode::Filtering);
        assert_eq!(config.quiet_period, Duration::from_millis(150));
    }
}
