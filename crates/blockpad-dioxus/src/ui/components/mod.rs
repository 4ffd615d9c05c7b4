pub mod block_row;
pub mod document_list;
pub mod document_tree;
pub mod editor;
pub mod error_screen;
pub mod image_block;
pub mod keys;
pub mod save_indicator;
pub mod type_menu;

pub use block_row::BlockRow;
pub use document_list::DocumentList;
pub use document_tree::{DocumentTree, TreeEntry, tree_entries};
pub use editor::{Editor, EditorHandle};
pub use error_screen::ErrorScreen;
pub use image_block::ImageBlock;
pub use save_indicator::SaveIndicator;
pub use type_menu::TypeMenuPopup;
