pub mod config;
pub mod documents;
pub mod editing;
pub mod html;
pub mod io;
pub mod persistence;
pub mod session;
pub mod upload;

// Re-export key types for easier usage
pub use config::EditorConfig;
pub use documents::{Document, DocumentError, DocumentService, DocumentUpdate};
pub use editing::{Block, BlockContent, BlockKey, BlockKind, BlockStore, BlockView, ImageContent};
pub use io::*;
pub use persistence::{ApiError, BlockApi, InMemoryBlockApi, PersistEvent, PersistEvents, SaveStatus};
pub use session::{Caret, EditorSession, FocusRequest};
pub use upload::{FileSystemUploader, ImageUpload, ImageUploader, UploadError, UploadedImage};
