//! Keeps the remote block store eventually consistent with the editor.
//!
//! - **`api`**: the `BlockApi` trait and its request/response types
//! - **`memory`**: in-memory `BlockApi` backend
//! - **`adapter`**: spawns writes, reports outcomes as `PersistEvent`s
//! - **`debounce`**: per-block quiet period with a hard ceiling
//! - **`retry`**: exponential backoff for transient failures
//! - **`status`**: the idle/saving/saved/error indicator
//! - **`error`**: `ApiError` taxonomy

pub mod adapter;
pub mod api;
pub mod debounce;
pub mod error;
pub mod memory;
pub mod retry;
pub mod status;

pub use adapter::{PersistEvent, PersistEvents, PersistenceAdapter};
pub use api::{ApiResult, BlockApi, BlockUpdate, NewBlock, OrderEntry, RemoteBlock};
pub use debounce::DebounceTimers;
pub use error::ApiError;
pub use memory::InMemoryBlockApi;
pub use retry::RetryPolicy;
pub use status::{SaveStatus, StatusReporter};
