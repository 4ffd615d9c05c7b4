//! User-owned document tree: sidebar listing, search, trash and the
//! archive/restore/delete cascades.

pub mod model;
pub mod service;

pub use model::{Document, DocumentUpdate};
pub use service::{DocumentError, DocumentResult, DocumentService};
