//! Google Docs helpers: document edits expressed as batch updates.

pub mod client;
pub mod error;
pub mod locate;
pub mod types;

pub use client::{document_url, DocsClient};
pub use error::{DocsError, LocateError};
pub use types::{Document, OptionalColor, Request, RgbColor};
