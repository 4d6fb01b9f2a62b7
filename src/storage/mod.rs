mod document;
mod files;
mod json;
mod memory;

pub use document::{Document, DocumentStore, Query, SortDirection, WriteMode};
pub use files::{DiskFileHost, FileHost, UploadError};
pub use json::JsonStore;
pub use memory::MemoryStore;
