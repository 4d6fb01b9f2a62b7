pub mod export;
pub mod import;

pub use export::Exporter;
pub use import::{ImportIssue, ImportOutcome, Importer};
