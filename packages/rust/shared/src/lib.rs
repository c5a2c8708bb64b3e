//! Shared types, error model, and configuration for leafdex.
//!
//! This crate is the foundation depended on by all other leafdex crates.
//! It provides:
//! - [`LeafdexError`] — the unified error type
//! - Domain types ([`ItemLink`], [`Item`], [`ItemSection`], [`RunResult`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, RunConfig, RunDefaults, SiteConfig, TextConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{LeafdexError, Result};
pub use types::{
    ContentParagraph, Item, ItemLink, ItemSection, RunResult, SectionKey, SectionLinkMap,
};
