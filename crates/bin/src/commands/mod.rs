//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod fetch;
pub(crate) mod parse;
pub(crate) mod vocabulary;
