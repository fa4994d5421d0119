//! CLI command implementations.

pub mod apply;
pub mod common;
pub mod delete;
pub mod parse;
pub mod plan;
pub mod show;
