//! Command implementations.

pub mod config;
pub mod mime;
pub mod poll;
pub mod process;
pub mod serve;
