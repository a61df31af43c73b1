//! Core types: errors, configuration, path mapping, size codec.

pub mod config;
pub mod errors;
pub mod paths;
pub mod size;
