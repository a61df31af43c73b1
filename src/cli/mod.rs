//! Reusable CLI pieces: human report rendering and signal wiring.

pub mod signals;
pub mod summary;
