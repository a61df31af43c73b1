//! The sweep engine: discovery, classification, execution, orchestration.

pub mod classify;
pub mod exclude;
pub mod executor;
pub mod fsops;
pub mod run;
pub mod walker;
