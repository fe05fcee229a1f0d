//! Configuration and result models.

pub mod config;
pub mod label;
