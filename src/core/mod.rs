// LogWeave - core/mod.rs
//
// Core pipeline stages, dependency order leaves first. Pure logic plus
// read-only file parsing; no host-editor or UI dependencies.

pub mod classify;
pub mod discovery;
pub mod filter;
pub mod group;
pub mod har;
pub mod model;
pub mod parser;
pub mod render;
pub mod timestamp;
