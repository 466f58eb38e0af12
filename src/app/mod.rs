// LogWeave - app/mod.rs
//
// Application layer: pipeline orchestration, command dispatch, session
// persistence, workspace watching.
// Dependencies: core layer.

pub mod dispatch;
pub mod provider;
pub mod session;
pub mod watcher;
