pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod diff;
pub mod list;
pub mod projects;
pub mod summary;
pub mod update;
pub mod watch;
