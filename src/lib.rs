pub mod api;
pub mod collector;
pub mod config;
pub mod humanize;
pub mod job;
pub mod observability;
pub mod queue;
pub mod shutdown;
pub mod storage;
pub mod transform;
pub mod watcher;
pub mod worker;
