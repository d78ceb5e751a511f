// Web Provisioning Pipeline - API Core
//
// This crate provisions generated websites asynchronously: a durable
// job queue feeds a worker pool that drives project/chat/deployment/
// domain creation against the v0 Platform and Vercel, with webhook
// notification on completion.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
