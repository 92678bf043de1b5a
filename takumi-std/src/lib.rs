//! # takumi-std
//!
//! Standard implementations for the Takumi RPC dispatch pipeline.
//!
//! This crate provides:
//! - **Hooks**: [`HookRegistry`](hooks::HookRegistry) and the default
//!   `api_called` / `init_process` hooks
//! - **Registration**: [`ServiceModule`](api::ServiceModule),
//!   [`ServiceHandler`](api::ServiceHandler)
//! - **Dispatch**: [`ApiMap`](dispatch::ApiMap), timeouts and hook firing
//! - **Runtime**: [`Service`](service::Service) and the [`Codec`](service::Codec) boundary
//! - **Ambient**: `tracing` loggers, TOML [`AppConfig`](config::AppConfig), testing utilities

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use takumi_core;

// Modules
pub mod api;
pub mod config;
pub mod dispatch;
pub mod hooks;
pub mod logger;
pub mod service;
pub mod testing;
