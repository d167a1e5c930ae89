//! Purpose: Host-side loader and dispatch layer for nanoem application plugins.
//! Exports: `api` (stable surface), plus `core`, `plugin` and policy modules for tests.
//! Role: Library backing the `emplug` CLI and any host embedding the plugin ABI.
//! Invariants: Plugin failures surface as `Error` values; nothing here panics across the boundary.
//! Invariants: Every plugin-owned buffer is copied and released at the call that produced it.
pub mod api;
pub mod config;
pub mod core;
pub mod factory;
pub mod plugin;
pub mod registry;
pub mod transform;
