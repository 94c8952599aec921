//! rocketblend-lib: Core types and storage for rocketblend
//!
//! This crate provides the pieces the `rkb` CLI is built on:
//! - `Store`: an embedded, file-based document store (one directory per
//!   collection, one JSON file per record)
//! - `installs`, `addons`, `remotes`, `settings`: repositories persisting their records
//!   through the store
//! - `platform`: platform detection and well-known directories

pub mod addons;
pub mod consts;
pub mod installs;
pub mod platform;
pub mod remotes;
pub mod settings;
pub mod store;
