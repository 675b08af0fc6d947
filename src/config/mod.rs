//! Configuration management for the menu configurator
//!
//! - **menu**: MenuConfig (category policies, ordering, labels, remote endpoint)

pub mod menu;

pub use menu::{CategoryLabel, MenuConfig, RemoteSettings};
