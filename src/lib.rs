//! Libris application library
//!
//! Project modules and the bootstrap sequence shared by the `libris-app`
//! binary and the `libris` CLI.

pub mod app;
pub mod modules;

pub use app::{migrate, serve};
