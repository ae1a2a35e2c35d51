//! Browser session management and configuration.
//!
//! This module wraps the Chrome DevTools Protocol connection:
//! - [`DriverConfig`]: driver selection and launch hardening
//! - [`Session`]: one live browser instance (windows, elements, scripts,
//!   screenshots, print-to-PDF)
//! - [`Wait`]: bounded blocking polls over asynchronous UI state

pub mod config;
pub mod session;
pub mod wait;

pub use config::{DriverConfig, DriverKind};
pub use session::Session;
pub use wait::Wait;
