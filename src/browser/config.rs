//! Driver selection and browser launch configuration.

use crate::error::{Result, RipError};

/// Browser drivers a user may request on the command line.
///
/// Only Chromium-family browsers can actually be driven, because the backend
/// speaks the Chrome DevTools Protocol. `firefox` is recognized but rejected
/// with an explicit configuration error rather than silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Chrome,
}

impl DriverKind {
    /// Parse a driver name, failing with a configuration error for anything
    /// the backend cannot drive.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(DriverKind::Chrome),
            "firefox" => Err(RipError::UnsupportedDriver {
                name: name.to_string(),
                reason: "the CDP backend drives Chromium-family browsers only".to_string(),
            }),
            _ => Err(RipError::UnsupportedDriver {
                name: name.to_string(),
                reason: "expected 'chrome' or 'firefox'".to_string(),
            }),
        }
    }
}

/// Launch configuration for a browser session.
///
/// Carries the fixed hardening flags applied to every session: sandboxing
/// disabled, extensions and GPU disabled, browser logging suppressed.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Which driver to launch
    pub kind: DriverKind,

    /// Run without a visible window
    pub headless: bool,

    /// Initial window size
    pub window_width: u32,

    /// Initial window size
    pub window_height: u32,
}

impl DriverConfig {
    /// Build a configuration from a driver name and headless flag.
    pub fn new(driver: &str, headless: bool) -> Result<Self> {
        Ok(Self {
            kind: DriverKind::parse(driver)?,
            headless,
            window_width: 1280,
            window_height: 1024,
        })
    }

    /// Extra command-line switches passed to the browser process.
    pub fn hardening_args(&self) -> &'static [&'static str] {
        &["--disable-extensions", "--disable-gpu", "--log-level=3"]
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: DriverKind::Chrome,
            headless: true,
            window_width: 1280,
            window_height: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chrome() {
        assert_eq!(DriverKind::parse("chrome").unwrap(), DriverKind::Chrome);
        assert_eq!(DriverKind::parse("Chrome").unwrap(), DriverKind::Chrome);
        assert_eq!(DriverKind::parse("chromium").unwrap(), DriverKind::Chrome);
    }

    #[test]
    fn test_parse_firefox_rejected_explicitly() {
        let err = DriverKind::parse("firefox").unwrap_err();
        match err {
            RipError::UnsupportedDriver { name, .. } => assert_eq!(name, "firefox"),
            other => panic!("expected UnsupportedDriver, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_rejected() {
        let err = DriverKind::parse("edge").unwrap_err();
        assert!(matches!(err, RipError::UnsupportedDriver { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_config_defaults() {
        let config = DriverConfig::new("chrome", true).unwrap();
        assert!(config.headless);
        assert_eq!(config.window_width, 1280);
        assert!(config.hardening_args().contains(&"--disable-gpu"));
    }
}
