use crate::browser::config::DriverConfig;
use crate::error::{Result, RipError};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, Tab};
use std::cell::RefCell;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// One live browser instance bound to one authenticated user context.
///
/// The session tracks a single "current window" (tab). All element lookups,
/// script evaluations, and screenshots run against it. Ownership is exclusive
/// to the ripping loop for the duration of a run; [`Session::close`] is called
/// exactly once when the loop terminates.
pub struct Session {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// The window all operations currently target
    current: RefCell<Arc<Tab>>,
}

impl Session {
    /// Launch a new browser instance with the given configuration.
    pub fn launch(config: &DriverConfig) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        launch_opts.headless = config.headless;
        launch_opts.sandbox = false;
        launch_opts.window_size = Some((config.window_width, config.window_height));
        for arg in config.hardening_args() {
            launch_opts.args.push(OsStr::new(arg));
        }

        // A full rip can sit for a long time between CDP commands while pages
        // render; the default 30s idle timeout would tear the browser down.
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        let browser =
            Browser::new(launch_opts).map_err(|e| RipError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RipError::LaunchFailed(format!("failed to open initial window: {e}")))?;

        Ok(Self { browser, current: RefCell::new(tab) })
    }

    /// Get the current window.
    pub fn tab(&self) -> Arc<Tab> {
        self.current.borrow().clone()
    }

    /// Navigate the current window to a URL and wait for the load to settle.
    pub fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab();
        tab.navigate_to(url)
            .map_err(|e| RipError::NavigationFailed(format!("failed to navigate to {url}: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| RipError::NavigationFailed(format!("load of {url} did not settle: {e}")))?;
        Ok(())
    }

    /// Click the first element matching a CSS selector.
    pub fn click(&self, selector: &str) -> Result<()> {
        let tab = self.tab();
        let element = tab
            .find_element(selector)
            .map_err(|e| RipError::ElementMissing(format!("{selector}: {e}")))?;
        element
            .click()
            .map_err(|e| RipError::StaleElement(format!("{selector}: {e}")))?;
        Ok(())
    }

    /// Type text into the first element matching a CSS selector.
    pub fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let tab = self.tab();
        let element = tab
            .find_element(selector)
            .map_err(|e| RipError::ElementMissing(format!("{selector}: {e}")))?;
        element
            .type_into(text)
            .map_err(|e| RipError::StaleElement(format!("{selector}: {e}")))?;
        Ok(())
    }

    /// Read the rendered text of the first element matching a CSS selector.
    pub fn inner_text(&self, selector: &str) -> Result<String> {
        let tab = self.tab();
        let element = tab
            .find_element(selector)
            .map_err(|e| RipError::ElementMissing(format!("{selector}: {e}")))?;
        let text = element
            .get_inner_text()
            .map_err(|e| RipError::StaleElement(format!("{selector}: {e}")))?;
        Ok(text)
    }

    /// Whether any element matches a CSS selector right now.
    pub fn element_present(&self, selector: &str) -> Result<bool> {
        let js = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector).unwrap_or_default()
        );
        Ok(self.evaluate(&js)?.as_bool().unwrap_or(false))
    }

    /// Whether the first element matching a CSS selector carries a class.
    pub fn element_has_class(&self, selector: &str, class: &str) -> Result<bool> {
        let js = format!(
            "(() => {{ const e = document.querySelector({}); return e !== null && e.classList.contains({}); }})()",
            serde_json::to_string(selector).unwrap_or_default(),
            serde_json::to_string(class).unwrap_or_default()
        );
        Ok(self.evaluate(&js)?.as_bool().unwrap_or(false))
    }

    /// Evaluate JavaScript in the current window and return its value.
    pub fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        let object = self
            .tab()
            .evaluate(expression, false)
            .map_err(|e| RipError::ScriptError(e.to_string()))?;
        Ok(object.value.unwrap_or(serde_json::Value::Null))
    }

    /// Number of open windows.
    pub fn window_count(&self) -> Result<usize> {
        Ok(self.all_tabs()?.len())
    }

    /// Make the most recently opened window the current one.
    ///
    /// The reader opens in a fresh window when the portal link is followed;
    /// everything after that point targets the new window.
    pub fn switch_to_latest_window(&self) -> Result<()> {
        let tabs = self.all_tabs()?;
        let latest = tabs
            .last()
            .cloned()
            .ok_or_else(|| RipError::WindowFailed("no windows open".to_string()))?;
        *self.current.borrow_mut() = latest;
        Ok(())
    }

    /// Capture a clipped PNG screenshot of the current window.
    pub fn capture_clip(&self, clip: Page::Viewport) -> Result<Vec<u8>> {
        self.tab()
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| RipError::ScriptError(format!("screenshot capture failed: {e}")))
    }

    /// Render the current window to PDF bytes via the browser's print pipeline.
    pub fn print_to_pdf(&self) -> Result<Vec<u8>> {
        let options = PrintToPdfOptions {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..PrintToPdfOptions::default()
        };
        self.tab()
            .print_to_pdf(Some(options))
            .map_err(|e| RipError::ScriptError(format!("print to PDF failed: {e}")))
    }

    /// Close every window. The browser process itself is released when the
    /// session is dropped.
    pub fn close(&self) {
        if let Ok(tabs) = self.all_tabs() {
            for tab in tabs {
                let _ = tab.close(false);
            }
        }
    }

    fn all_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| RipError::WindowFailed(format!("failed to list windows: {e}")))?
            .clone();
        Ok(tabs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::config::DriverConfig;

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = Session::launch(&DriverConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_navigate_and_evaluate() {
        let session = Session::launch(&DriverConfig::default()).expect("failed to launch browser");

        session.navigate("about:blank").expect("navigation failed");
        let value = session.evaluate("1 + 1").expect("evaluation failed");
        assert_eq!(value.as_u64(), Some(2));
    }

    #[test]
    #[ignore]
    fn test_element_present_on_blank_page() {
        let session = Session::launch(&DriverConfig::default()).expect("failed to launch browser");

        session.navigate("about:blank").expect("navigation failed");
        assert!(!session.element_present("#missing").expect("query failed"));
    }
}
