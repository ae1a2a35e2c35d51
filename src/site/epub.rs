//! The e-pub reader portal adapter.
//!
//! Models one fixed flow: authenticate against the institution portal, follow
//! the course tool link into the reader (which opens a new window), open the
//! named document, and walk its outline list.

use crate::browser::{Session, Wait};
use crate::browser::wait::DEFAULT_POLL;
use crate::error::{Result, RipError};
use crate::site::{Credentials, SiteAdapter};
use std::time::Duration;

const AUTH_PORTAL: &str = "https://owl.uwo.ca/portal";

const USERNAME_FIELD: &str = "#eid";
const PASSWORD_FIELD: &str = "#pw";
const SUBMIT_BUTTON: &str = "#submit";
const LOGIN_REJECTED_BANNER: &str = ".alertMessage";

const COURSE_TOOL_LINK: &str = ".portletBody>p>a";
const TOC_LINK: &str = r#"a[title="Table of contents"]"#;
const OUTLINE_ITEM_CLASS: &str = "outline-item";
const READER_CONTAINER: &str = "#epub-container";
const CONTAINER_VISIBLE_CLASS: &str = "visible";
const READING_FRAME: &str = ".chapter>iframe";

/// Hide the fixed navigation chrome that overlaps the outline list.
const HIDE_CHROME_JS: &str = r#"
(() => {
    const navbar = document.getElementsByClassName('navbar-fixed-top')[0];
    if (navbar) { navbar.style.visibility = 'hidden'; }
    const courseNav = document.getElementById('course-nav');
    if (courseNav) { courseNav.style.visibility = 'hidden'; }
})()
"#;

/// The outline lazily hides entries outside the scroll viewport; entries must
/// be displayed to be clickable regardless of scroll position.
const FORCE_DISPLAY_JS: &str = r#"
Array.prototype.forEach.call(document.getElementsByClassName('outline-item'), (ele) => {
    ele.style.display = 'block';
});
"#;

/// Wait ceilings for each bounded transition.
///
/// Initial authentication and app boot are slower than per-page transitions,
/// so the ceilings are case-specific rather than one global constant.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Post-login confirmation window
    pub login: Duration,

    /// Reader window + application element after following the portal link
    pub app: Duration,

    /// Table of contents anchor after entering the reader
    pub toc: Duration,

    /// Outline entry at a given index during ripping
    pub item: Duration,

    /// Page container visibility after selecting an item
    pub page: Duration,

    /// Poll interval shared by all waits
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(30),
            app: Duration::from_secs(30),
            toc: Duration::from_secs(60),
            item: Duration::from_secs(60),
            page: Duration::from_secs(10),
            poll: DEFAULT_POLL,
        }
    }
}

/// Adapter for the e-pub reader behind the institution portal.
pub struct EpubPortal {
    target: String,
    doc_title: String,
    timeouts: Timeouts,
}

impl EpubPortal {
    /// Create an adapter for a course page URL and a document title.
    pub fn new(target: impl Into<String>, doc_title: impl Into<String>) -> Self {
        Self { target: target.into(), doc_title: doc_title.into(), timeouts: Timeouts::default() }
    }

    /// Override the default wait ceilings.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    fn wait(&self, timeout: Duration) -> Wait {
        Wait { timeout, poll: self.timeouts.poll }
    }

    fn outline_entry_selector(index: usize) -> String {
        format!(r#".{OUTLINE_ITEM_CLASS}[data-index="{index}"]"#)
    }
}

impl SiteAdapter for EpubPortal {
    fn login(&self, session: &Session, credentials: &Credentials) -> Result<()> {
        session.navigate(AUTH_PORTAL)?;

        if !session.element_present(USERNAME_FIELD)? {
            return Err(RipError::LoginFormMissing(AUTH_PORTAL.to_string()));
        }
        session.type_into(USERNAME_FIELD, &credentials.username)?;
        session.type_into(PASSWORD_FIELD, &credentials.password)?;
        session.click(SUBMIT_BUTTON)?;

        // Wrong password and slow network are distinct outcomes: rejection
        // shows the portal's banner, success drops the login form. Probe
        // errors mid-navigation mean the new page is still loading.
        self.wait(self.timeouts.login).until("post-login confirmation", || {
            match session.element_present(LOGIN_REJECTED_BANNER) {
                Ok(true) => {
                    return Err(RipError::CredentialsRejected(credentials.username.clone()));
                }
                Ok(false) => {}
                Err(_) => return Ok(None),
            }
            match session.element_present(USERNAME_FIELD) {
                Ok(present) => Ok((!present).then_some(())),
                Err(_) => Ok(None),
            }
        })?;

        log::info!("login confirmed for {}", credentials.username);
        Ok(())
    }

    fn open_document(&self, session: &Session) -> Result<()> {
        session.navigate(&self.target)?;
        session.click(COURSE_TOOL_LINK)?;

        // The reader opens in a fresh window.
        self.wait(self.timeouts.app)
            .until("reader window", || Ok((session.window_count()? > 1).then_some(())))?;
        session.switch_to_latest_window()?;

        let tile_selector = format!(r#"[title="{}"]"#, self.doc_title);
        self.wait(self.timeouts.app).until("reader application", || {
            session.element_present(&tile_selector).map(|p| p.then_some(()))
        })?;
        session.click(&tile_selector)?;
        Ok(())
    }

    fn prepare(&self, session: &Session) -> Result<()> {
        self.wait(self.timeouts.toc).until("table of contents link", || {
            session.element_present(TOC_LINK).map(|p| p.then_some(()))
        })?;

        session.evaluate(HIDE_CHROME_JS)?;
        session.click(TOC_LINK)?;
        log::info!("reader ready");
        Ok(())
    }

    fn item_count(&self, session: &Session) -> Result<usize> {
        let js = format!("document.getElementsByClassName('{OUTLINE_ITEM_CLASS}').length");
        let count = session
            .evaluate(&js)?
            .as_u64()
            .ok_or_else(|| RipError::ScriptError("outline count was not a number".to_string()))?;
        Ok(count as usize)
    }

    fn select_item(&self, session: &Session, index: usize) -> Result<String> {
        let entry = Self::outline_entry_selector(index);

        self.wait(self.timeouts.item).until(&format!("outline entry {index}"), || {
            session.element_present(&entry).map(|p| p.then_some(()))
        })?;
        session.evaluate(FORCE_DISPLAY_JS)?;

        let title = session.inner_text(&entry)?.trim().to_string();
        session.click(&entry)?;
        Ok(title)
    }

    fn content_ready(&self, session: &Session) -> Result<()> {
        self.wait(self.timeouts.page).until("epub container visible", || {
            session
                .element_has_class(READER_CONTAINER, CONTAINER_VISIBLE_CLASS)
                .map(|v| v.then_some(()))
        })
    }

    fn reading_frame(&self) -> &str {
        READING_FRAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_entry_selector() {
        assert_eq!(
            EpubPortal::outline_entry_selector(0),
            r#".outline-item[data-index="0"]"#
        );
        assert_eq!(
            EpubPortal::outline_entry_selector(42),
            r#".outline-item[data-index="42"]"#
        );
    }

    #[test]
    fn test_timeout_defaults_are_case_specific() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.page, Duration::from_secs(10));
        assert_eq!(timeouts.toc, Duration::from_secs(60));
        assert_eq!(timeouts.app, Duration::from_secs(30));
        assert!(timeouts.poll < timeouts.page);
    }

    #[test]
    fn test_adapter_construction() {
        let portal = EpubPortal::new("https://example.edu/course", "Intro to Widgets");
        assert_eq!(portal.reading_frame(), ".chapter>iframe");
        assert_eq!(portal.doc_title, "Intro to Widgets");
    }
}
