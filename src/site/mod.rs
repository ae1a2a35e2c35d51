//! Site adapters.
//!
//! A [`SiteAdapter`] binds the ripping state machine to one application's DOM:
//! how to log in, how to reach the document, how to address and select items,
//! and when a page's content has finished rendering. The state machine itself
//! carries no selectors.

pub mod epub;

pub use epub::{EpubPortal, Timeouts};

use crate::browser::Session;
use crate::error::Result;

/// Login credentials for the portal.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The fixed multi-step navigation flow of one target site.
///
/// All methods issue blocking operations against the session; none of them
/// retry internally. Retrying is the ripping loop's job.
pub trait SiteAdapter {
    /// Submit credentials and confirm the portal accepted them.
    ///
    /// Distinguishes three outcomes: confirmed login, explicit rejection
    /// ([`crate::error::RipError::CredentialsRejected`]), and no confirmation
    /// within the window ([`crate::error::RipError::Timeout`]).
    fn login(&self, session: &Session, credentials: &Credentials) -> Result<()>;

    /// Navigate from the portal into the document's reading view.
    ///
    /// Mutates the session's current window.
    fn open_document(&self, session: &Session) -> Result<()>;

    /// Make the table of contents usable: suppress obstructing UI chrome and
    /// open the TOC listing.
    fn prepare(&self, session: &Session) -> Result<()>;

    /// Count the discoverable content items. Established once per run.
    fn item_count(&self, session: &Session) -> Result<usize>;

    /// Select the item at `index` and return its display title.
    fn select_item(&self, session: &Session, index: usize) -> Result<String>;

    /// Block until the selected item's content has finished rendering.
    fn content_ready(&self, session: &Session) -> Result<()>;

    /// Selector of the iframe hosting the actual page content.
    fn reading_frame(&self) -> &str;
}
