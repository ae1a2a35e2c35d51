//! # bookrip
//!
//! Rips paginated e-book content out of an authenticated web reader and
//! reassembles it into a single PDF, driving a Chromium-family browser over
//! the Chrome DevTools Protocol (CDP).
//!
//! ## How a run works
//!
//! A [`Session`] is launched and handed to a [`rip::Ripper`], which walks the
//! document's table of contents through a [`site::SiteAdapter`]: authenticate,
//! open the reader, count the outline entries, then select/wait/extract/persist
//! one HTML file per entry. Transient UI failures (timeouts, stale elements)
//! are retried in place under a run-wide ceiling; fatal classes abort at once.
//! Afterwards the [`merge::Assembler`] renders each captured page to PDF and
//! concatenates them in index order.
//!
//! ## Ripping a document
//!
//! ```rust,no_run
//! use bookrip::browser::{DriverConfig, Session};
//! use bookrip::rip::Ripper;
//! use bookrip::site::{Credentials, EpubPortal};
//! use std::path::Path;
//!
//! # fn main() -> bookrip::Result<()> {
//! let config = DriverConfig::new("chrome", true)?;
//! let session = Session::launch(&config)?;
//!
//! let site = EpubPortal::new("https://example.edu/course/site", "Intro to Widgets");
//! let credentials = Credentials {
//!     username: "user".to_string(),
//!     password: "secret".to_string(),
//! };
//!
//! let outcome = Ripper::new(session, site, credentials).run(Path::new("./work"))?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Merging the output set
//!
//! ```rust,no_run
//! use bookrip::browser::DriverConfig;
//! use bookrip::merge::Assembler;
//! use std::path::Path;
//!
//! # fn main() -> bookrip::Result<()> {
//! let assembler = Assembler::new(DriverConfig::default());
//! let summary = assembler.run(Path::new("./work"), Path::new("output.pdf"))?;
//! println!("merged {} chapters", summary.documents);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: session management, driver configuration, bounded waits
//! - [`site`]: the site adapter trait and the fixed e-pub portal flow
//! - [`extract`]: image inlining and watermark stripping
//! - [`rip`]: the page-ripping state machine (the core)
//! - [`output`]: persisted-state layout of the working directory
//! - [`merge`]: HTML-to-PDF rendering and concatenation
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod error;
pub mod extract;
pub mod merge;
pub mod output;
pub mod rip;
pub mod site;

pub use browser::{DriverConfig, DriverKind, Session, Wait};
pub use error::{Result, RipError};
pub use extract::ContentExtractor;
pub use merge::{Assembler, MergeSummary};
pub use rip::{RetryPolicy, RipOutcome, RipState, Ripper};
pub use site::{Credentials, EpubPortal, SiteAdapter, Timeouts};
