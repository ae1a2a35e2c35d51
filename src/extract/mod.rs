//! Content extraction from the live reading frame.
//!
//! Produces a self-contained HTML string for the page currently on screen:
//! every `<img>` tag is replaced with a base64-encoded inline copy captured
//! from a clipped screenshot of that element (never a network re-fetch, so the
//! inlined pixels match what was actually rendered, including session-scoped
//! image sources), and watermark overlays are stripped.

use crate::browser::Session;
use crate::error::{Result, RipError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use headless_chrome::protocol::cdp::Page;
use regex::Regex;
use serde::Deserialize;

const IMAGE_TAG_PATTERN: &str = "<img[^>]*>";
const WATERMARK_PATTERN: &str = r#"(?s)<div class="watermark">.*?</div>"#;

/// Viewport rectangle of one image element, offset to page coordinates.
#[derive(Debug, Deserialize)]
struct ImageRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Extracts cleaned markup from a rendered page.
///
/// Stateless; output is a pure function of the page content and the captured
/// image bytes.
pub struct ContentExtractor {
    image_tag: Regex,
    watermark: Regex,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            image_tag: Regex::new(IMAGE_TAG_PATTERN).expect("image tag pattern is valid"),
            watermark: Regex::new(WATERMARK_PATTERN).expect("watermark pattern is valid"),
        }
    }

    /// Capture the reading frame's markup with images inlined and watermarks
    /// removed.
    pub fn extract(&self, session: &Session, frame_selector: &str) -> Result<String> {
        let selector_literal =
            serde_json::to_string(frame_selector).unwrap_or_else(|_| "\"\"".to_string());

        let source_js =
            include_str!("frame_source.js").replace("__FRAME_SELECTOR__", &selector_literal);
        let content = session
            .evaluate(&source_js)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RipError::ElementMissing(format!("reading frame {frame_selector}")))?;

        let rects_js =
            include_str!("image_rects.js").replace("__FRAME_SELECTOR__", &selector_literal);
        let rects_value = session.evaluate(&rects_js)?;
        let rects: Vec<ImageRect> = serde_json::from_str(rects_value.as_str().unwrap_or("[]"))
            .map_err(|e| RipError::ScriptError(format!("bad image rect payload: {e}")))?;

        let mut screenshots = Vec::with_capacity(rects.len());
        for rect in rects {
            let png = session.capture_clip(Page::Viewport {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                scale: 1.0,
            })?;
            screenshots.push(STANDARD.encode(png));
        }

        Ok(self.embed(&content, &screenshots))
    }

    /// Inline screenshots into markup and strip watermark overlays.
    ///
    /// Image tags and screenshots are paired in document order; when the two
    /// lists differ in length the shorter one wins. Overlay and lazy-load
    /// elements can appear as stray matches on either side, so a mismatch is
    /// not an error.
    pub fn embed(&self, content: &str, screenshots: &[String]) -> String {
        let tags: Vec<&str> = self.image_tag.find_iter(content).map(|m| m.as_str()).collect();

        let mut out = content.to_string();
        for (tag, shot) in tags.iter().zip(screenshots) {
            let inline = format!(r#"<img src="data:image/png;base64, {shot}">"#);
            out = out.replacen(*tag, &inline, 1);
        }

        self.watermark.replace_all(&out, "").into_owned()
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}
