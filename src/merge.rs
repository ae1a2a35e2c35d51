//! The assembler: turns a directory of ripped pages into one merged PDF.
//!
//! Each `NNNN_<title>.html` is rendered to a same-stem `.pdf` through the
//! browser's print pipeline, the per-page PDFs are concatenated in ascending
//! index order with one bookmark per chapter, and the intermediates are
//! deleted once the merged artifact is written.

use crate::browser::{DriverConfig, Session};
use crate::error::{Result, RipError};
use crate::output;
use indicatif::{ProgressBar, ProgressStyle};
use lopdf::{Bookmark, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// What a merge produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    /// Chapters (input HTML files) merged
    pub documents: usize,

    /// Pages in the merged artifact
    pub pages: usize,
}

/// Converts and concatenates a ripped output set.
pub struct Assembler {
    config: DriverConfig,
}

impl Assembler {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Merge every persisted page under `directory` into `output`.
    ///
    /// Ordering comes from the numeric index prefix of each filename, never
    /// from directory listing order. An empty directory produces no artifact.
    pub fn run(&self, directory: &Path, output: &Path) -> Result<MergeSummary> {
        let pages = output::scan_pages(directory)?;
        if pages.is_empty() {
            log::warn!("no ripped pages under {}; nothing to merge", directory.display());
            return Ok(MergeSummary { documents: 0, pages: 0 });
        }

        let rendered = self.render_all(&pages)?;
        let total_pages = concat_documents(&rendered, output)?;
        log::info!("merged {} chapters ({total_pages} pages) into {}", pages.len(), output.display());

        // Intermediates are only removed after the merged artifact exists.
        for (_, html_path) in &pages {
            fs::remove_file(html_path)?;
        }
        for pdf_path in &rendered {
            fs::remove_file(pdf_path)?;
        }

        Ok(MergeSummary { documents: pages.len(), pages: total_pages })
    }

    fn render_all(&self, pages: &[(usize, PathBuf)]) -> Result<Vec<PathBuf>> {
        let session = Session::launch(&self.config)?;
        let result = self.render_with(&session, pages);
        session.close();
        result
    }

    fn render_with(&self, session: &Session, pages: &[(usize, PathBuf)]) -> Result<Vec<PathBuf>> {
        let bar = ProgressBar::new(pages.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("Converting [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut rendered = Vec::with_capacity(pages.len());
        for (_, html_path) in pages {
            let absolute = fs::canonicalize(html_path)?;
            session.navigate(&format!("file://{}", absolute.display()))?;

            let pdf = session.print_to_pdf().map_err(|e| RipError::RenderFailed {
                path: html_path.clone(),
                reason: e.to_string(),
            })?;

            let pdf_path = html_path.with_extension("pdf");
            fs::write(&pdf_path, pdf)?;
            rendered.push(pdf_path);
            bar.inc(1);
        }
        bar.finish();
        Ok(rendered)
    }
}

/// Concatenate PDFs in the given order into one document.
///
/// Adds a bookmark per input, titled by its file stem. Returns the merged
/// page count.
pub fn concat_documents(inputs: &[PathBuf], output: &Path) -> Result<usize> {
    let bar = ProgressBar::new(inputs.len() as u64 + 1);
    bar.set_style(
        ProgressStyle::with_template("Merging [{bar:40}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut merged = Document::with_version("1.5");
    let mut max_id = 1;
    let mut all_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let mut doc = Document::load(input)
            .map_err(|e| RipError::MergeFailed(format!("{}: {e}", input.display())))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let doc_pages = doc.get_pages();
        if let Some((_, first_page)) = doc_pages.iter().next() {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("chapter")
                .to_string();
            merged.add_bookmark(Bookmark::new(stem, [0.0, 0.0, 1.0], 0, *first_page), None);
        }

        for (_, object_id) in doc_pages {
            let object = doc
                .get_object(object_id)
                .map_err(|e| RipError::MergeFailed(format!("{}: {e}", input.display())))?
                .to_owned();
            all_pages.insert(object_id, object);
        }
        all_objects.extend(doc.objects);
        bar.inc(1);
    }

    // Exactly one Catalog and one Pages node survive; every other non-page
    // object is carried over as-is.
    let mut catalog_object: Option<(ObjectId, Object)> = None;
    let mut pages_object: Option<(ObjectId, Object)> = None;

    for (object_id, object) in &all_objects {
        match object.type_name().unwrap_or("") {
            "Catalog" => {
                catalog_object = Some((
                    if let Some((id, _)) = catalog_object { id } else { *object_id },
                    object.clone(),
                ));
            }
            "Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, ref existing)) = pages_object {
                        if let Ok(existing_dict) = existing.as_dict() {
                            dictionary.extend(&existing_dict.clone());
                        }
                    }
                    pages_object = Some((
                        if let Some((id, _)) = pages_object { id } else { *object_id },
                        Object::Dictionary(dictionary),
                    ));
                }
            }
            "Page" => {}
            "Outlines" => {}
            "Outline" => {}
            _ => {
                merged.objects.insert(*object_id, object.clone());
            }
        }
    }

    let Some(pages_object) = pages_object else {
        return Err(RipError::MergeFailed("no Pages root found in inputs".to_string()));
    };
    let Some(catalog_object) = catalog_object else {
        return Err(RipError::MergeFailed("no Catalog found in inputs".to_string()));
    };

    for (object_id, object) in &all_pages {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_object.0);
            merged.objects.insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", all_pages.len() as i64);
        dictionary.set(
            "Kids",
            all_pages.keys().map(|object_id| Object::Reference(*object_id)).collect::<Vec<_>>(),
        );
        merged.objects.insert(pages_object.0, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_object.1.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_object.0);
        dictionary.remove(b"Outlines");
        merged.objects.insert(catalog_object.0, Object::Dictionary(dictionary));
    }

    merged.trailer.set("Root", catalog_object.0);
    merged.max_id = merged.objects.len() as u32;
    merged.renumber_objects();
    merged.adjust_zero_pages();

    // Renumbering rewrote every id, so the catalog is re-resolved through the
    // trailer before the outline tree is attached.
    let root_id = merged
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| RipError::MergeFailed(format!("merged catalog unresolvable: {e}")))?;
    if let Some(outline_id) = merged.build_outline() {
        if let Ok(Object::Dictionary(dict)) = merged.get_object_mut(root_id) {
            dict.set("Outlines", Object::Reference(outline_id));
        }
    }

    merged.compress();
    merged
        .save(output)
        .map_err(|e| RipError::MergeFailed(format!("{}: {e}", output.display())))?;
    bar.finish();

    Ok(all_pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// A minimal single-page document; the media box width tags the page so
    /// ordering is observable after a merge.
    fn single_page_pdf(path: &Path, width: i64) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 800.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn page_widths(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|page_id| {
                let dict = doc.get_object(*page_id).unwrap().as_dict().unwrap();
                let media_box = dict.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_concat_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("0000_a.pdf");
        let second = dir.path().join("0001_b.pdf");
        let third = dir.path().join("0002_c.pdf");
        single_page_pdf(&first, 101);
        single_page_pdf(&second, 202);
        single_page_pdf(&third, 303);

        let merged_path = dir.path().join("merged.pdf");
        let count =
            concat_documents(&[first, second, third], &merged_path).expect("merge failed");

        assert_eq!(count, 3);
        let merged = Document::load(&merged_path).expect("merged output should load");
        assert_eq!(merged.get_pages().len(), 3);
        assert_eq!(page_widths(&merged), [101, 202, 303]);
    }

    #[test]
    fn test_concat_single_document() {
        let dir = tempfile::tempdir().unwrap();
        let only = dir.path().join("0000_only.pdf");
        single_page_pdf(&only, 400);

        let merged_path = dir.path().join("out.pdf");
        let count = concat_documents(std::slice::from_ref(&only), &merged_path).unwrap();

        assert_eq!(count, 1);
        assert!(merged_path.exists());
    }

    #[test]
    fn test_concat_rejects_garbage_input() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("0000_bogus.pdf");
        fs::write(&bogus, b"not a pdf").unwrap();

        let err = concat_documents(&[bogus], &dir.path().join("out.pdf")).unwrap_err();
        assert!(matches!(err, RipError::MergeFailed(_)));
    }
}
