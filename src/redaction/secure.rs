//! Secure redaction strategy for PDF documents using MuPDF.
//!
//! Text is extracted per page with `pdf-extract`. Redaction creates MuPDF
//! redaction annotations over every visual occurrence of each matched string
//! and applies them with `pdf_redact_page`, which removes the underlying
//! glyphs, vector paths and image pixels and paints a solid black box.
//!
//! Only machine-extractable text can be redacted. Scanned pages and text
//! baked into images yield no matches.

use super::strategy::{RedactionResult, RedactionStrategy, UnitMatches};
use crate::document::{DocumentFormat, Extraction, UnitLocator};
use crate::error::{RedactorError, RedactorResult};

use mupdf::pdf::{PdfAnnotationType, PdfDocument, PdfPage};
use mupdf::Rect as MuRect;
use std::path::Path;

/// Secure redaction strategy that physically removes text using MuPDF.
///
/// This strategy:
/// 1. Searches each page for the matched strings
/// 2. Creates PDF redaction annotations at the hit locations, with
///    overlapping hits collapsed into a single box
/// 3. Applies redactions (physical removal) and serializes the document
#[derive(Debug, Clone)]
pub struct SecureRedactionStrategy {
    /// Maximum search hits per matched string per page
    max_hits: u32,
}

impl Default for SecureRedactionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureRedactionStrategy {
    /// Creates a new secure redaction strategy with default settings.
    pub fn new() -> Self {
        Self { max_hits: 500 }
    }

    /// Sets the maximum number of search hits per matched string.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }

    pub fn max_hits(&self) -> u32 {
        self.max_hits
    }

    /// Collects the boxes to redact on one page.
    fn page_boxes(
        &self,
        page: &mupdf::Page,
        page_number: usize,
        needles: &[&str],
    ) -> RedactorResult<Vec<BoxRegion>> {
        let mut boxes = Vec::new();
        for needle in needles {
            let hits = page.search(needle, self.max_hits).map_err(|e| {
                RedactorError::BackendError {
                    backend: "MuPDF".to_string(),
                    message: format!("Search failed on page {} for '{}'", page_number, needle),
                    source: Some(Box::new(e)),
                }
            })?;

            if hits.is_empty() {
                tracing::debug!(page = page_number, needle, "matched text has no visual hit");
            }

            for quad in hits {
                boxes.push(BoxRegion {
                    x0: quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
                    y0: quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
                    x1: quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
                    y1: quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
                });
            }
        }
        Ok(merge_boxes(boxes))
    }
}

impl RedactionStrategy for SecureRedactionStrategy {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> RedactorResult<Extraction> {
        lopdf::Document::load_mem(bytes)
            .map_err(|e| RedactorError::corrupt("PDF", "failed to parse document structure", e))?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            RedactorError::CorruptDocument {
                format: "PDF".to_string(),
                message: format!("text extraction failed: {}", e),
                source: None,
            }
        })?;

        Ok(Extraction::from_units(
            pages
                .into_iter()
                .enumerate()
                .map(|(i, text)| (UnitLocator::Page(i + 1), text)),
            "",
        ))
    }

    fn apply(
        &self,
        bytes: &[u8],
        extraction: &Extraction,
        matches: &[UnitMatches],
    ) -> RedactorResult<(Vec<u8>, RedactionResult)> {
        // MuPDF opens and saves by path, so the document passes through a
        // scratch directory that is removed on drop.
        let scratch = tempfile::tempdir().map_err(|e| RedactorError::BackendError {
            backend: "std::io".to_string(),
            message: "Failed to create scratch directory".to_string(),
            source: Some(Box::new(e)),
        })?;
        let input_path = scratch.path().join("input.pdf");
        std::fs::write(&input_path, bytes).map_err(|e| RedactorError::Io {
            path: input_path.clone(),
            source: e,
        })?;

        let pdf_doc = PdfDocument::open(utf8_path(&input_path)?)
            .map_err(|e| RedactorError::corrupt("PDF", "MuPDF could not open document", e))?;

        let page_count = pdf_doc
            .page_count()
            .map_err(|e| RedactorError::BackendError {
                backend: "MuPDF".to_string(),
                message: format!("Failed to get page count: {}", e),
                source: Some(Box::new(e)),
            })?;

        let mut result = RedactionResult {
            units_processed: extraction.units().len(),
            secure: true,
            ..Default::default()
        };

        for unit_matches in matches.iter().filter(|m| !m.spans.is_empty()) {
            let unit = &extraction.units()[unit_matches.unit];
            let page_number = unit.locator.number();
            if page_number == 0 || page_number > page_count as usize {
                return Err(RedactorError::PdfProcessing {
                    message: format!("Extracted page {} is not in the document", page_number),
                    page: Some(page_number),
                    source: None,
                });
            }

            let page = pdf_doc
                .load_page(page_number as i32 - 1)
                .map_err(|e| RedactorError::PdfProcessing {
                    message: format!("Failed to load page {}", page_number),
                    page: Some(page_number),
                    source: Some(Box::new(e)),
                })?;

            let needles = search_needles(unit_matches.spans.iter().map(|s| s.text.as_str()));
            let boxes = self.page_boxes(&page, page_number, &needles)?;
            if boxes.is_empty() {
                continue;
            }

            let mut pdf_page = PdfPage::try_from(page).map_err(|_| RedactorError::PdfProcessing {
                message: "Page does not support annotations".to_string(),
                page: Some(page_number),
                source: None,
            })?;

            for region in &boxes {
                let annot = pdf_page
                    .create_annotation(PdfAnnotationType::Redact)
                    .map_err(|e| RedactorError::PdfProcessing {
                        message: "Failed to create redaction annotation".to_string(),
                        page: Some(page_number),
                        source: Some(Box::new(e)),
                    })?;

                unsafe {
                    ffi::set_annotation_rect(&annot, region.to_mupdf());
                }
            }

            pdf_page
                .redact()
                .map_err(|e| RedactorError::PdfProcessing {
                    message: format!("Failed to apply redactions on page {}", page_number),
                    page: Some(page_number),
                    source: Some(Box::new(e)),
                })?;

            tracing::debug!(page = page_number, marks = boxes.len(), "page redacted");
            result.marks_applied += boxes.len();
            result.units_modified += 1;
        }

        let output_path = scratch.path().join("redacted.pdf");
        pdf_doc
            .save(utf8_path(&output_path)?)
            .map_err(|e| RedactorError::PdfProcessing {
                message: "Failed to save redacted PDF".to_string(),
                page: None,
                source: Some(Box::new(e)),
            })?;
        let output = std::fs::read(&output_path).map_err(|e| RedactorError::Io {
            path: output_path.clone(),
            source: e,
        })?;

        Ok((output, result))
    }

    fn name(&self) -> &str {
        "SecureRedaction"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

fn utf8_path(path: &Path) -> RedactorResult<&str> {
    path.to_str().ok_or_else(|| RedactorError::BackendError {
        backend: "MuPDF".to_string(),
        message: format!("Path is not valid UTF-8: {}", path.display()),
        source: None,
    })
}

/// Distinct search strings for a page, in first-seen order.
///
/// A match that spans lines is searched line by line, since the page search
/// operates on visual lines.
fn search_needles<'a>(texts: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut needles: Vec<&str> = Vec::new();
    for text in texts {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !needles.contains(&line) {
                needles.push(line);
            }
        }
    }
    needles
}

/// Axis-aligned page rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxRegion {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoxRegion {
    fn intersects(&self, other: &BoxRegion) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    fn union(&self, other: &BoxRegion) -> BoxRegion {
        BoxRegion {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn to_mupdf(self) -> MuRect {
        MuRect {
            x0: self.x0,
            y0: self.y0,
            x1: self.x1,
            y1: self.y1,
        }
    }
}

/// Collapses intersecting boxes into their bounding unions.
///
/// Repeats until stable, since a union can grow to touch a box it did not
/// intersect before.
pub fn merge_boxes(mut boxes: Vec<BoxRegion>) -> Vec<BoxRegion> {
    loop {
        let mut merged: Vec<BoxRegion> = Vec::with_capacity(boxes.len());
        let mut changed = false;
        for region in boxes {
            match merged.iter_mut().find(|m| m.intersects(&region)) {
                Some(existing) => {
                    *existing = existing.union(&region);
                    changed = true;
                }
                None => merged.push(region),
            }
        }
        if !changed {
            return merged;
        }
        boxes = merged;
    }
}

/// FFI helpers for MuPDF annotation operations.
mod ffi {
    use mupdf::pdf::PdfAnnotation;
    use mupdf::Rect;

    /// Sets the rectangle for a PDF annotation via FFI.
    ///
    /// # Safety
    /// This function uses unsafe FFI calls to access MuPDF's C API.
    /// The annotation must be valid and the context properly initialized.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) {
        #[repr(C)]
        struct PdfAnnotRaw {
            inner: *mut mupdf_sys::pdf_annot,
        }

        let annot_raw = std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot);
        let ctx = mupdf_sys::mupdf_new_base_context();

        if !ctx.is_null() {
            let fz_rect = mupdf_sys::fz_rect {
                x0: rect.x0,
                y0: rect.y0,
                x1: rect.x1,
                y1: rect.y1,
            };

            mupdf_sys::pdf_set_annot_rect(ctx, annot_raw.inner, fz_rect);
            mupdf_sys::mupdf_drop_base_context(ctx);
        }
    }
}
