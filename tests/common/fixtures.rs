//! Test fixtures and document builders.
//!
//! Builders produce real PDF and DOCX bytes so tests exercise the same
//! parsing paths as production documents.

use anyhow::Result;
use docredact::{Document, DocumentFormat};
use printpdf::*;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Builder for DOCX packages.
///
/// Each paragraph is a list of runs, so tests can place a match across run
/// boundaries the way Word splits formatted text.
///
/// # Example
///
/// ```no_run
/// let bytes = TestDocxBuilder::new()
///     .with_paragraph("Contact John Doe at john@x.com")
///     .with_runs(&["Jo", "hn Doe"])
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TestDocxBuilder {
    /// Complete `<w:p>` elements
    paragraphs: Vec<String>,
}

impl TestDocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single-run paragraph.
    pub fn with_paragraph(self, text: &str) -> Self {
        self.with_runs(&[text])
    }

    /// Adds a paragraph made of several runs.
    pub fn with_runs(mut self, runs: &[&str]) -> Self {
        let runs: String = runs.iter().map(|r| run_xml(r)).collect();
        self.paragraphs.push(format!("<w:p>{}</w:p>", runs));
        self
    }

    /// Adds a paragraph whose middle run anchors a text box, the way Word
    /// nests the box's own paragraphs inside the outer one.
    pub fn with_text_box(mut self, before: &str, boxed: &str, after: &str) -> Self {
        self.paragraphs.push(format!(
            "<w:p>{}<w:r><w:drawing><wps:txbx><w:txbxContent><w:p>{}</w:p></w:txbxContent></wps:txbx></w:drawing></w:r>{}</w:p>",
            run_xml(before),
            run_xml(boxed),
            run_xml(after)
        ));
        self
    }

    /// The `word/document.xml` body for the configured paragraphs.
    pub fn document_xml(&self) -> String {
        let body = self.paragraphs.concat();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            body
        )
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("word/document.xml", self.document_xml()),
        ] {
            zip.start_file(name, options)?;
            zip.write_all(data.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn build_document(&self) -> Result<Document> {
        Ok(Document::new(DocumentFormat::Docx, self.build()?))
    }

    /// Builds the package and writes it to `path`.
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        std::fs::write(path, self.build()?)?;
        Ok(path.to_path_buf())
    }
}

fn run_xml(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builder for test PDFs, one page per entry, one text line per string.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: Vec<Vec<String>>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    /// Creates a new test PDF builder with default settings.
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: Vec::new(),
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    /// Sets the document title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Adds a page holding `lines`.
    pub fn with_page(mut self, lines: &[&str]) -> Self {
        self.pages
            .push(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(&self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let empty = vec![String::new()];
        let pages: Vec<&Vec<String>> = if self.pages.is_empty() {
            vec![&empty]
        } else {
            self.pages.iter().collect()
        };

        for (i, lines) in pages.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(page1).get_layer(layer1)
            } else {
                let (page, layer) = doc.add_page(self.page_width, self.page_height, "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            for (row, line) in lines.iter().enumerate() {
                let y = 270.0 - (row as f32) * 10.0;
                layer.use_text(line.as_str(), 12.0, Mm(20.0), Mm(y), &font);
            }
        }

        doc.save(&mut BufWriter::new(std::fs::File::create(output_path)?))?;
        Ok(output_path.to_path_buf())
    }

    /// Builds the PDF into a scratch file and loads it back as a document.
    pub fn build_document(&self, dir: &Path) -> Result<Document> {
        let path = self.build(&dir.join("fixture.pdf"))?;
        Ok(Document::open(&path)?)
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_builder_escapes_runs() {
        let xml = TestDocxBuilder::new()
            .with_runs(&["A & B", "<c>"])
            .document_xml();
        assert!(xml.contains("A &amp; B"));
        assert!(xml.contains("&lt;c&gt;"));
    }
}
