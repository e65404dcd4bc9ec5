//! Redaction strategy for DOCX documents.
//!
//! Paragraph text is the concatenation of the `<w:t>` runs whose innermost
//! `<w:p>` it is in `word/document.xml`. Redaction replaces every matched character
//! with a block glyph, so the paragraph keeps its length and run layout while
//! the original characters are gone from the saved file. Headers, footers and
//! text inside images are not touched.

use super::strategy::{RedactionResult, RedactionStrategy, UnitMatches};
use crate::document::{DocumentFormat, Extraction, UnitLocator};
use crate::domain::merge_ranges;
use crate::error::{RedactorError, RedactorResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::ops::Range;

const DOCUMENT_PART: &str = "word/document.xml";

/// Default glyph written over redacted characters.
pub const BLOCK_GLYPH: char = '█';

/// Destructive text replacement strategy for flow documents.
#[derive(Debug, Clone)]
pub struct DocxRedactionStrategy {
    glyph: char,
}

impl Default for DocxRedactionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxRedactionStrategy {
    pub fn new() -> Self {
        Self { glyph: BLOCK_GLYPH }
    }

    /// Sets the character written over redacted text.
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn glyph(&self) -> char {
        self.glyph
    }
}

impl RedactionStrategy for DocxRedactionStrategy {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, bytes: &[u8]) -> RedactorResult<Extraction> {
        let entries = read_package(bytes)?;
        let xml = document_xml(&entries)?;
        let paragraphs = parse_paragraphs(xml)?;

        Ok(Extraction::from_units(
            paragraphs
                .into_iter()
                .enumerate()
                .map(|(i, p)| (UnitLocator::Paragraph(i + 1), p.text())),
            "\n",
        ))
    }

    fn apply(
        &self,
        bytes: &[u8],
        extraction: &Extraction,
        matches: &[UnitMatches],
    ) -> RedactorResult<(Vec<u8>, RedactionResult)> {
        let mut entries = read_package(bytes)?;
        let part_index = entries
            .iter()
            .position(|(name, _)| name == DOCUMENT_PART)
            .ok_or_else(missing_part)?;

        let xml = document_xml(&entries)?.to_string();
        let paragraphs = parse_paragraphs(&xml)?;

        let mut result = RedactionResult {
            units_processed: extraction.units().len(),
            secure: true,
            ..Default::default()
        };

        // (content range in xml, replacement) for every changed run
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();
        for unit_matches in matches.iter().filter(|m| !m.spans.is_empty()) {
            let unit = &extraction.units()[unit_matches.unit];
            let paragraph = paragraphs.get(unit.locator.number() - 1).ok_or_else(|| {
                RedactorError::CorruptDocument {
                    format: "DOCX".to_string(),
                    message: format!("{} no longer present in document", unit.locator),
                    source: None,
                }
            })?;

            let masked = merge_ranges(unit_matches.spans.iter().map(|s| s.range()).collect());
            edits.extend(paragraph.blackout(&masked, self.glyph));
            result.marks_applied += masked.len();
            result.units_modified += 1;
        }

        let mut rewritten = xml;
        edits.sort_by_key(|(range, _)| range.start);
        for (range, replacement) in edits.into_iter().rev() {
            rewritten.replace_range(range, &replacement);
        }
        entries[part_index].1 = rewritten.into_bytes();

        Ok((write_package(&entries)?, result))
    }

    fn name(&self) -> &str {
        "BlockGlyphReplacement"
    }

    fn is_secure(&self) -> bool {
        true
    }
}

/// One `<w:t>` run: its content range in the part XML and unescaped text.
#[derive(Debug, Clone)]
struct Run {
    content: Range<usize>,
    text: String,
}

#[derive(Debug, Clone, Default)]
struct Paragraph {
    runs: Vec<Run>,
}

impl Paragraph {
    fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Replacement XML for each run touched by `masked` (paragraph byte ranges).
    fn blackout(&self, masked: &[Range<usize>], glyph: char) -> Vec<(Range<usize>, String)> {
        let mut edits = Vec::new();
        let mut run_start = 0;
        for run in &self.runs {
            let mut changed = false;
            let mut replaced = String::with_capacity(run.text.len());
            for (offset, ch) in run.text.char_indices() {
                let pos = run_start + offset;
                if masked.iter().any(|r| r.contains(&pos)) {
                    replaced.push(glyph);
                    changed = true;
                } else {
                    replaced.push(ch);
                }
            }
            if changed {
                edits.push((run.content.clone(), escape_xml(&replaced)));
            }
            run_start += run.text.len();
        }
        edits
    }
}

/// Paragraph boundaries and text runs, in document order.
fn token_regex() -> &'static Regex {
    static PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(concat!(
            r"(?P<empty><w:p(?:\s[^>]*)?/>)",
            r"|(?P<open><w:p(?:\s[^>]*)?>)",
            r"|(?P<close></w:p>)",
            r"|<w:t(?:\s[^>]*)?>(?P<text>[^<]*)</w:t>",
        ))
        .expect("Valid paragraph token regex")
    });
    &PATTERN
}

/// Parses every `<w:p>` paragraph in document order of its opening tag.
///
/// Paragraphs nest inside text boxes (`<w:txbxContent>`); each run belongs to
/// its innermost enclosing paragraph, so an outer paragraph keeps the runs
/// that follow a nested one. Self-closing `<w:p/>` paragraphs are kept as
/// empty units so paragraph numbering matches what a reader sees.
fn parse_paragraphs(xml: &str) -> RedactorResult<Vec<Paragraph>> {
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    for caps in token_regex().captures_iter(xml) {
        if caps.name("empty").is_some() {
            paragraphs.push(Paragraph::default());
        } else if caps.name("open").is_some() {
            open.push(paragraphs.len());
            paragraphs.push(Paragraph::default());
        } else if let Some(tag) = caps.name("close") {
            if open.pop().is_none() {
                return Err(malformed(format!("unmatched </w:p> at byte {}", tag.start())));
            }
        } else if let Some(text) = caps.name("text") {
            // runs outside any paragraph are not body text
            if let Some(&current) = open.last() {
                paragraphs[current].runs.push(Run {
                    content: text.range(),
                    text: unescape_xml(text.as_str()),
                });
            }
        }
    }

    if !open.is_empty() {
        return Err(malformed(format!("{} unclosed <w:p> element(s)", open.len())));
    }
    Ok(paragraphs)
}

fn malformed(message: String) -> RedactorError {
    RedactorError::CorruptDocument {
        format: "DOCX".to_string(),
        message: format!("{}: {}", DOCUMENT_PART, message),
        source: None,
    }
}

fn missing_part() -> RedactorError {
    RedactorError::CorruptDocument {
        format: "DOCX".to_string(),
        message: format!("package has no {}", DOCUMENT_PART),
        source: None,
    }
}

fn document_xml(entries: &[(String, Vec<u8>)]) -> RedactorResult<&str> {
    let (_, data) = entries
        .iter()
        .find(|(name, _)| name == DOCUMENT_PART)
        .ok_or_else(missing_part)?;
    std::str::from_utf8(data)
        .map_err(|e| RedactorError::corrupt("DOCX", "document part is not UTF-8", e))
}

/// Reads the package into an ordered list of (entry_name, bytes).
fn read_package(bytes: &[u8]) -> RedactorResult<Vec<(String, Vec<u8>)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| RedactorError::corrupt("DOCX", "not a zip package", e))?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| RedactorError::corrupt("DOCX", "unreadable package entry", e))?;
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| RedactorError::corrupt("DOCX", format!("failed to read {}", name), e))?;
        entries.push((name, data));
    }
    Ok(entries)
}

/// Writes entries back in their original order. Media is stored, everything
/// else deflated, matching the layout Word produces.
fn write_package(entries: &[(String, Vec<u8>)]) -> RedactorResult<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let stored =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in entries {
        let opts = if name.starts_with("word/media/") {
            stored
        } else {
            deflated
        };
        zip.start_file(name.as_str(), opts)?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            }?;
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
