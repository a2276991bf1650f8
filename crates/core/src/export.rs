//! A4 PDF export of assembled documents.
//!
//! The exporter lays out plain text: a bold title, the body split on line
//! breaks and word-wrapped to the printable width, optional header and footer
//! lines from [`DocumentPreferences`], and as many pages as the text needs.
//! Text is drawn with the standard Helvetica fonts in WinAnsi encoding, so no
//! font data is embedded. Characters outside that encoding print as `?`.

use crate::constants::{A4_HEIGHT_PT, A4_WIDTH_PT};
use crate::error::{AskaraError, AskaraResult};
use crate::preferences::DocumentPreferences;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

const MM_TO_PT: f32 = 72.0 / 25.4;

/// Mean Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const BODY_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

/// A rendered PDF and the filename it should be downloaded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPdf {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Download name for a document: `document-<title>.pdf`.
///
/// Characters that are unsafe in file names are replaced with `-`.
pub fn pdf_filename(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        let unsafe_char = c.is_control()
            || c.is_whitespace()
            || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|');
        if unsafe_char {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else {
            slug.push(c);
        }
    }
    let slug = slug.trim_matches(|c| c == '-' || c == '.');
    if slug.is_empty() {
        "document.pdf".to_owned()
    } else {
        format!("document-{slug}.pdf")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExporter;

struct Layout {
    font_size: f32,
    leading: f32,
    left: f32,
    top: f32,
    bottom: f32,
    max_chars: usize,
}

impl Layout {
    fn new(prefs: &DocumentPreferences) -> Self {
        let m = prefs.margins;
        let font_size = prefs.font_size;
        let width = A4_WIDTH_PT - (m.left + m.right) * MM_TO_PT;
        let max_chars = (width / (font_size * AVG_GLYPH_WIDTH)).floor().max(1.0) as usize;
        Self {
            font_size,
            leading: font_size * prefs.line_height,
            left: m.left * MM_TO_PT,
            top: A4_HEIGHT_PT - m.top * MM_TO_PT,
            bottom: m.bottom * MM_TO_PT,
            max_chars,
        }
    }

    fn small(&self) -> f32 {
        (self.font_size - 2.0).max(6.0)
    }
}

impl PdfExporter {
    pub fn new() -> Self {
        Self
    }

    /// Renders `content` under `title` into PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns `AskaraError::InvalidInput` for unusable preferences and
    /// `AskaraError::Pdf` if serialising the document fails.
    pub fn export(
        &self,
        title: &str,
        content: &str,
        prefs: &DocumentPreferences,
    ) -> AskaraResult<Vec<u8>> {
        prefs.validate()?;
        let layout = Layout::new(prefs);

        let lines: Vec<String> = content
            .lines()
            .flat_map(|line| wrap_line(line, layout.max_chars))
            .collect();
        let pages = paginate(&lines, &layout, prefs);
        let page_count = pages.len();

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut page_ids = Vec::with_capacity(page_count);

        for (index, page_lines) in pages.iter().enumerate() {
            let mut ops = Vec::new();
            let mut y = layout.top;

            if !prefs.header_text.trim().is_empty() {
                y -= layout.small();
                show_text(&mut ops, BODY_FONT, layout.small(), layout.left, y, &prefs.header_text);
                y -= layout.leading;
            }
            if index == 0 {
                let title_size = layout.font_size + 4.0;
                y -= title_size;
                show_text(&mut ops, BOLD_FONT, title_size, layout.left, y, title);
                y -= layout.leading;
            }
            for line in page_lines.iter() {
                y -= layout.leading;
                if !line.is_empty() {
                    show_text(&mut ops, BODY_FONT, layout.font_size, layout.left, y, line);
                }
            }

            let footer = footer_line(prefs, index + 1, page_count);
            show_text(&mut ops, BODY_FONT, layout.small(), layout.left, layout.bottom, &footer);

            let encoded = Content { operations: ops }
                .encode()
                .map_err(|e| AskaraError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            page_ids.push(add_page(&mut doc, pages_id, content_id));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_count as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
            ("Resources", Object::Dictionary(font_resources())),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AskaraError::Pdf(e.to_string()))?;
        tracing::debug!("exported '{}' as {} page(s), {} bytes", title, page_count, buffer.len());
        Ok(buffer)
    }
}

/// Splits body lines into pages. The first page loses room to the title;
/// every page loses room to the header and footer. Always yields one page.
fn paginate<'a>(
    lines: &'a [String],
    layout: &Layout,
    prefs: &DocumentPreferences,
) -> Vec<&'a [String]> {
    let mut usable = layout.top - layout.bottom - 2.0 * layout.leading;
    if !prefs.header_text.trim().is_empty() {
        usable -= layout.small() + layout.leading;
    }
    let per_page = ((usable / layout.leading).floor() as usize).max(1);
    let title_room = ((layout.font_size + 4.0 + layout.leading) / layout.leading).ceil() as usize;
    let first_page = per_page.saturating_sub(title_room).max(1);

    if lines.len() <= first_page {
        return vec![lines];
    }
    let (first, rest) = lines.split_at(first_page);
    std::iter::once(first).chain(rest.chunks(per_page)).collect()
}

fn footer_line(prefs: &DocumentPreferences, page: usize, total: usize) -> String {
    let footer = prefs.footer_text.trim();
    if footer.is_empty() {
        format!("{page}/{total}")
    } else {
        format!("{footer} - {page}/{total}")
    }
}

fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut word = word;
        let mut word_len = word.chars().count();

        // Words longer than a full line are hard-split.
        while word_len > max_chars {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            out.push(word[..split].to_owned());
            word = &word[split..];
            word_len -= max_chars;
        }
        if word.is_empty() {
            continue;
        }

        if current_len > 0 && current_len + 1 + word_len > max_chars {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// Encodes text for a WinAnsi-encoded standard font.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            'Œ' => 0x8C,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9C,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

fn show_text(ops: &mut Vec<Operation>, font: &[u8], size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.to_vec()), Object::Real(size)],
    ));
    ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content_id: ObjectId) -> ObjectId {
    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(A4_WIDTH_PT),
                Object::Real(A4_HEIGHT_PT),
            ]),
        ),
        ("Contents", Object::Reference(content_id)),
    ]);
    doc.add_object(page)
}

fn font_resources() -> Dictionary {
    let font = |base: &[u8]| {
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(base.to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]))
    };
    let fonts = Dictionary::from_iter(vec![
        ("F1", font(b"Helvetica")),
        ("F2", font(b"Helvetica-Bold")),
    ]);
    Dictionary::from_iter(vec![("Font", Object::Dictionary(fonts))])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_filename_replaces_unsafe_characters() {
        assert_eq!(pdf_filename("Certificat médical"), "document-Certificat-médical.pdf");
        assert_eq!(pdf_filename("a/b\\c: d?"), "document-a-b-c-d.pdf");
        assert_eq!(pdf_filename("../.."), "document.pdf");
        assert_eq!(pdf_filename("   "), "document.pdf");
    }

    #[test]
    fn test_export_single_page() {
        let bytes = PdfExporter::new()
            .export(
                "Rappel",
                "Bonjour Mme Durand,\n\nà bientôt.",
                &DocumentPreferences::default(),
            )
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert!(contains(&bytes, b"Bonjour Mme Durand,"));
        assert!(contains(&bytes, b"Helvetica"));
    }

    #[test]
    fn test_long_text_is_paginated() {
        let content = (0..200)
            .map(|i| format!("Ligne {i} du compte rendu"))
            .collect::<Vec<_>>()
            .join("\n");
        let bytes = PdfExporter::new()
            .export("Compte rendu", &content, &DocumentPreferences::default())
            .unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 3);
    }

    #[test]
    fn test_export_rejects_invalid_preferences() {
        let prefs = DocumentPreferences {
            line_height: 0.0,
            ..DocumentPreferences::default()
        };
        assert!(PdfExporter::new().export("T", "x", &prefs).is_err());
    }

    #[test]
    fn test_wrap_line() {
        assert_eq!(wrap_line("", 10), vec![""]);
        assert_eq!(wrap_line("un deux trois", 7), vec!["un deux", "trois"]);
        assert_eq!(wrap_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_line("é è ê", 3), vec!["é è", "ê"]);
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(win_ansi("é"), vec![0xE9]);
        assert_eq!(win_ansi("cœur"), vec![b'c', 0x9C, b'u', b'r']);
        assert_eq!(win_ansi("→"), vec![b'?']);
    }

    #[test]
    fn test_paginate_always_yields_a_page() {
        let prefs = DocumentPreferences::default();
        let layout = Layout::new(&prefs);
        assert_eq!(paginate(&[], &layout, &prefs).len(), 1);
    }
}
