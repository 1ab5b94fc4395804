//! Multi-format text extraction for uploaded documents.
//!
//! Dispatches on the declared content type and returns plain UTF-8
//! text. PDF goes through `pdf-extract`; DOCX is opened as a ZIP
//! container and the `w:t` runs of `word/document.xml` are streamed
//! with `quick-xml` in document order, with a paragraph break at each
//! closing `w:p` so the chunker sees the document's structure.
//!
//! Extraction is a pure transform: bytes in, text or a specific error
//! out. A document whose extracted text is empty or whitespace-only is
//! rejected here, before chunking.

use std::io::Read;

use crate::error::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TXT: &str = "text/plain";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Maximum decompressed bytes read from a ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extracts plain text from uploaded bytes according to the declared
/// content type.
pub fn extract_text(bytes: &[u8], content_type: &str) -> Result<String, Error> {
    let text = match content_type {
        MIME_PDF => extract_pdf(bytes)?,
        MIME_TXT => extract_txt(bytes)?,
        MIME_DOCX => extract_docx(bytes)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, Error> {
    // Per-page extraction and page concatenation happen inside the
    // library; a page with no text layer contributes nothing.
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::ExtractionFailed(e.to_string()))
}

fn extract_txt(bytes: &[u8]) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::ExtractionFailed(format!("invalid UTF-8: {}", e)))
}

fn extract_docx(bytes: &[u8]) -> Result<String, Error> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| Error::ExtractionFailed(e.to_string()))?;

    let mut doc_xml = Vec::new();
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| Error::ExtractionFailed(e.to_string()))?;
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| Error::ExtractionFailed(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(Error::ExtractionFailed(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    extract_paragraph_runs(&doc_xml)
}

/// Pulls the text of every `w:t` element, inserting `\n\n` at paragraph
/// ends so downstream chunking can split on paragraph boundaries.
fn extract_paragraph_runs(xml: &[u8]) -> Result<String, Error> {
    let mut out = String::new();
    // No trim_text: whitespace inside a w:t run is significant.
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text_run => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    if !out.is_empty() && !out.ends_with("\n\n") {
                        out.push_str("\n\n");
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::ExtractionFailed(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_content_type_is_rejected() {
        let err = extract_text(b"foo", "application/octet-stream").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn invalid_pdf_bytes_fail_extraction() {
        let err = extract_text(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn invalid_zip_fails_docx_extraction() {
        let err = extract_text(b"not a zip", MIME_DOCX).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn plain_text_decodes_utf8() {
        let text = extract_text("héllo wörld".as_bytes(), MIME_TXT).unwrap();
        assert_eq!(text, "héllo wörld");
    }

    #[test]
    fn invalid_utf8_fails_plain_text() {
        let err = extract_text(&[0xff, 0xfe, 0x41], MIME_TXT).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn whitespace_only_text_is_empty_document() {
        let err = extract_text(b"   \n \t \n  ", MIME_TXT).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn docx_paragraphs_become_blank_line_breaks() {
        let xml = br#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;
        let text = extract_paragraph_runs(xml).unwrap();
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }
}
