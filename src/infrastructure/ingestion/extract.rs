//! Plain-text extraction from uploaded binaries
//!
//! PDF pages are concatenated in page order. DOCX text is pulled from the
//! `w:t` runs of `word/document.xml`, with paragraphs joined by blank lines
//! so downstream chunking can break on them. All formatting is discarded.

use std::io::Read;

use crate::domain::ingestion::DocumentFormat;
use crate::domain::DomainError;

/// Decompressed bytes allowed for a single ZIP entry
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract plain UTF-8 text from document bytes.
///
/// The format must already be known; callers gate on
/// [`DocumentFormat::from_file_name`] before reading any bytes.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, DomainError> {
    match format {
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Docx => extract_docx(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, DomainError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| DomainError::extraction(format!("PDF extraction failed: {e}")))
}

fn extract_docx(bytes: &[u8]) -> Result<String, DomainError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| DomainError::extraction(format!("DOCX is not a valid archive: {e}")))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| DomainError::extraction("DOCX has no word/document.xml"))?;

        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| DomainError::extraction(format!("failed to read document.xml: {e}")))?;

        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(DomainError::extraction(
                "word/document.xml exceeds size limit",
            ));
        }
    }

    collect_docx_paragraphs(&doc_xml)
}

/// Walk the document XML collecting `w:t` run text, one paragraph per `w:p`
fn collect_docx_paragraphs(xml: &[u8]) -> Result<String, DomainError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_run_text = true;
                }
            }
            Ok(Event::Text(te)) if in_run_text => {
                let text = te
                    .unescape()
                    .map_err(|e| DomainError::extraction(format!("bad XML text: {e}")))?;
                current.push_str(text.as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"p" && !current.trim().is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DomainError::extraction(format!(
                    "malformed document XML: {e}"
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !current.trim().is_empty() {
        paragraphs.push(current);
    }

    Ok(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_document_xml(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        writer
            .start_file("word/document.xml", options)
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();

        writer.finish().unwrap().into_inner()
    }

    const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    #[test]
    fn test_invalid_pdf_bytes_fail() {
        let err = extract_text(b"not a pdf", DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, DomainError::Extraction { .. }));
    }

    #[test]
    fn test_invalid_docx_bytes_fail() {
        let err = extract_text(b"not a zip", DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, DomainError::Extraction { .. }));
    }

    #[test]
    fn test_docx_without_document_xml_fails() {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_text(&bytes, DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, DomainError::Extraction { .. }));
    }

    #[test]
    fn test_docx_paragraphs_joined_with_blank_lines() {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WORD_NS}"><w:body>
<w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
<w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>
</w:body></w:document>"#
        );
        let bytes = docx_with_document_xml(&xml);

        let text = extract_text(&bytes, DocumentFormat::Docx).unwrap();
        assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    }

    #[test]
    fn test_docx_preserves_spaces_across_runs() {
        let xml = format!(
            r#"<w:document xmlns:w="{WORD_NS}"><w:body>
<w:p><w:r><w:t xml:space="preserve">Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
</w:body></w:document>"#
        );
        let bytes = docx_with_document_xml(&xml);

        let text = extract_text(&bytes, DocumentFormat::Docx).unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_docx_unescapes_entities() {
        let xml = format!(
            r#"<w:document xmlns:w="{WORD_NS}"><w:body>
<w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p>
</w:body></w:document>"#
        );
        let bytes = docx_with_document_xml(&xml);

        let text = extract_text(&bytes, DocumentFormat::Docx).unwrap();
        assert_eq!(text, "Fish & chips");
    }

    #[test]
    fn test_docx_skips_empty_paragraphs() {
        let xml = format!(
            r#"<w:document xmlns:w="{WORD_NS}"><w:body>
<w:p><w:r><w:t>Content</w:t></w:r></w:p>
<w:p/>
<w:p><w:r><w:t>   </w:t></w:r></w:p>
<w:p><w:r><w:t>More</w:t></w:r></w:p>
</w:body></w:document>"#
        );
        let bytes = docx_with_document_xml(&xml);

        let text = extract_text(&bytes, DocumentFormat::Docx).unwrap();
        assert_eq!(text, "Content\n\nMore");
    }
}
