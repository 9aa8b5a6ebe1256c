//! Format-agnostic text extraction for uploaded documents.
//!
//! Maps a stored file plus its extension to raw UTF-8 text. The supported
//! set is closed: plain text, PDF, and Word documents. Anything else is
//! rejected before the file is opened. Extraction is read-only and never
//! substitutes empty text for a failure; errors propagate so the pipeline
//! aborts instead of deriving insights from garbage.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Extraction failure taxonomy. Each variant is a distinguishable outcome
/// for callers: `UnsupportedFormat` is a rejected upload, `Decode` is bad
/// plain-text bytes, `Unreadable` is a present-but-undecodable file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("plain-text decode failed: {0}")]
    Decode(String),
    #[error("unreadable file: {0}")]
    Unreadable(String),
}

/// File extensions accepted for ingestion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "pdf", "docx", "doc"];

/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extracts the full raw text of `path`, dispatching on its extension.
///
/// The result may be empty (a scanned PDF with no text layer, an empty
/// `.txt`); that is a valid outcome, not an error. PDF pages are
/// concatenated in document order with no page-break marker inserted, so
/// sentence boundaries need not align with page boundaries.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ExtractError::UnsupportedFormat(ext));
    }

    let bytes =
        std::fs::read(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    match ext.as_str() {
        "txt" => extract_plain(bytes),
        "pdf" => extract_pdf(&bytes),
        // Legacy binary .doc is not a ZIP container; it surfaces as
        // Unreadable from the archive open below.
        "docx" | "doc" => extract_docx(&bytes),
        _ => unreachable!("extension already validated"),
    }
}

fn extract_plain(bytes: Vec<u8>) -> Result<String, ExtractError> {
    String::from_utf8(bytes).map_err(|e| ExtractError::Decode(e.to_string()))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Unreadable(format!("pdf: {}", e)))
}

/// Pulls the visible text body out of an OOXML Word document: every `w:t`
/// run inside `word/document.xml`. Embedded objects and images are ignored.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Unreadable(format!("word: {}", e)))?;

    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Unreadable(format!("word: {}", e)))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Unreadable(format!("word: {}", e)))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Unreadable(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Unreadable(
            "word/document.xml not found".to_string(),
        ));
    }

    extract_w_t_elements(&doc_xml)
}

fn extract_w_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Unreadable(format!("word: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
