use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use common::error::AppError;

/// Location of the main document part inside the DOCX container.
const DOCUMENT_PART: &str = "word/document.xml";

/// Pulls the plain text out of a DOCX file.
///
/// A DOCX is a zip archive; the visible text lives in `<w:t>` runs of
/// `word/document.xml`. Paragraph ends become newlines so the extracted
/// corpus keeps roughly the same line structure as the source document.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, AppError> {
    let cursor = Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|err| AppError::Extraction(format!("not a readable DOCX container: {err}")))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|err| AppError::Extraction(format!("missing {DOCUMENT_PART}: {err}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;

    collect_document_text(&xml)
}

/// Walks the document XML collecting text runs and paragraph breaks.
fn collect_document_text(xml: &str) -> Result<String, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut inside_run = false;

    loop {
        match reader
            .read_event()
            .map_err(|err| AppError::Extraction(format!("malformed document XML: {err}")))?
        {
            Event::Start(element) if element.local_name().as_ref() == b"t" => {
                inside_run = true;
            }
            Event::End(element) if element.local_name().as_ref() == b"t" => {
                inside_run = false;
            }
            Event::End(element) if element.local_name().as_ref() == b"p" => {
                if !text.ends_with('\n') && !text.is_empty() {
                    text.push('\n');
                }
            }
            Event::Text(run) if inside_run => {
                let unescaped = run.unescape().map_err(|err| {
                    AppError::Extraction(format!("undecodable text run: {err}"))
                })?;
                text.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}
