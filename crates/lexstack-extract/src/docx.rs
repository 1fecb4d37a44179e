//! DOCX text extraction: paragraph text from `word/document.xml`.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::ExtractError;

const DOCUMENT_XML: &str = "word/document.xml";

/// Paragraph texts joined by newlines.
///
/// Returns an empty string when the bytes are not a readable DOCX archive.
pub fn extract_docx(bytes: &[u8]) -> String {
    match try_extract_docx(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "docx parse failed, treating as empty");
            String::new()
        }
    }
}

/// Paragraph texts joined by newlines, failing on a broken archive.
pub fn try_extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    match archive.by_name(DOCUMENT_XML) {
        Ok(mut entry) => {
            entry.read_to_string(&mut xml)?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Err(ExtractError::MissingDocumentXml),
        Err(e) => return Err(e.into()),
    }

    let paragraphs = paragraphs(&xml)?;
    debug!(paragraphs = paragraphs.len(), "extracted docx text");
    Ok(paragraphs.join("\n"))
}

/// Walk the body and collect the text of each paragraph.
///
/// A paragraph's text is its runs' `<w:t>` content, with `<w:tab/>` as a tab
/// and text-wrapping `<w:br/>`/`<w:cr/>` as a newline. Text boxes
/// (`<w:txbxContent>`) sit inside runs and are not part of the enclosing
/// paragraph, so they are skipped entirely.
fn paragraphs(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut text_box_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:txbxContent" => text_box_depth += 1,
                _ if text_box_depth > 0 => {}
                b"w:p" => current = Some(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" if run_depth > 0 => in_text = true,
                _ => {}
            },
            Event::Empty(e) if text_box_depth == 0 => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" if run_depth > 0 => push(&mut current, "\t"),
                b"w:br" | b"w:cr" if run_depth > 0 && wraps_text(&e)? => {
                    push(&mut current, "\n")
                }
                _ => {}
            },
            Event::Text(t) if in_text && text_box_depth == 0 => push(&mut current, &t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:txbxContent" => text_box_depth = text_box_depth.saturating_sub(1),
                _ if text_box_depth > 0 => {}
                b"w:p" => paragraphs.extend(current.take()),
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

fn push(paragraph: &mut Option<String>, s: &str) {
    if let Some(p) = paragraph {
        p.push_str(s);
    }
}

/// Page and column breaks carry no text; only text-wrapping breaks do.
fn wraps_text(e: &BytesStart) -> Result<bool, ExtractError> {
    let kind = e
        .try_get_attribute("w:type")
        .map_err(quick_xml::Error::from)?;
    Ok(kind.is_none_or(|a| a.value.as_ref() == b"textWrapping"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn make_docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file::<_, ()>("[Content_Types].xml", FileOptions::default())
            .unwrap();
        zip.write_all(b"<Types/>").unwrap();
        zip.start_file::<_, ()>(DOCUMENT_XML, FileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn joins_paragraphs_with_newlines() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t>IN THE SUPREME COURT</w:t></w:r></w:p><w:p w:rsidR="00A1"><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">Civil </w:t></w:r><w:r><w:t>Appeal</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "IN THE SUPREME COURT\nCivil Appeal");
    }

    #[test]
    fn empty_paragraphs_are_kept() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t>A</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>B</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "A\n\nB");
    }

    #[test]
    fn self_closing_paragraph_with_attributes_is_empty() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t>A</w:t></w:r></w:p><w:p w:rsidR="00A1"/><w:p><w:r><w:t>B</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "A\n\nB");
    }

    #[test]
    fn empty_text_element_adds_nothing() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t xml:space="preserve"/></w:r><w:r><w:t>Order</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "Order");
    }

    #[test]
    fn text_boxes_do_not_swallow_their_paragraph() {
        let docx = make_docx(
            r#"<w:p><w:r><w:pict><v:shape><v:textbox><w:txbxContent><w:p><w:r><w:t>Stamp</w:t></w:r></w:p></w:txbxContent></v:textbox></v:shape></w:pict></w:r><w:r><w:t>The appeal is allowed</w:t></w:r></w:p><w:p><w:r><w:t>Costs to the appellant</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            extract_docx(&docx),
            "The appeal is allowed\nCosts to the appellant"
        );
    }

    #[test]
    fn decodes_entities_and_tabs() {
        let docx = make_docx(
            r#"<w:p><w:r><w:t>Smith &amp; Sons</w:t><w:tab/><w:t>&lt;Respondent&gt; &#167;4 &#x2014;</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "Smith & Sons\t<Respondent> §4 —");
    }

    #[test]
    fn tab_stops_and_page_breaks_are_not_text() {
        let docx = make_docx(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Held</w:t><w:br w:type="page"/><w:t>:</w:t><w:br/><w:t>dismissed</w:t></w:r></w:p>"#,
        );
        assert_eq!(extract_docx(&docx), "Held:\ndismissed");
    }

    #[test]
    fn missing_document_xml() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file::<_, ()>("other.xml", FileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            try_extract_docx(&bytes),
            Err(ExtractError::MissingDocumentXml)
        ));
        assert_eq!(extract_docx(&bytes), "");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let docx = make_docx("<w:p><w:r><w:t>unclosed</w:r></w:p>");
        assert!(matches!(try_extract_docx(&docx), Err(ExtractError::Xml(_))));
        assert_eq!(extract_docx(&docx), "");
    }

    #[test]
    fn not_a_zip() {
        assert!(matches!(
            try_extract_docx(b"plain bytes"),
            Err(ExtractError::Zip(_))
        ));
    }
}
