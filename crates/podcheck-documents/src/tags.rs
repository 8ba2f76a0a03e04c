//! XML documents: first element with a known qualified name.

use quick_xml::events::Event;
use quick_xml::Reader;

use podcheck_core::{Field, ParsedDocument, DocumentFormat};

use crate::error::DocumentError;
use crate::rules::rule_for_tag;

/// An element whose text content is being collected.
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

/// Parse an XML body and apply the field rule table.
///
/// A field takes the text content (text and CDATA of all descendants,
/// untrimmed) of the first element carrying its tag. The body must have
/// exactly one root element and every element must be closed.
pub fn parse_tags(body: &str) -> Result<ParsedDocument, DocumentError> {
    let mut reader = Reader::from_str(body);
    let mut doc = ParsedDocument::new(DocumentFormat::Tags);
    let mut open: Vec<Capture> = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            DocumentError::Xml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(start) => {
                if depth == 0 && saw_root {
                    return Err(DocumentError::Xml("more than one root element".into()));
                }
                depth += 1;
                saw_root = true;
                if let Some(rule) = rule_for_tag(start.name().as_ref()) {
                    let taken = doc.get(rule.field).is_some()
                        || open.iter().any(|c| c.field == rule.field);
                    if !taken {
                        open.push(Capture {
                            field: rule.field,
                            depth,
                            text: String::new(),
                        });
                    }
                }
            }
            Event::Empty(empty) => {
                if depth == 0 && saw_root {
                    return Err(DocumentError::Xml("more than one root element".into()));
                }
                saw_root = true;
                if let Some(rule) = rule_for_tag(empty.name().as_ref()) {
                    if !open.iter().any(|c| c.field == rule.field) {
                        doc.insert(rule.field, "");
                    }
                }
            }
            Event::End(_) => {
                if let Some(pos) = open.iter().position(|c| c.depth == depth) {
                    let capture = open.remove(pos);
                    doc.insert(capture.field, capture.text);
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) => {
                if depth == 0 {
                    if !text.iter().all(u8::is_ascii_whitespace) {
                        return Err(DocumentError::Xml(
                            "text content outside the root element".into(),
                        ));
                    }
                    continue;
                }
                if !open.is_empty() {
                    let text = text
                        .unescape()
                        .map_err(|e| DocumentError::Xml(e.to_string()))?;
                    for capture in &mut open {
                        capture.text.push_str(&text);
                    }
                }
            }
            Event::CData(cdata) => {
                if !open.is_empty() {
                    let raw = cdata.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| DocumentError::Xml(e.to_string()))?;
                    for capture in &mut open {
                        capture.text.push_str(text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(DocumentError::Xml("no root element".into()));
    }
    if depth != 0 {
        return Err(DocumentError::Xml(format!(
            "{} element(s) left open at end of input",
            depth
        )));
    }

    Ok(doc)
}
