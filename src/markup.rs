use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::AnnotError;

/// Push-based consumer of a markup event stream.
///
/// Implementors are plain state structs; the driver in [`walk`] calls them
/// in document order. Returning an error aborts the walk.
pub trait MarkupHandler {
    fn on_tag_open(&mut self, tag: &str, attrs: &[(String, String)]) -> Result<(), AnnotError>;
    fn on_text(&mut self, text: &str) -> Result<(), AnnotError>;
    fn on_tag_close(&mut self, tag: &str) -> Result<(), AnnotError>;
}

/// Streams `text` through `handler`. Self-closing elements are delivered as
/// an open immediately followed by a close. Whitespace-only text nodes are
/// dropped so handlers only see meaningful cell content.
pub fn walk<H: MarkupHandler>(text: &str, handler: &mut H) -> Result<(), AnnotError> {
    let mut reader = Reader::from_str(text);
    // Search-results pages are real-world HTML, not strict XML.
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event() {
            Err(err) => return Err(AnnotError::Markup(err.to_string())),
            Ok(Event::Eof) => return Ok(()),
            Ok(Event::Start(start)) => {
                let (tag, attrs) = open_parts(&start)?;
                handler.on_tag_open(&tag, &attrs)?;
            }
            Ok(Event::Empty(start)) => {
                let (tag, attrs) = open_parts(&start)?;
                handler.on_tag_open(&tag, &attrs)?;
                handler.on_tag_close(&tag)?;
            }
            Ok(Event::End(end)) => {
                let tag = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                handler.on_tag_close(&tag)?;
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|err| AnnotError::Markup(err.to_string()))?;
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    handler.on_text(trimmed)?;
                }
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data);
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    handler.on_text(trimmed)?;
                }
            }
            Ok(_) => {}
        }
    }
}

fn open_parts(start: &BytesStart<'_>) -> Result<(String, Vec<(String, String)>), AnnotError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| AnnotError::Markup(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| AnnotError::Markup(err.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok((tag, attrs))
}
