//! Event reader over `quick-xml` plus the attribute and text helpers needed
//! to walk the parts of an xlsx package.

use crate::error::SheetReportError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),
}

/// Pull reader reusing one event buffer. Empty elements are expanded, so
/// every start event has a matching end event.
pub(crate) struct XmlReader<R: BufRead> {
    inner: Reader<R>,
    scratch: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut inner = Reader::from_reader(source);
        let config = inner.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = false;
        config.check_comments = false;
        config.trim_text(false);
        XmlReader {
            inner,
            scratch: Vec::with_capacity(1024),
        }
    }

    /// Next event, `None` once the document is exhausted.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, SheetReportError> {
        self.scratch.clear();
        match self.inner.read_event_into(&mut self.scratch)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait AttributeLookup<'a> {
    /// Unescaped value of the attribute with the given local name. Namespace
    /// declarations are never matched.
    fn attribute(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SheetReportError>;
}

impl<'a> AttributeLookup<'a> for BytesStart<'a> {
    fn attribute(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SheetReportError> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.key.as_namespace_binding().is_none() && attribute.key.local_name().as_ref() == name.as_bytes() {
                return Ok(Some(attribute.unescape_value()?));
            }
        }
        Ok(None)
    }
}

/// Expands a general reference such as `&amp;`, `&#20013;` or `&#x4E2D;` into `text`.
pub(crate) fn push_reference(text: &mut String, reference: &BytesRef) -> Result<(), SheetReportError> {
    let name = reference.xml_content()?;
    let Some(code) = name.strip_prefix('#') else {
        let entity = resolve_xml_entity(&name).ok_or_else(|| XmlError::UnknownEntity(name.to_string()))?;
        text.push_str(entity);
        return Ok(());
    };
    let code = match code.strip_prefix(&['x', 'X'][..]) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => code.parse::<u32>()?,
    };
    text.extend(char::from_u32(code));
    Ok(())
}

/// Loops over the events of an [`XmlReader`], ignoring events without an arm
/// and stopping at the end of the document.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
