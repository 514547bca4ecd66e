//! Thin wrapper over the quick-xml writer.

use crate::error::{MirrorError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Indented XML document builder.
pub struct XmlDoc {
    writer: Writer<Vec<u8>>,
}

impl std::fmt::Debug for XmlDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlDoc").finish_non_exhaustive()
    }
}

impl XmlDoc {
    /// Start a document with the XML declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| MirrorError::Xml(e.to_string()))?;
        Ok(Self { writer })
    }

    fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut elem = BytesStart::new(name);
        for (key, value) in attrs {
            elem.push_attribute((*key, *value));
        }
        elem
    }

    /// Open an element.
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer
            .write_event(Event::Start(Self::element(name, attrs)))
            .map_err(|e| MirrorError::Xml(e.to_string()))
    }

    /// Write a self-closing element.
    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.writer
            .write_event(Event::Empty(Self::element(name, attrs)))
            .map_err(|e| MirrorError::Xml(e.to_string()))
    }

    /// Write `<name attrs>text</name>`; the text is XML-escaped.
    pub fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| MirrorError::Xml(e.to_string()))?;
        self.end(name)
    }

    /// Close an element.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(|e| MirrorError::Xml(e.to_string()))
    }

    /// Finish, returning the document bytes with a trailing newline.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        let mut out = self.writer.into_inner();
        out.push(b'\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text() {
        let mut doc = XmlDoc::new().unwrap();
        doc.text_element("summary", &[], "a < b & c").unwrap();
        let out = String::from_utf8(doc.finish()).unwrap();
        assert!(out.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn nested_structure() {
        let mut doc = XmlDoc::new().unwrap();
        doc.start("metadata", &[("packages", "1")]).unwrap();
        doc.empty("location", &[("href", "Packages/x.rpm")]).unwrap();
        doc.end("metadata").unwrap();
        let out = String::from_utf8(doc.finish()).unwrap();
        assert!(out.contains(r#"<metadata packages="1">"#));
        assert!(out.contains(r#"<location href="Packages/x.rpm"/>"#));
    }
}
