//! Element lookup and rewriting inside the namespaced receipt template.
//!
//! Lookups match on local name, namespace URI and the `id` attribute, and return the
//! first match in document order.
//!
//! The tree is read and written with xml-rs events rather than through xmltree's own
//! parser and writer: comments and processing instructions around the root element are
//! kept, and attribute keys hold the qualified name (`xsi:schemaLocation`), so the
//! prefix is written back as it was read.

use crate::utils::error::{ReceiptError, Result};
use std::borrow::Cow;
use std::io::Write;
use xml::attribute::Attribute;
use xml::common::XmlVersion;
use xml::name::{Name, OwnedName};
use xml::namespace::Namespace;
use xml::reader::{ParserConfig, XmlEvent};
use xml::writer::{EmitterConfig, EventWriter, XmlEvent as WriterEvent};
use xmltree::{Element, XMLNode};

pub const LUCOM_NAMESPACE: &str = "http://www.lucom.com/ffw/xml-data-1.0.xsd";

pub const ROOT_TAG: &str = "xml-data";
pub const ELEMENT_TAG: &str = "element";
pub const DATASET_TAG: &str = "dataset";
pub const DATAROW_TAG: &str = "datarow";

#[derive(Debug, Clone)]
pub struct ReceiptTemplate {
    /// Comments and processing instructions before the root element.
    prolog: Vec<XMLNode>,
    root: Element,
    epilog: Vec<XMLNode>,
    namespace: String,
}

/// Attribute key as written in the source, `prefix:local` or `local`.
fn qualified_name(name: &OwnedName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local_name),
        None => name.local_name.clone(),
    }
}

fn is_match(element: &Element, namespace: &str, tag: &str, id: &str) -> bool {
    element.name == tag
        && element.namespace.as_deref() == Some(namespace)
        && element.attributes.get("id").map(String::as_str) == Some(id)
}

fn find<'a>(element: &'a Element, namespace: &str, tag: &str, id: &str) -> Option<&'a Element> {
    if is_match(element, namespace, tag, id) {
        return Some(element);
    }
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .find_map(|child| find(child, namespace, tag, id))
}

fn find_mut<'a>(
    element: &'a mut Element,
    namespace: &str,
    tag: &str,
    id: &str,
) -> Option<&'a mut Element> {
    if is_match(element, namespace, tag, id) {
        return Some(element);
    }
    element
        .children
        .iter_mut()
        .filter_map(XMLNode::as_mut_element)
        .find_map(|child| find_mut(child, namespace, tag, id))
}

impl ReceiptTemplate {
    pub fn parse(data: &[u8], namespace: &str) -> Result<Self> {
        let mut reader = ParserConfig::new()
            .ignore_comments(false)
            .create_reader(data);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root = None;
        let mut open: Vec<Element> = Vec::new();

        loop {
            let node = match reader.next()? {
                XmlEvent::StartElement {
                    name,
                    attributes,
                    namespace: scope,
                } => {
                    let mut element = Element::new(&name.local_name);
                    element.prefix = name.prefix;
                    element.namespace = name.namespace;
                    element.namespaces = (!scope.is_essentially_empty()).then_some(scope);
                    for attribute in attributes {
                        element
                            .attributes
                            .insert(qualified_name(&attribute.name), attribute.value);
                    }
                    open.push(element);
                    continue;
                }
                XmlEvent::EndElement { .. } => {
                    if let Some(element) = open.pop() {
                        match open.last_mut() {
                            Some(parent) => parent.children.push(XMLNode::Element(element)),
                            None => root = Some(element),
                        }
                    }
                    continue;
                }
                XmlEvent::Characters(text) => XMLNode::Text(text),
                XmlEvent::CData(text) => XMLNode::CData(text),
                XmlEvent::Comment(text) => XMLNode::Comment(text),
                XmlEvent::ProcessingInstruction { name, data } => {
                    XMLNode::ProcessingInstruction(name, data)
                }
                XmlEvent::Whitespace(_) | XmlEvent::StartDocument { .. } => continue,
                XmlEvent::EndDocument => break,
            };

            match open.last_mut() {
                Some(parent) => parent.children.push(node),
                None if root.is_none() => prolog.push(node),
                None => epilog.push(node),
            }
        }

        let root = root.ok_or_else(|| ReceiptError::MissingElement {
            id: ROOT_TAG.to_string(),
        })?;
        Ok(Self {
            prolog,
            root,
            epilog,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Top-level comments and processing instructions, before and after the root.
    pub fn outer_nodes(&self) -> (&[XMLNode], &[XMLNode]) {
        (&self.prolog, &self.epilog)
    }

    pub fn has_element(&self, id: &str) -> bool {
        find(&self.root, &self.namespace, ELEMENT_TAG, id).is_some()
    }

    pub fn element_text(&self, id: &str) -> Option<String> {
        find(&self.root, &self.namespace, ELEMENT_TAG, id)
            .and_then(|el| el.get_text())
            .map(|text| text.into_owned())
    }

    /// Replaces the text of the identified element. Returns `false` if there is none.
    pub fn set_element_text(&mut self, id: &str, text: &str) -> bool {
        match find_mut(&mut self.root, &self.namespace, ELEMENT_TAG, id) {
            Some(element) => {
                set_text(element, text);
                true
            }
            None => false,
        }
    }

    /// Like [`set_element_text`](Self::set_element_text), but the element must exist.
    pub fn require_element_text(&mut self, id: &str, text: &str) -> Result<()> {
        if self.set_element_text(id, text) {
            Ok(())
        } else {
            Err(ReceiptError::MissingElement { id: id.to_string() })
        }
    }

    /// Empty row element carrying the dataset's namespace and prefix.
    pub fn new_row(&self, dataset_id: &str) -> Result<Element> {
        let dataset = find(&self.root, &self.namespace, DATASET_TAG, dataset_id).ok_or_else(
            || ReceiptError::MissingElement {
                id: dataset_id.to_string(),
            },
        )?;
        let mut row = Element::new(DATAROW_TAG);
        row.namespace = dataset.namespace.clone();
        row.prefix = dataset.prefix.clone();
        Ok(row)
    }

    /// Drops every existing row of the dataset and appends `rows` in order.
    /// Returns the number of rows removed.
    pub fn replace_rows(&mut self, dataset_id: &str, rows: Vec<Element>) -> Result<usize> {
        let namespace = self.namespace.clone();
        let dataset = find_mut(&mut self.root, &namespace, DATASET_TAG, dataset_id).ok_or_else(
            || ReceiptError::MissingElement {
                id: dataset_id.to_string(),
            },
        )?;

        let before = dataset.children.len();
        dataset.children.retain(|node| match node {
            XMLNode::Element(child) => {
                !(child.name == DATAROW_TAG && child.namespace.as_deref() == Some(&namespace))
            }
            _ => true,
        });
        let removed = before - dataset.children.len();

        dataset
            .children
            .extend(rows.into_iter().map(XMLNode::Element));
        Ok(removed)
    }

    pub fn rows(&self, dataset_id: &str) -> Vec<&Element> {
        find(&self.root, &self.namespace, DATASET_TAG, dataset_id)
            .map(|dataset| {
                dataset
                    .children
                    .iter()
                    .filter_map(XMLNode::as_element)
                    .filter(|child| {
                        child.name == DATAROW_TAG
                            && child.namespace.as_deref() == Some(self.namespace.as_str())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// UTF-8 with declaration and two-space indentation.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = EmitterConfig::new()
            .perform_indent(true)
            .indent_string("  ")
            .write_document_declaration(true)
            .create_writer(Vec::new());

        writer.write(WriterEvent::StartDocument {
            version: XmlVersion::Version10,
            encoding: Some("UTF-8"),
            standalone: None,
        })?;
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        let mut buffer = writer.into_inner();
        buffer.push(b'\n');
        Ok(buffer)
    }
}

/// Child `element` node with an `id` attribute and text, in the parent's namespace.
pub fn field_element(parent: &Element, id: &str, text: &str) -> Element {
    let mut element = Element::new(ELEMENT_TAG);
    element.namespace = parent.namespace.clone();
    element.prefix = parent.prefix.clone();
    element.attributes.insert("id".to_string(), id.to_string());
    set_text(&mut element, text);
    element
}

/// Text of the child `element` with the given id, used to read rows back.
pub fn field_text(row: &Element, id: &str) -> Option<String> {
    row.children
        .iter()
        .filter_map(XMLNode::as_element)
        .find(|child| {
            child.name == ELEMENT_TAG && child.attributes.get("id").map(String::as_str) == Some(id)
        })
        .and_then(|child| child.get_text())
        .map(|text| text.into_owned())
}

fn set_text(element: &mut Element, text: &str) {
    element
        .children
        .retain(|node| !matches!(node, XMLNode::Text(_) | XMLNode::CData(_)));
    element.children.insert(0, XMLNode::Text(text.to_string()));
}

fn write_element<W: Write>(writer: &mut EventWriter<W>, element: &Element) -> Result<()> {
    let mut name = Name::local(&element.name);
    name.namespace = element.namespace.as_deref();
    name.prefix = element.prefix.as_deref();

    let attributes: Vec<Attribute<'_>> = element
        .attributes
        .iter()
        .map(|(key, value)| Attribute {
            name: Name::from(key.as_str()),
            value,
        })
        .collect();

    let empty = Namespace::empty();
    let scope = element.namespaces.as_ref().unwrap_or(&empty);

    writer.write(WriterEvent::StartElement {
        name,
        attributes: Cow::Owned(attributes),
        namespace: Cow::Borrowed(scope),
    })?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write(WriterEvent::EndElement { name: Some(name) })?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut EventWriter<W>, node: &XMLNode) -> Result<()> {
    match node {
        XMLNode::Element(element) => return write_element(writer, element),
        XMLNode::Text(text) => writer.write(WriterEvent::Characters(text))?,
        XMLNode::CData(text) => writer.write(WriterEvent::CData(text))?,
        XMLNode::Comment(text) => writer.write(WriterEvent::Comment(text))?,
        XMLNode::ProcessingInstruction(name, data) => {
            writer.write(WriterEvent::ProcessingInstruction {
                name,
                data: data.as_deref(),
            })?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xml-data xmlns="http://www.lucom.com/ffw/xml-data-1.0.xsd">
  <element id="name">Platzhalter</element>
  <element id="gesamtsumme">0.00</element>
  <dataset id="betraege">
    <datarow>
      <element id="ID_LINE">1</element>
    </datarow>
    <datarow>
      <element id="ID_LINE">2</element>
    </datarow>
  </dataset>
</xml-data>"#;

    fn template() -> ReceiptTemplate {
        ReceiptTemplate::parse(TEMPLATE.as_bytes(), LUCOM_NAMESPACE).unwrap()
    }

    #[test]
    fn test_set_and_read_element_text() {
        let mut doc = template();
        assert_eq!(doc.element_text("name").unwrap(), "Platzhalter");
        assert!(doc.set_element_text("name", "Max Mustermann"));
        assert_eq!(doc.element_text("name").unwrap(), "Max Mustermann");
        assert!(!doc.set_element_text("wert2", "ZEHN"));
    }

    #[test]
    fn test_require_element_text_reports_missing_id() {
        let mut doc = template();
        match doc.require_element_text("wert2", "x") {
            Err(ReceiptError::MissingElement { id }) => assert_eq!(id, "wert2"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_lookup_ignores_foreign_namespace() {
        let xml = r#"<root xmlns="urn:other"><element id="name">x</element></root>"#;
        let doc = ReceiptTemplate::parse(xml.as_bytes(), LUCOM_NAMESPACE).unwrap();
        assert!(!doc.has_element("name"));
    }

    #[test]
    fn test_replace_rows_discards_placeholders() {
        let mut doc = template();
        let mut row = doc.new_row("betraege").unwrap();
        let field = field_element(&row, "ID_LINE", "1");
        row.children.push(XMLNode::Element(field));

        let removed = doc.replace_rows("betraege", vec![row]).unwrap();
        assert_eq!(removed, 2);

        let rows = doc.rows("betraege");
        assert_eq!(rows.len(), 1);
        assert_eq!(field_text(rows[0], "ID_LINE").unwrap(), "1");
        assert_eq!(rows[0].namespace.as_deref(), Some(LUCOM_NAMESPACE));
    }

    #[test]
    fn test_missing_dataset_is_an_error() {
        let xml = r#"<xml-data xmlns="http://www.lucom.com/ffw/xml-data-1.0.xsd"/>"#;
        let mut doc = ReceiptTemplate::parse(xml.as_bytes(), LUCOM_NAMESPACE).unwrap();
        assert!(doc.new_row("betraege").is_err());
        assert!(doc.replace_rows("betraege", Vec::new()).is_err());
    }

    #[test]
    fn test_prefixed_namespace_is_kept_on_new_rows() {
        let xml = r#"<ns:xml-data xmlns:ns="http://www.lucom.com/ffw/xml-data-1.0.xsd">
  <ns:dataset id="betraege"/>
</ns:xml-data>"#;
        let mut doc = ReceiptTemplate::parse(xml.as_bytes(), LUCOM_NAMESPACE).unwrap();
        let row = doc.new_row("betraege").unwrap();
        assert_eq!(row.prefix.as_deref(), Some("ns"));
        doc.replace_rows("betraege", vec![row]).unwrap();

        let output = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(output.contains("<ns:datarow"));
    }

    #[test]
    fn test_serialize_has_declaration_and_indentation() {
        let doc = template();
        let output = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(output.contains("\n  <element id=\"name\">Platzhalter</element>"));
    }

    #[test]
    fn test_round_trip_keeps_outer_comments_and_prefixed_attributes() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Lucom export -->
<?lucom-form version="2"?>
<xml-data xmlns="http://www.lucom.com/ffw/xml-data-1.0.xsd" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.lucom.com/ffw/xml-data-1.0.xsd xml-data.xsd">
  <!-- Kopfdaten -->
  <element id="gesamtsumme">0.00</element>
  <dataset id="betraege">
    <datarow>
      <element id="ID_LINE">1</element>
    </datarow>
  </dataset>
</xml-data>
<!-- Ende -->"#;
        let mut doc = ReceiptTemplate::parse(xml.as_bytes(), LUCOM_NAMESPACE).unwrap();
        let (prolog, epilog) = doc.outer_nodes();
        assert_eq!(prolog.len(), 2);
        assert_eq!(epilog.len(), 1);

        let row = doc.new_row("betraege").unwrap();
        doc.replace_rows("betraege", vec![row]).unwrap();
        doc.require_element_text("gesamtsumme", "12.00").unwrap();

        let output = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        let comment = output.find("<!-- Lucom export -->").unwrap();
        let instruction = output.find("<?lucom-form version=\"2\"?>").unwrap();
        let root = output.find("<xml-data").unwrap();
        assert!(comment < instruction && instruction < root);
        assert!(output.contains(
            "xsi:schemaLocation=\"http://www.lucom.com/ffw/xml-data-1.0.xsd xml-data.xsd\""
        ));
        assert!(output.contains("xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\""));
        assert!(!output.contains(" schemaLocation="));
        assert!(output.contains("<!-- Kopfdaten -->"));
        assert!(output.trim_end().ends_with("<!-- Ende -->"));

        let reparsed = ReceiptTemplate::parse(output.as_bytes(), LUCOM_NAMESPACE).unwrap();
        assert_eq!(reparsed.element_text("gesamtsumme").unwrap(), "12.00");
        assert_eq!(
            reparsed.root.attributes.get("xsi:schemaLocation").map(String::as_str),
            Some("http://www.lucom.com/ffw/xml-data-1.0.xsd xml-data.xsd")
        );
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        let result = ReceiptTemplate::parse(b"<xml-data><unclosed></xml-data>", LUCOM_NAMESPACE);
        assert!(matches!(result, Err(ReceiptError::TemplateParseError(_))));
    }
}
