use super::error::UtilError;
use log::{error, warn};
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

/// Element of a parsed XML document. Names are local names with any namespace prefix removed
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XmlNode {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) text: String,
    pub(crate) children: Vec<XmlNode>,
}

impl XmlNode {
    /// Get an attribute value by name
    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct children with the provided name
    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First direct child with the provided name
    pub(crate) fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All elements in document order (including this one) with the provided name
    pub(crate) fn descendants(&self, name: &str) -> Vec<&XmlNode> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlNode>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_descendants(name, found);
        }
    }
}

/// Parse a XML document into a tree of `XmlNode`
pub(crate) fn parse_xml_tree(xml: &str) -> Result<XmlNode, UtilError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event() {
            Err(err) => {
                error!(
                    "[gptcore] Could not read xml data at position {}: {err:?}",
                    reader.buffer_position()
                );
                return Err(UtilError::ParseXml);
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(tag)) => stack.push(start_node(&tag)?),
            Ok(Event::Empty(tag)) => {
                let node = start_node(&tag)?;
                attach_node(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                let node = match stack.pop() {
                    Some(result) => result,
                    None => {
                        error!("[gptcore] Unexpected closing tag in xml data");
                        return Err(UtilError::ParseXml);
                    }
                };
                attach_node(&mut stack, &mut root, node);
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    match text.unescape() {
                        Ok(value) => current.text.push_str(&value),
                        Err(err) => {
                            warn!("[gptcore] Could not unescape xml text: {err:?}");
                            current
                                .text
                                .push_str(&String::from_utf8_lossy(text.as_ref()));
                        }
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            _ => continue,
        }
    }

    if !stack.is_empty() {
        error!("[gptcore] XML data ended with {} unclosed elements", stack.len());
        return Err(UtilError::ParseXml);
    }

    match root {
        Some(result) => Ok(result),
        None => {
            error!("[gptcore] XML data has no root element");
            Err(UtilError::ParseXml)
        }
    }
}

fn start_node(tag: &BytesStart<'_>) -> Result<XmlNode, UtilError> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(tag.local_name().as_ref()).to_string(),
        ..Default::default()
    };

    for attr_result in tag.attributes() {
        let attr = match attr_result {
            Ok(result) => result,
            Err(err) => {
                error!("[gptcore] Could not parse xml attribute: {err:?}");
                return Err(UtilError::ParseXml);
            }
        };
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(result) => result.to_string(),
            Err(err) => {
                warn!("[gptcore] Could not unescape xml attribute {key}: {err:?}");
                String::from_utf8_lossy(&attr.value).to_string()
            }
        };
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach_node(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    if root.is_none() {
        *root = Some(node);
    }
}
