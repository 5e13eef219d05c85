use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::AnnotError;

/// One node of a parsed markup document: tag name, resolved namespace,
/// attributes, direct text content and child elements, independent of the
/// source serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    fn new(name: String, namespace: Option<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            name,
            namespace,
            attrs,
            children: Vec::new(),
            text: String::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }
}

/// Parses a namespaced document into an [`Element`] tree and returns its
/// root element.
pub fn parse_document(xml: &str) -> Result<Element, AnnotError> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event() {
            Err(err) => return Err(AnnotError::Markup(err.to_string())),
            Ok((_, Event::Eof)) => break,
            Ok((resolve, Event::Start(start))) => {
                let element = element_from_start(resolve, &start)?;
                stack.push(element);
            }
            Ok((resolve, Event::Empty(start))) => {
                let element = element_from_start(resolve, &start)?;
                attach(&mut stack, &mut root, element);
            }
            Ok((_, Event::End(_))) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| AnnotError::Markup("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok((_, Event::Text(text))) => {
                let text = text
                    .unescape()
                    .map_err(|err| AnnotError::Markup(err.to_string()))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(data))) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(_) => {}
        }
    }

    root.ok_or_else(|| AnnotError::Markup("document has no root element".to_string()))
}

fn element_from_start(
    resolve: ResolveResult<'_>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, AnnotError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let namespace = match resolve {
        ResolveResult::Bound(Namespace(ns)) => Some(String::from_utf8_lossy(ns).into_owned()),
        _ => None,
    };
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| AnnotError::Markup(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| AnnotError::Markup(err.to_string()))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(Element::new(name, namespace, attrs))
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[derive(Debug, Clone)]
enum AttrFilter {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone)]
struct Step {
    name: String,
    filter: Option<AttrFilter>,
}

/// A fixed path of (possibly attribute-filtered) tag names evaluated
/// relative to a root element, with every step qualified by one namespace.
#[derive(Debug, Clone)]
pub struct TagPath {
    namespace: Option<String>,
    steps: Vec<Step>,
}

impl TagPath {
    pub fn new() -> Self {
        Self {
            namespace: None,
            steps: Vec::new(),
        }
    }

    pub fn in_namespace(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            steps: Vec::new(),
        }
    }

    pub fn child(mut self, name: &str) -> Self {
        self.steps.push(Step {
            name: name.to_string(),
            filter: None,
        });
        self
    }

    /// Step matching `name` only when the attribute equals `value`.
    pub fn child_where(mut self, name: &str, attr: &str, value: &str) -> Self {
        self.steps.push(Step {
            name: name.to_string(),
            filter: Some(AttrFilter::Equals(attr.to_string(), value.to_string())),
        });
        self
    }

    /// Step matching `name` only when the attribute is present, whatever
    /// its value.
    pub fn child_with_attr(mut self, name: &str, attr: &str) -> Self {
        self.steps.push(Step {
            name: name.to_string(),
            filter: Some(AttrFilter::Present(attr.to_string())),
        });
        self
    }

    /// All elements reached by walking the path from `root`, in document
    /// order.
    pub fn find_all<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        let mut matches: Vec<&Element> = vec![root];
        for step in &self.steps {
            matches = matches
                .iter()
                .flat_map(|element| element.children.iter())
                .filter(|child| self.step_matches(step, child))
                .collect();
        }
        matches
    }

    /// The single element the path points at, or `None` when the path
    /// matches nothing. An ambiguous match (more than one node) is
    /// deliberately treated as absent rather than resolved by picking the
    /// first node; it is logged so it can be told apart from a genuinely
    /// missing field.
    pub fn find_one<'a>(&self, root: &'a Element) -> Option<&'a Element> {
        let matches = self.find_all(root);
        match matches.len() {
            1 => Some(matches[0]),
            0 => None,
            count => {
                tracing::warn!(path = %self.describe(), count, "ambiguous match treated as absent");
                None
            }
        }
    }

    fn step_matches(&self, step: &Step, element: &Element) -> bool {
        if element.name != step.name {
            return false;
        }
        if let Some(namespace) = &self.namespace {
            if element.namespace.as_deref() != Some(namespace.as_str()) {
                return false;
            }
        }
        match &step.filter {
            None => true,
            Some(AttrFilter::Present(attr)) => element.attr(attr).is_some(),
            Some(AttrFilter::Equals(attr, value)) => element.attr(attr) == Some(value.as_str()),
        }
    }

    fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|step| step.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Default for TagPath {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<uniprot xmlns="http://uniprot.org/uniprot">
  <entry>
    <gene>
      <name type="primary">rpoE</name>
      <name type="synonym">sigE</name>
    </gene>
    <comment type="function"><text>Sigma factor.</text></comment>
    <comment type="function"><text>Second note.</text></comment>
  </entry>
</uniprot>"#;

    #[test]
    fn parses_namespaced_tree() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.name, "uniprot");
        assert_eq!(root.namespace.as_deref(), Some("http://uniprot.org/uniprot"));
        assert_eq!(root.children[0].name, "entry");
    }

    #[test]
    fn attribute_filtered_step_selects_single_node() {
        let root = parse_document(DOC).unwrap();
        let path = TagPath::in_namespace("http://uniprot.org/uniprot")
            .child("entry")
            .child("gene")
            .child_where("name", "type", "primary");
        let node = path.find_one(&root).unwrap();
        assert_eq!(node.text(), "rpoE");
    }

    #[test]
    fn ambiguous_match_yields_absent() {
        let root = parse_document(DOC).unwrap();
        let path = TagPath::in_namespace("http://uniprot.org/uniprot")
            .child("entry")
            .child("gene")
            .child("name");
        assert!(path.find_one(&root).is_none());
        assert_eq!(path.find_all(&root).len(), 2);
    }

    #[test]
    fn namespace_mismatch_matches_nothing() {
        let root = parse_document(DOC).unwrap();
        let path = TagPath::in_namespace("http://example.org/other").child("entry");
        assert!(path.find_all(&root).is_empty());
    }

    #[test]
    fn find_all_preserves_document_order() {
        let root = parse_document(DOC).unwrap();
        let path = TagPath::in_namespace("http://uniprot.org/uniprot")
            .child("entry")
            .child_where("comment", "type", "function")
            .child("text");
        let texts: Vec<&str> = path.find_all(&root).iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["Sigma factor.", "Second note."]);
    }
}
