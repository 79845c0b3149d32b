//! Read-only access to inline XML content.
//!
//! Inline content arrives already parsed into an [`XmlElement`] tree. This
//! module exposes child lookup by namespace-stripped local name, DOM-style
//! text content, and a small XPath-like [`NodePath`] used by custom mappings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strip any `prefix:` from a qualified name.
pub fn local_name(qualified: &str) -> &str {
    match qualified.find(':') {
        Some(index) => &qualified[index + 1..],
        None => qualified,
    }
}

/// One element of an inline content tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct XmlElement {
    /// Qualified name, possibly `prefix:local`
    pub name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    /// Character data directly inside this element
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter()
    }

    /// First child whose local name matches
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Attribute lookup ignoring any namespace prefix
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| local_name(name) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of this element and all descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// `m:null="true"` marks an explicit null.
    pub fn is_null(&self) -> bool {
        self.attribute("null") == Some("true")
    }

    /// Children of the `properties` container.
    ///
    /// Accepts the container itself as the root, or a wrapper holding it as
    /// a direct child. Returns `None` when no container is present.
    pub fn properties(&self) -> Option<&[XmlElement]> {
        if self.local_name() == "properties" {
            return Some(self.children.as_slice());
        }
        self.child("properties").map(|p| p.children.as_slice())
    }

    /// Evaluate a node path and return the text of the first match.
    pub fn select(&self, path: &NodePath) -> Option<String> {
        self.extract(path)
    }
}

/// A path into an inline content tree.
///
/// # Examples
///
/// Paths are evaluated from the document node above the root element, so
/// the first step names the root whether or not the path starts with `/`.
///
/// - `properties/Name` - `Name` under a `properties` root
/// - `/m:properties/d:Address/d:City` - prefixes ignored
/// - `//City` - any element named `City`
/// - `properties/Phones/Phone[2]` - second `Phone` child
/// - `properties/Address/@kind` - attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    /// The raw path string
    pub raw: String,
    /// Written with a leading `/`; both forms start at the document node
    pub absolute: bool,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
}

/// A step in a node path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A child element matched by local name, optionally positional (1-based)
    Element { name: String, position: Option<usize> },
    /// Any child element (`*`)
    Wildcard,
    /// Descendant-or-self axis (`//`)
    Descendants,
    /// Attribute value (`@name`)
    Attribute(String),
    /// Text of the context node (`text()`)
    Text,
}

impl NodePath {
    /// Parse a node path
    ///
    /// # Example
    ///
    /// ```
    /// use feedmat::xml::NodePath;
    ///
    /// let path = NodePath::parse("/m:properties/d:Address/d:City");
    /// assert!(path.absolute);
    /// assert_eq!(path.segments.len(), 3);
    /// ```
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let absolute = trimmed.starts_with('/');
        let mut segments = Vec::new();

        // A leading "//" yields an empty first step, which marks the descendant axis.
        let mut steps = trimmed.split('/').peekable();
        if trimmed.starts_with('/') {
            steps.next();
        }

        while let Some(step) = steps.next() {
            if step.is_empty() {
                if steps.peek().is_some() {
                    segments.push(PathSegment::Descendants);
                }
                continue;
            }
            segments.push(Self::parse_step(step));
        }

        Self {
            raw: path.to_string(),
            absolute,
            segments,
        }
    }

    fn parse_step(step: &str) -> PathSegment {
        if step == "*" {
            return PathSegment::Wildcard;
        }
        if step == "text()" {
            return PathSegment::Text;
        }
        if let Some(attr) = step.strip_prefix('@') {
            return PathSegment::Attribute(local_name(attr).to_string());
        }

        // Check for a positional predicate
        if let (Some(open), true) = (step.find('['), step.ends_with(']')) {
            if let Ok(position) = step[open + 1..step.len() - 1].trim().parse::<usize>() {
                return PathSegment::Element {
                    name: local_name(&step[..open]).to_string(),
                    position: Some(position),
                };
            }
        }

        PathSegment::Element {
            name: local_name(step).to_string(),
            position: None,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Trait for types that can extract values by node path
pub trait Extractor {
    /// Extract a value at the given node path
    ///
    /// Returns `Some(value)` if the path exists, `None` otherwise
    fn extract(&self, path: &NodePath) -> Option<String>;

    /// Extract a value and parse it to a specific type
    fn extract_as<T>(&self, path: &NodePath) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.extract(path).and_then(|s| s.trim().parse().ok())
    }
}

/// What a path step currently points at.
#[derive(Clone, Copy)]
enum Cursor<'a> {
    /// The virtual document node above the root element
    Document(&'a XmlElement),
    Element(&'a XmlElement),
}

impl<'a> Cursor<'a> {
    fn children(self) -> Vec<&'a XmlElement> {
        match self {
            Cursor::Document(root) => vec![root],
            Cursor::Element(e) => e.children.iter().collect(),
        }
    }

    fn descendants_or_self(self, out: &mut Vec<Cursor<'a>>) {
        out.push(self);
        for child in self.children() {
            Cursor::Element(child).descendants_or_self(out);
        }
    }
}

impl Extractor for XmlElement {
    fn extract(&self, path: &NodePath) -> Option<String> {
        let mut context = vec![Cursor::Document(self)];

        for (index, segment) in path.segments.iter().enumerate() {
            let last = index + 1 == path.segments.len();
            match segment {
                PathSegment::Attribute(name) => {
                    if !last {
                        return None;
                    }
                    return context.into_iter().find_map(|c| match c {
                        Cursor::Element(e) => e.attribute(name).map(str::to_string),
                        Cursor::Document(_) => None,
                    });
                }
                PathSegment::Text => {
                    if !last {
                        return None;
                    }
                    return context.into_iter().find_map(|c| match c {
                        Cursor::Element(e) => e.text.clone(),
                        Cursor::Document(_) => None,
                    });
                }
                PathSegment::Descendants => {
                    let mut next = Vec::new();
                    for cursor in context {
                        cursor.descendants_or_self(&mut next);
                    }
                    context = next;
                }
                PathSegment::Wildcard => {
                    context = context
                        .into_iter()
                        .flat_map(|c| c.children())
                        .map(Cursor::Element)
                        .collect();
                }
                PathSegment::Element { name, position } => {
                    let mut next = Vec::new();
                    for cursor in context {
                        let mut matching = cursor
                            .children()
                            .into_iter()
                            .filter(|child| child.local_name() == name.as_str());
                        match position {
                            // Positions are 1-based; [0] never matches.
                            Some(0) => {}
                            Some(p) => {
                                if let Some(hit) = matching.nth(p - 1) {
                                    next.push(Cursor::Element(hit));
                                }
                            }
                            None => next.extend(matching.map(Cursor::Element)),
                        }
                    }
                    context = next;
                }
            }
            if context.is_empty() {
                return None;
            }
        }

        context.into_iter().find_map(|c| match c {
            Cursor::Element(e) => Some(e.text_content()),
            Cursor::Document(root) => Some(root.text_content()),
        })
    }
}
