//! Element tree for one `<channel>` / `<programme>` subtree, and the
//! language-aware text resolution applied to its children.

/// A parsed XML element: attributes, child elements and inline text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Text directly inside this element (not its children)
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All children with the given tag, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn inline_text(&self) -> &str {
        self.text.trim()
    }

    /// Inline text of this element and all descendants, space separated
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        let own = self.inline_text();
        if !own.is_empty() {
            parts.push(own);
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }

    /// Children named `name` as one text node: `None` when absent, a single
    /// node for one occurrence, `Localized` for several
    pub fn text_node(&self, name: &str) -> Option<TextNode<'_>> {
        let mut nodes: Vec<TextNode<'_>> = self
            .children
            .iter()
            .filter(|c| c.name == name)
            .map(TextNode::from_element)
            .collect();
        match nodes.len() {
            0 => None,
            1 => nodes.pop(),
            _ => Some(TextNode::Localized(nodes)),
        }
    }

    /// Resolved, non-empty text of the children named `name`
    pub fn text_of(&self, name: &str) -> Option<String> {
        self.text_node(name)
            .map(|node| node.resolve())
            .filter(|text| !text.is_empty())
    }
}

/// A value that may be plain text, a list of language variants, or a
/// structured element
#[derive(Debug, Clone, PartialEq)]
pub enum TextNode<'a> {
    Plain(&'a str),
    Localized(Vec<TextNode<'a>>),
    Structured(&'a XmlElement),
}

impl<'a> TextNode<'a> {
    /// Elements with neither attributes nor children are plain text
    pub fn from_element(element: &'a XmlElement) -> Self {
        if element.attributes.is_empty() && element.children.is_empty() {
            TextNode::Plain(element.inline_text())
        } else {
            TextNode::Structured(element)
        }
    }

    pub fn lang(&self) -> Option<&'a str> {
        match *self {
            TextNode::Structured(element) => element.attr("lang").or_else(|| element.attr("xml:lang")),
            _ => None,
        }
    }

    /// Resolve to a string.
    ///
    /// Lists prefer an English entry, then one without a language, then the
    /// first. Structured nodes use their inline text, falling back to the
    /// text of their descendants.
    pub fn resolve(&self) -> String {
        match self {
            TextNode::Plain(text) => text.trim().to_string(),
            TextNode::Localized(nodes) => nodes
                .iter()
                .find(|n| n.lang().is_some_and(is_english))
                .or_else(|| nodes.iter().find(|n| n.lang().is_none()))
                .or_else(|| nodes.first())
                .map(TextNode::resolve)
                .unwrap_or_default(),
            TextNode::Structured(element) => match element.inline_text() {
                "" => element.text_content(),
                text => text.to_string(),
            },
        }
    }
}

/// `en`, `EN`, `en-GB`, `en_US`
fn is_english(lang: &str) -> bool {
    let lang = lang.trim();
    lang.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("en"))
        && matches!(lang.as_bytes().get(2), None | Some(b'-') | Some(b'_'))
}
