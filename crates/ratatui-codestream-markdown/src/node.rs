use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected an element node")]
    NotAnElement,
}

/// A node of the serialized element tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    #[serde(rename = "tagName", default)]
    pub tag_name: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(rename = "className", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<ClassName>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// `className` as either a token list or a single space-separated string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassName {
    List(Vec<String>),
    Joined(String),
}

impl ClassName {
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            ClassName::List(list) => list.iter().map(String::as_str).collect(),
            ClassName::Joined(s) => s.split_whitespace().collect(),
        }
    }
}

/// Snapshot of a `<pre>` element subtree for one render pass.
pub type SerializedCodeNode = ElementNode;

impl ElementNode {
    /// Decodes a node from the tree pipeline's JSON. The root must be an element.
    pub fn from_json(json: &str) -> Result<Self, NodeError> {
        match serde_json::from_str::<Node>(json)? {
            Node::Element(el) => Ok(el),
            _ => Err(NodeError::NotAnElement),
        }
    }

    pub fn to_json(&self) -> Result<String, NodeError> {
        Ok(serde_json::to_string(&Node::Element(self.clone()))?)
    }

    /// Builds `pre > code.language-<lang> > text`.
    pub fn pre_code(language: Option<&str>, text: impl Into<String>) -> Self {
        let class_name = language.map(|l| ClassName::List(vec![format!("language-{l}")]));
        let code = ElementNode {
            tag_name: "code".to_string(),
            properties: Properties {
                class_name,
                other: Map::new(),
            },
            children: vec![Node::Text(TextNode { value: text.into() })],
        };
        ElementNode {
            tag_name: "pre".to_string(),
            properties: Properties::default(),
            children: vec![Node::Element(code)],
        }
    }
}
