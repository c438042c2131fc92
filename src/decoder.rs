//! Turns service replies into data or errors.
//!
//! Both formats report failures inside the document: XML as
//! `<rsp stat="fail"><err code="..." msg="..."/></rsp>`, JSON as
//! `{"stat": "fail", ...}` (optionally wrapped in `"rsp"`).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Error, Format, Result, TransportResponse};

const FAILURE_STAT: &str = "fail";
const UNKNOWN_FAILURE: &str = "unknown error";

/// Successfully decoded reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    Xml(XmlElement),
}

impl Decoded {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Decoded::Json(value) => Some(value),
            Decoded::Xml(_) => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Decoded::Xml(element) => Some(element),
            Decoded::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Decoded::Json(value) => Some(value),
            Decoded::Xml(_) => None,
        }
    }

    pub fn into_xml(self) -> Option<XmlElement> {
        match self {
            Decoded::Xml(element) => Some(element),
            Decoded::Json(_) => None,
        }
    }
}

/// Owned XML element tree. Text of mixed content is concatenated, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Walk a `/`-separated path of child names, e.g. `"user/location"`.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |element, name| element.child(name))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let mut element = XmlElement {
            name: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            ..Default::default()
        };
        for child in node.children() {
            if child.is_element() {
                element.children.push(XmlElement::from_node(child));
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    element.text.push_str(text.trim());
                }
            }
        }
        element
    }
}

/// Decode a body in `format`.
pub fn decode(body: &str, format: Format) -> Result<Decoded> {
    match format {
        Format::Json => decode_json(body),
        Format::Xml => decode_xml(body),
    }
}

/// Decode a transport reply, taking the HTTP status into account.
///
/// A failure document wins over the status. A failed status with nothing
/// recognizable in the body becomes [`Error::Service`] with the body text.
pub(crate) fn decode_response(response: &TransportResponse, format: Format) -> Result<Decoded> {
    match decode(&response.body, format) {
        Ok(_) | Err(Error::MalformedResponse(_)) if !response.is_success() => {
            Err(Error::Service(response.failure_text()))
        }
        other => other,
    }
}

fn decode_json(body: &str) -> Result<Decoded> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON: {}", e)))?;
    let rsp = value.get("rsp").unwrap_or(&value);
    if rsp.get("stat").and_then(Value::as_str) == Some(FAILURE_STAT) {
        let message = rsp
            .pointer("/err/msg")
            .or_else(|| rsp.get("message"))
            .or_else(|| rsp.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_FAILURE);
        return Err(Error::Service(message.to_string()));
    }
    Ok(Decoded::Json(value))
}

fn decode_xml(body: &str) -> Result<Decoded> {
    let document = roxmltree::Document::parse(body)
        .map_err(|e| Error::MalformedResponse(format!("invalid XML: {}", e)))?;
    let root = XmlElement::from_node(document.root_element());
    if root.name == "rsp" && root.attribute("stat") == Some(FAILURE_STAT) {
        let message = root
            .child("err")
            .and_then(|err| err.attribute("msg"))
            .unwrap_or(UNKNOWN_FAILURE);
        return Err(Error::Service(message.to_string()));
    }
    Ok(Decoded::Xml(root))
}
