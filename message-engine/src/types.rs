//! Request model types shared across the analyzer and builder

use serde::{Deserialize, Serialize};

/// Kind of an HTTP request parameter
///
/// The ordinal codes form the wire contract with embedding hosts:
/// `Url = 0` through `Json = 6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Query-string parameter in the request line
    Url,
    /// `application/x-www-form-urlencoded` body parameter
    Body,
    /// Parameter inside a `Cookie` header
    Cookie,
    /// Leaf element in an XML body
    Xml,
    /// Attribute on an XML tag
    XmlAttr,
    /// One part of a `multipart/form-data` body
    MultipartAttr,
    /// Object key in a JSON body
    Json,
}

impl ParamKind {
    /// Numeric code of this kind, stable across releases
    pub fn code(self) -> u8 {
        match self {
            ParamKind::Url => 0,
            ParamKind::Body => 1,
            ParamKind::Cookie => 2,
            ParamKind::Xml => 3,
            ParamKind::XmlAttr => 4,
            ParamKind::MultipartAttr => 5,
            ParamKind::Json => 6,
        }
    }

    /// Resolve a numeric code back to a kind
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ParamKind::Url),
            1 => Some(ParamKind::Body),
            2 => Some(ParamKind::Cookie),
            3 => Some(ParamKind::Xml),
            4 => Some(ParamKind::XmlAttr),
            5 => Some(ParamKind::MultipartAttr),
            6 => Some(ParamKind::Json),
            _ => None,
        }
    }

    /// Human-readable label for table display
    pub fn label(self) -> &'static str {
        match self {
            ParamKind::Url => "URL",
            ParamKind::Body => "Body",
            ParamKind::Cookie => "Cookie",
            ParamKind::Xml => "XML",
            ParamKind::XmlAttr => "XML attr",
            ParamKind::MultipartAttr => "Multipart attr",
            ParamKind::Json => "JSON",
        }
    }
}

/// Absolute byte range of one parameter occurrence in a raw message
///
/// `end` is exclusive. Spans are only valid for the exact message bytes
/// they were reported against; any edit invalidates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers zero bytes
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// The bytes this span covers in `raw`, if in bounds
    pub fn slice<'a>(&self, raw: &'a [u8]) -> Option<&'a [u8]> {
        raw.get(self.start..self.end)
    }
}

/// One parameter occurrence in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Where in the message the parameter lives
    pub kind: ParamKind,
    /// Parameter name, raw wire text, undecoded
    pub name: String,
    /// Parameter value, raw wire text, undecoded
    pub value: String,
    /// Byte range of the occurrence in the analyzed message
    pub span: Span,
}

/// Result of analyzing a raw request
///
/// `headers[0]` is the request line; the remaining entries are header
/// lines in wire order, without line terminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Request line followed by header lines
    pub headers: Vec<String>,
    /// Byte offset of the first body byte in the raw message
    pub body_offset: usize,
    /// Parameters in report order: query, cookie, then body-derived
    pub parameters: Vec<Parameter>,
}

impl RequestInfo {
    /// The request line, if the message had one
    pub fn request_line(&self) -> Option<&str> {
        self.headers.first().map(|s| s.as_str())
    }

    /// Value of the first header with the given name, case-insensitive
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().skip(1).find_map(|line| {
            let (header, value) = line.split_once(':')?;
            if header.eq_ignore_ascii_case(name) {
                Some(value.trim_start())
            } else {
                None
            }
        })
    }
}
