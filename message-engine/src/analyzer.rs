//! Request analysis: header splitting and parameter extraction
//!
//! Every extracted parameter carries the absolute byte span of its
//! occurrence so the builder can excise it without re-scanning.

use crate::error::{MessageError, MessageResult};
use crate::types::{ParamKind, Parameter, RequestInfo, Span};
use tracing::debug;

/// One header line with its absolute start offset in the raw message
#[derive(Debug, Clone)]
pub(crate) struct HeaderLine {
    pub text: String,
    pub start: usize,
}

/// Split a raw message into header lines and the body offset.
///
/// Header lines keep their wire text minus line terminators. A blank
/// line ends the header section; without one the body is empty.
pub(crate) fn split_head(raw: &[u8]) -> MessageResult<(Vec<HeaderLine>, usize)> {
    let mut lines = Vec::new();
    let mut pos = 0usize;
    let len = raw.len();
    while pos < len {
        let (line_end, next) = match raw[pos..].iter().position(|&b| b == b'\n') {
            Some(i) => {
                let abs = pos + i;
                let line_end = if abs > pos && raw[abs - 1] == b'\r' {
                    abs - 1
                } else {
                    abs
                };
                (line_end, abs + 1)
            }
            None => (len, len),
        };
        if line_end == pos {
            return Ok((lines, next));
        }
        let text = std::str::from_utf8(&raw[pos..line_end])
            .map_err(|_| MessageError::HeaderEncoding)?
            .to_string();
        lines.push(HeaderLine { text, start: pos });
        pos = next;
    }
    Ok((lines, len))
}

/// Analyze a raw request into headers, body offset, and parameters.
///
/// Parameters are reported in a fixed order: request-line query
/// parameters, cookie parameters in header order, then body-derived
/// parameters.
pub fn analyze_request(raw: &[u8]) -> MessageResult<RequestInfo> {
    if raw.is_empty() {
        return Err(MessageError::MalformedRequest {
            reason: "empty message".to_string(),
        });
    }
    let (lines, body_offset) = split_head(raw)?;
    let request_line = lines.first().ok_or_else(|| MessageError::MalformedRequest {
        reason: "missing request line".to_string(),
    })?;
    if request_line.text.split(' ').filter(|t| !t.is_empty()).count() < 2 {
        return Err(MessageError::MalformedRequest {
            reason: format!("unparseable request line: {}", request_line.text),
        });
    }

    let mut parameters = Vec::new();
    scan_query(request_line, &mut parameters);
    for line in lines.iter().skip(1) {
        scan_cookies(line, &mut parameters);
    }
    scan_body(raw, &lines, body_offset, &mut parameters);

    debug!(
        headers = lines.len(),
        parameters = parameters.len(),
        "analyzed request"
    );
    Ok(RequestInfo {
        headers: lines.into_iter().map(|l| l.text).collect(),
        body_offset,
        parameters,
    })
}

/// Query parameters from the request-line target
fn scan_query(line: &HeaderLine, out: &mut Vec<Parameter>) {
    let text = &line.text;
    let Some(method_end) = text.find(' ') else {
        return;
    };
    let target_start = method_end + 1;
    let target_end = match text.rfind(" HTTP/") {
        Some(i) if i >= target_start => i,
        _ => text.len(),
    };
    let target = &text[target_start..target_end];
    let Some(q) = target.find('?') else {
        return;
    };
    let query_start = target_start + q + 1;
    scan_pairs(
        &text[query_start..target_end],
        line.start + query_start,
        ParamKind::Url,
        out,
    );
}

/// `name=value` pairs separated by `&`, used for query strings and
/// urlencoded bodies. Empty segments are skipped; a segment without
/// `=` is a parameter with an empty value.
fn scan_pairs(text: &str, base: usize, kind: ParamKind, out: &mut Vec<Parameter>) {
    let mut offset = 0usize;
    for seg in text.split('&') {
        if !seg.is_empty() {
            let (name, value) = seg.split_once('=').unwrap_or((seg, ""));
            out.push(Parameter {
                kind,
                name: name.to_string(),
                value: value.to_string(),
                span: Span::new(base + offset, base + offset + seg.len()),
            });
        }
        offset += seg.len() + 1;
    }
}

/// Parameters inside a `Cookie` header line
fn scan_cookies(line: &HeaderLine, out: &mut Vec<Parameter>) {
    let Some((header, _)) = line.text.split_once(':') else {
        return;
    };
    if !header.eq_ignore_ascii_case("cookie") {
        return;
    }
    let value_start = header.len() + 1;
    let text = &line.text[value_start..];
    let mut offset = 0usize;
    for piece in text.split(';') {
        let trimmed = piece.trim_start_matches(' ');
        let lead = piece.len() - trimmed.len();
        if !trimmed.is_empty() {
            let (name, value) = trimmed.split_once('=').unwrap_or((trimmed, ""));
            let abs = line.start + value_start + offset + lead;
            out.push(Parameter {
                kind: ParamKind::Cookie,
                name: name.to_string(),
                value: value.to_string(),
                span: Span::new(abs, abs + trimmed.len()),
            });
        }
        offset += piece.len() + 1;
    }
}

/// Body parameters, dispatched on the `Content-Type` header
fn scan_body(raw: &[u8], lines: &[HeaderLine], body_offset: usize, out: &mut Vec<Parameter>) {
    if body_offset >= raw.len() {
        return;
    }
    let body = &raw[body_offset..];
    let content_type = lines
        .iter()
        .skip(1)
        .find_map(|l| {
            let (header, value) = l.text.split_once(':')?;
            if header.eq_ignore_ascii_case("content-type") {
                Some(value.trim_start().to_string())
            } else {
                None
            }
        })
        .unwrap_or_default();
    let ct = content_type.to_ascii_lowercase();

    if ct.starts_with("application/x-www-form-urlencoded") {
        if let Ok(text) = std::str::from_utf8(body) {
            let trimmed = text.trim_end_matches(['\r', '\n']);
            scan_pairs(trimmed, body_offset, ParamKind::Body, out);
        }
    } else if ct.contains("multipart/form-data") {
        scan_multipart(body, body_offset, &content_type, out);
    } else if ct.contains("json") || (ct.is_empty() && looks_like(body, &[b'{', b'['])) {
        scan_json(body, body_offset, out);
    } else if ct.contains("xml") || (ct.is_empty() && looks_like(body, &[b'<'])) {
        scan_xml(body, body_offset, out);
    }
}

fn looks_like(body: &[u8], starters: &[u8]) -> bool {
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |b| starters.contains(b))
}

// ---------------------------------------------------------------------
// JSON scanning
// ---------------------------------------------------------------------

/// Object keys at any nesting depth. The body is validated with
/// serde_json first; the span scanner then assumes well-formed input
/// and simply stops on anything unexpected.
fn scan_json(body: &[u8], base: usize, out: &mut Vec<Parameter>) {
    if serde_json::from_slice::<serde_json::Value>(body).is_err() {
        debug!("body is not valid JSON, skipping JSON parameter scan");
        return;
    }
    let pos = skip_ws(body, 0);
    let _ = json_value(body, pos, base, out);
}

fn skip_ws(b: &[u8], mut pos: usize) -> usize {
    while pos < b.len() && b[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Consume one JSON value, returning the position just past it
fn json_value(b: &[u8], pos: usize, base: usize, out: &mut Vec<Parameter>) -> Option<usize> {
    match *b.get(pos)? {
        b'{' => json_object(b, pos, base, out),
        b'[' => json_array(b, pos, base, out),
        b'"' => json_string(b, pos).map(|(end, _)| end),
        _ => {
            let mut i = pos;
            while i < b.len() && !matches!(b[i], b',' | b'}' | b']') && !b[i].is_ascii_whitespace()
            {
                i += 1;
            }
            if i == pos {
                None
            } else {
                Some(i)
            }
        }
    }
}

/// Raw string token: returns the position past the closing quote and
/// the inner text with escapes kept verbatim
fn json_string(b: &[u8], pos: usize) -> Option<(usize, String)> {
    if b.get(pos) != Some(&b'"') {
        return None;
    }
    let mut i = pos + 1;
    let mut inner = Vec::new();
    while i < b.len() {
        match b[i] {
            b'\\' => {
                inner.push(b[i]);
                if let Some(&next) = b.get(i + 1) {
                    inner.push(next);
                }
                i += 2;
            }
            b'"' => {
                return Some((i + 1, String::from_utf8_lossy(&inner).into_owned()));
            }
            c => {
                inner.push(c);
                i += 1;
            }
        }
    }
    None
}

fn json_object(b: &[u8], pos: usize, base: usize, out: &mut Vec<Parameter>) -> Option<usize> {
    let mut i = skip_ws(b, pos + 1);
    loop {
        match *b.get(i)? {
            b'}' => return Some(i + 1),
            b'"' => {
                let key_start = i;
                let (after_key, name) = json_string(b, i)?;
                let mut j = skip_ws(b, after_key);
                if *b.get(j)? != b':' {
                    return None;
                }
                j = skip_ws(b, j + 1);
                let value_start = j;
                let value_end = json_value(b, j, base, out)?;
                let raw_value = String::from_utf8_lossy(&b[value_start..value_end]).into_owned();
                let value = if raw_value.len() >= 2
                    && raw_value.starts_with('"')
                    && raw_value.ends_with('"')
                {
                    raw_value[1..raw_value.len() - 1].to_string()
                } else {
                    raw_value
                };
                out.push(Parameter {
                    kind: ParamKind::Json,
                    name,
                    value,
                    span: Span::new(base + key_start, base + value_end),
                });
                i = skip_ws(b, value_end);
                match *b.get(i)? {
                    b',' => i = skip_ws(b, i + 1),
                    b'}' => return Some(i + 1),
                    _ => return None,
                }
            }
            _ => return None,
        }
    }
}

fn json_array(b: &[u8], pos: usize, base: usize, out: &mut Vec<Parameter>) -> Option<usize> {
    let mut i = skip_ws(b, pos + 1);
    if b.get(i)? == &b']' {
        return Some(i + 1);
    }
    loop {
        i = json_value(b, i, base, out)?;
        i = skip_ws(b, i);
        match *b.get(i)? {
            b',' => i = skip_ws(b, i + 1),
            b']' => return Some(i + 1),
            _ => return None,
        }
    }
}

// ---------------------------------------------------------------------
// XML scanning
// ---------------------------------------------------------------------

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.')
}

/// Leaf elements (`<name>value</name>`) and tag attributes.
/// Declarations, comments, and closing tags are skipped.
fn scan_xml(body: &[u8], base: usize, out: &mut Vec<Parameter>) {
    let Ok(text) = std::str::from_utf8(body) else {
        return;
    };
    let bytes = text.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if matches!(bytes.get(i + 1), Some(&b'/') | Some(&b'!') | Some(&b'?')) {
            i = match bytes[i..].iter().position(|&b| b == b'>') {
                Some(p) => i + p + 1,
                None => bytes.len(),
            };
            continue;
        }
        let tag_start = i;
        let name_start = i + 1;
        let mut j = name_start;
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        if j == name_start {
            i += 1;
            continue;
        }
        let tag_name = &text[name_start..j];

        // find the tag close, honoring quoted attribute values
        let mut k = j;
        let mut quote: Option<u8> = None;
        while k < bytes.len() {
            let c = bytes[k];
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
            } else if c == b'"' || c == b'\'' {
                quote = Some(c);
            } else if c == b'>' {
                break;
            }
            k += 1;
        }
        if k >= bytes.len() {
            break;
        }
        let tag_close = k;
        let self_closing = bytes[tag_close - 1] == b'/';

        scan_xml_attrs(text, j, tag_close, base, out);

        if !self_closing {
            let content_start = tag_close + 1;
            if let Some(rel) = text[content_start..].find('<') {
                let next_lt = content_start + rel;
                let closing = format!("</{}>", tag_name);
                if text[next_lt..].starts_with(&closing) {
                    out.push(Parameter {
                        kind: ParamKind::Xml,
                        name: tag_name.to_string(),
                        value: text[content_start..next_lt].to_string(),
                        span: Span::new(base + tag_start, base + next_lt + closing.len()),
                    });
                    i = next_lt + closing.len();
                    continue;
                }
            }
        }
        i = tag_close + 1;
    }
}

/// `name="value"` attributes between a tag name and its closing `>`
fn scan_xml_attrs(text: &str, from: usize, to: usize, base: usize, out: &mut Vec<Parameter>) {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < to {
        if !is_name_byte(bytes[i]) {
            i += 1;
            continue;
        }
        let name_start = i;
        while i < to && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name_end = i;
        let mut j = i;
        while j < to && bytes[j] == b' ' {
            j += 1;
        }
        if j >= to || bytes[j] != b'=' {
            continue;
        }
        j += 1;
        while j < to && bytes[j] == b' ' {
            j += 1;
        }
        if j >= to || !(bytes[j] == b'"' || bytes[j] == b'\'') {
            i = j;
            continue;
        }
        let quote = bytes[j] as char;
        let value_start = j + 1;
        let Some(rel) = text[value_start..to].find(quote) else {
            break;
        };
        let value_end = value_start + rel;
        out.push(Parameter {
            kind: ParamKind::XmlAttr,
            name: text[name_start..name_end].to_string(),
            value: text[value_start..value_end].to_string(),
            span: Span::new(base + name_start, base + value_end + 1),
        });
        i = value_end + 1;
    }
}

// ---------------------------------------------------------------------
// Multipart scanning
// ---------------------------------------------------------------------

/// One parameter per multipart part. The span covers the whole part
/// including its leading boundary line, so excising it leaves the
/// surrounding structure intact.
fn scan_multipart(body: &[u8], base: usize, content_type: &str, out: &mut Vec<Parameter>) {
    let Some(boundary) = extract_boundary(content_type) else {
        return;
    };
    let Ok(text) = std::str::from_utf8(body) else {
        return;
    };
    let delim = format!("--{}", boundary);
    let final_delim = format!("{}--", delim);

    let mut marks: Vec<usize> = Vec::new();
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == delim || trimmed == final_delim {
            marks.push(offset);
        }
        offset += line.len();
    }

    for w in marks.windows(2) {
        let part_mark = w[0];
        let part_end = w[1];
        let Some(rel) = text[part_mark..part_end].find('\n') else {
            continue;
        };
        let part_start = part_mark + rel + 1;
        let part = &text[part_start..part_end];
        let (head, payload_rel) = match part.find("\r\n\r\n") {
            Some(i) => (&part[..i], i + 4),
            None => match part.find("\n\n") {
                Some(i) => (&part[..i], i + 2),
                None => (part, part.len()),
            },
        };
        let name = head.lines().find_map(|l| {
            let (header, value) = l.split_once(':')?;
            if header.eq_ignore_ascii_case("content-disposition") {
                extract_disposition_name(value)
            } else {
                None
            }
        });
        let Some(name) = name else {
            continue;
        };
        let payload = part[payload_rel..].trim_end_matches(['\r', '\n']);
        out.push(Parameter {
            kind: ParamKind::MultipartAttr,
            name,
            value: payload.to_string(),
            span: Span::new(base + part_mark, base + part_end),
        });
    }
}

fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|p| {
        let v = p.trim().strip_prefix("boundary=")?;
        Some(v.trim_matches('"').to_string())
    })
}

fn extract_disposition_name(value: &str) -> Option<String> {
    value.split(';').find_map(|p| {
        let v = p.trim().strip_prefix("name=")?;
        Some(v.trim_matches('"').to_string())
    })
}
