//! Request reconstruction: building from parts and excising parameters

use crate::analyzer::split_head;
use crate::error::{MessageError, MessageResult};
use crate::types::{ParamKind, Parameter};
use tracing::debug;

/// Build a raw request from header lines and body bytes.
///
/// Headers are joined with CRLF and separated from the body by one
/// blank line. Body bytes are appended verbatim.
pub fn build_request(headers: &[String], body: &[u8]) -> Vec<u8> {
    let head_len: usize = headers.iter().map(|h| h.len() + 2).sum();
    let mut out = Vec::with_capacity(head_len + 2 + body.len());
    for header in headers {
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

/// Remove one parameter occurrence from a raw request.
///
/// The parameter's span must have been reported against these exact
/// bytes; anything else is rejected as stale. The excision takes the
/// kind-appropriate separator with it, and for body-resident kinds the
/// `Content-Length` header is rewritten to match.
pub fn remove_parameter(raw: &[u8], param: &Parameter) -> MessageResult<Vec<u8>> {
    let stale = || MessageError::StaleSpan {
        start: param.span.start,
        end: param.span.end,
        len: raw.len(),
    };
    let covered = param.span.slice(raw).ok_or_else(stale)?;
    if !param.name.is_empty() && !contains(covered, param.name.as_bytes()) {
        return Err(stale());
    }

    let (start, end) = excision_range(raw, param);
    debug!(
        kind = param.kind.label(),
        name = %param.name,
        start,
        end,
        "removing parameter"
    );

    let mut out = Vec::with_capacity(raw.len() - (end - start));
    out.extend_from_slice(&raw[..start]);
    out.extend_from_slice(&raw[end..]);

    let body_resident = matches!(
        param.kind,
        ParamKind::Body
            | ParamKind::Json
            | ParamKind::Xml
            | ParamKind::XmlAttr
            | ParamKind::MultipartAttr
    );
    if body_resident {
        return update_content_length(&out);
    }
    Ok(out)
}

/// Extend a parameter span over the separator that must go with it
fn excision_range(raw: &[u8], param: &Parameter) -> (usize, usize) {
    let mut start = param.span.start;
    let mut end = param.span.end;
    match param.kind {
        ParamKind::Url => {
            if raw.get(end) == Some(&b'&') {
                end += 1;
            } else if start > 0 && raw[start - 1] == b'&' {
                start -= 1;
            } else if start > 0 && raw[start - 1] == b'?' {
                start -= 1;
            }
        }
        ParamKind::Body => {
            if raw.get(end) == Some(&b'&') {
                end += 1;
            } else if start > 0 && raw[start - 1] == b'&' {
                start -= 1;
            }
        }
        ParamKind::Cookie => {
            if raw.get(end) == Some(&b';') {
                end += 1;
                if raw.get(end) == Some(&b' ') {
                    end += 1;
                }
            } else if start >= 2 && &raw[start - 2..start] == b"; " {
                start -= 2;
            } else if start >= 1 && raw[start - 1] == b';' {
                start -= 1;
            } else {
                // last cookie standing: drop the whole header line
                start = raw[..start]
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map(|p| p + 1)
                    .unwrap_or(0);
                end = raw[end..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map(|p| end + p + 1)
                    .unwrap_or(raw.len());
            }
        }
        ParamKind::Json => {
            let mut j = end;
            while raw.get(j).map_or(false, |b| b.is_ascii_whitespace()) {
                j += 1;
            }
            if raw.get(j) == Some(&b',') {
                end = j + 1;
            } else {
                let mut i = start;
                while i > 0 && raw[i - 1].is_ascii_whitespace() {
                    i -= 1;
                }
                if i > 0 && raw[i - 1] == b',' {
                    start = i - 1;
                }
            }
        }
        ParamKind::XmlAttr => {
            while start > 0 && raw[start - 1] == b' ' {
                start -= 1;
            }
        }
        ParamKind::Xml | ParamKind::MultipartAttr => {}
    }
    (start, end)
}

/// Rewrite `Content-Length` to the current body length. Messages
/// without that header are returned untouched.
fn update_content_length(raw: &[u8]) -> MessageResult<Vec<u8>> {
    let (lines, body_offset) = split_head(raw)?;
    let body = &raw[body_offset..];
    let mut headers: Vec<String> = lines.into_iter().map(|l| l.text).collect();
    let mut patched = false;
    for line in headers.iter_mut().skip(1) {
        if let Some((name, _)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                *line = format!("{}: {}", name, body.len());
                patched = true;
                break;
            }
        }
    }
    if !patched {
        return Ok(raw.to_vec());
    }
    Ok(build_request(&headers, body))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
