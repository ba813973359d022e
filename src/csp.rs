//! Content-Security-Policy header synthesis.
//!
//! The header is treated as structure, not text: the existing value is
//! parsed into `;`-delimited directive segments, the target directive's
//! token list is extended with any tokens not already present, and the
//! whole thing is re-serialized. Repeated application with the same assets
//! is a no-op, and directives this module does not own round-trip intact.

use crate::assets::Asset;
use crate::headers::ResponseHeaders;
use std::sync::Arc;

/// Header name the synthesizer owns.
pub const CSP_HEADER: &str = "Content-Security-Policy";

/// Merge `'sha256-…'` tokens for `assets` into the `directive` segment of
/// the response's CSP header. With no assets there is nothing to allow and
/// the header is left untouched.
pub fn apply(headers: &mut dyn ResponseHeaders, directive: &str, assets: &[Arc<Asset>]) {
    if assets.is_empty() {
        return;
    }
    let tokens: Vec<String> = assets.iter().map(|asset| asset.csp_token()).collect();
    let existing = headers.get(CSP_HEADER).unwrap_or("");
    let merged = merge(existing, directive, &tokens);
    headers.set(CSP_HEADER, merged);
}

fn merge(existing: &str, directive: &str, tokens: &[String]) -> String {
    // embedded newlines would fool any boundary search; fold them first
    let normalized = existing.replace(['\n', '\r'], " ");
    let mut segments = parse_segments(&normalized);
    match segments
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case(directive))
    {
        Some((_, values)) => {
            for token in tokens {
                if !values.iter().any(|value| value == token) {
                    values.push(token.clone());
                }
            }
        }
        None => segments.push((directive.to_string(), tokens.to_vec())),
    }
    serialize(&segments)
}

fn parse_segments(value: &str) -> Vec<(String, Vec<String>)> {
    value
        .split(';')
        .filter_map(|segment| {
            let mut parts = segment.split_whitespace();
            let name = parts.next()?;
            Some((name.to_string(), parts.map(str::to_string).collect()))
        })
        .collect()
}

fn serialize(segments: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (i, (name, values)) in segments.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push_str(name);
        for value in values {
            out.push(' ');
            out.push_str(value);
        }
    }
    out
}
