use url::Url;

use crate::item::ContentKind;

/// Byte length above which persisted content is compacted.
pub const COMPACT_THRESHOLD: usize = 2_000;

/// Result of compacting one content field for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactedContent {
    pub content: String,
    pub kind: ContentKind,
}

/// Markup if the trimmed content opens with `<`, otherwise a URL payload.
pub fn infer_content_kind(content: &str) -> ContentKind {
    if content.trim_start().starts_with('<') {
        ContentKind::Html
    } else {
        ContentKind::Url
    }
}

/// Resolve the media URL carried by a result payload.
///
/// The payload is either a bare `http(s)://` URL or markup embedding one; the
/// first `http(s)://` run up to whitespace, a quote or an angle bracket wins,
/// provided it parses as a URL.
pub fn extract_media_url(content: &str) -> Option<String> {
    let content = content.trim();
    let lower = content.to_ascii_lowercase();
    let mut offset = 0;
    while let Some(found) = find_scheme(&lower[offset..]) {
        let start = offset + found;
        let end = content[start..]
            .find(is_url_terminator)
            .map_or(content.len(), |len| start + len);
        let candidate = &content[start..end];
        if is_http_url(candidate) {
            return Some(candidate.to_string());
        }
        offset = start + "http".len();
    }
    None
}

/// Compact `content` for persistence when it exceeds `threshold` bytes:
/// replace it by its media URL if one is embedded, otherwise truncate it to at
/// most `threshold` bytes on a char boundary. Short content is kept as is.
pub fn compact_content(content: &str, kind: ContentKind, threshold: usize) -> CompactedContent {
    if content.len() <= threshold {
        return CompactedContent {
            content: content.to_string(),
            kind,
        };
    }
    if let Some(url) = extract_media_url(content) {
        return CompactedContent {
            content: url,
            kind: ContentKind::Url,
        };
    }
    let mut end = threshold;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    CompactedContent {
        content: content[..end].to_string(),
        kind,
    }
}

fn find_scheme(lower: &str) -> Option<usize> {
    match (lower.find("http://"), lower.find("https://")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn is_url_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>')
}

fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}
