use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::server::models::Container;

/// the only upstream headers a client ever sees, everything else could leak where the provider
/// lives or who it thinks we are
pub const FORWARDED_HEADERS: [HeaderName; 7] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::ACCEPT_RANGES,
    header::CACHE_CONTROL,
    header::LAST_MODIFIED,
    header::ETAG,
];

pub const FALLBACK_CONTENT_TYPE: &str = "video/mp4";
pub const HLS_CONTENT_TYPE: &str = "application/x-mpegURL";

/// copies the allow-listed headers and applies the content-type overrides
///
/// - m3u8 is always application/x-mpegURL
/// - mkv is relabelled video/mp4 since browsers refuse video/x-matroska inline
/// - a missing content-type becomes video/mp4
/// - a missing accept-ranges becomes bytes, players won't seek without it
pub fn forward_headers(upstream: &HeaderMap, container: Option<Container>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(FORWARDED_HEADERS.len());

    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    match container {
        Some(Container::M3u8) => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(HLS_CONTENT_TYPE),
            );
        }
        Some(Container::Mkv) => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(FALLBACK_CONTENT_TYPE),
            );
        }
        _ => {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
        }
    }

    headers
        .entry(header::ACCEPT_RANGES)
        .or_insert(HeaderValue::from_static("bytes"));

    headers
}

/// inbound range header, only if it is plain ascii we can forward verbatim
pub fn range_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
