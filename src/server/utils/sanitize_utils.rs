use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::server::models::Container;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,50}$").expect("id pattern should compile"));

/// ids end up as a path segment on the provider, so only the boring characters get through
pub fn sanitize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    ID_PATTERN.is_match(trimmed).then(|| trimmed.to_string())
}

/// always returns something the provider understands
pub fn sanitize_extension(raw: Option<&str>) -> Container {
    raw.map(|ext| ext.trim().trim_start_matches('.'))
        .and_then(Container::from_extension)
        .unwrap_or_default()
}

/// segment urls come from a playlist the client already has, they have to be absolute
pub fn parse_segment_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url),
        _ => None,
    }
}
