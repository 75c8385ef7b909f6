use tracing::debug;
use url::Url;

use crate::config::ProviderConfig;
use crate::server::{
    error::{AppResult, Error},
    models::{Container, ContentKind, PlaybackRequest, UpstreamTarget},
    utils::sanitize_utils::{parse_segment_url, sanitize_extension, sanitize_id},
};

/// maps (kind, id, extension) to the provider url, no io and no state beyond the provider config
///
/// movie:   {base}/movie/{user}/{pass}/{id}.{ext}
/// series:  {base}/series/{user}/{pass}/{id}.{ext}
/// live:    {live_base}/live/{user}/{pass}/{id}.m3u8
/// segment: the caller's absolute url, validated and passed through
pub struct ResourceLocator {
    provider: ProviderConfig,
}

impl ResourceLocator {
    pub fn new(provider: ProviderConfig) -> Self {
        Self { provider }
    }

    pub fn locate(&self, request: &PlaybackRequest) -> AppResult<UpstreamTarget> {
        if request.kind == ContentKind::Segment {
            let url = parse_segment_url(&request.id)
                .ok_or_else(|| Error::BadRequest("Invalid url parameter".to_string()))?;
            let container = Self::container_from_path(&url);

            return Ok(UpstreamTarget {
                kind: request.kind,
                url,
                container,
            });
        }

        let id = sanitize_id(&request.id)
            .ok_or_else(|| Error::BadRequest("Invalid content id".to_string()))?;

        let (base, container) = match request.kind {
            ContentKind::Live => (&self.provider.live_base_url, Container::M3u8),
            _ => (
                &self.provider.base_url,
                sanitize_extension(request.extension.as_deref()),
            ),
        };

        let url = self.credential_url(base, request.kind, &format!("{}.{}", id, container))?;
        debug!("Located {} {} as .{}", request.kind, id, container);

        Ok(UpstreamTarget {
            kind: request.kind,
            url,
            container: Some(container),
        })
    }

    fn credential_url(&self, base: &Url, kind: ContentKind, file: &str) -> AppResult<Url> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|_| {
                Error::InternalServerErrorWithContext("provider base url cannot be a base".into())
            })?
            .pop_if_empty()
            .push(kind.as_str())
            .push(&self.provider.username)
            .push(&self.provider.password)
            .push(file);

        Ok(url)
    }

    // ".../seg-001.ts?token=x" -> ts, anything unknown stays None so upstream content-type wins
    fn container_from_path(url: &Url) -> Option<Container> {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|file| file.rsplit_once('.'))
            .and_then(|(_, ext)| Container::from_extension(ext))
    }
}
