use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::server::error::Error;

// request scoped types for a single playback, nothing here outlives the response.
// `PlaybackRequest` is what the client asked for, `UpstreamTarget` is where the provider has it

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
    Live,
    Segment,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Live => "live",
            Self::Segment => "segment",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            "live" => Ok(Self::Live),
            "segment" => Ok(Self::Segment),
            _ => Err(Error::BadRequest("Unknown content kind".to_string())),
        }
    }
}

/// container extensions the provider serves, anything else gets coerced to mp4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Mkv,
    Avi,
    M3u8,
    Ts,
}

impl Container {
    pub const ALL: [Container; 5] = [Self::Mp4, Self::Mkv, Self::Avi, Self::M3u8, Self::Ts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
            Self::M3u8 => "m3u8",
            Self::Ts => "ts",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub kind: ContentKind,
    // raw and unsanitized, for segments this is the absolute url
    pub id: String,
    pub extension: Option<String>,
    pub range: Option<String>,
}

impl PlaybackRequest {
    pub fn new(kind: ContentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            extension: None,
            range: None,
        }
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_range(mut self, range: Option<String>) -> Self {
        self.range = range;
        self
    }
}

/// resolved provider location. `url` carries credentials and must never be echoed back except by
/// the live redirect mode
#[derive(Clone)]
pub struct UpstreamTarget {
    pub kind: ContentKind,
    pub url: Url,
    // none when a raw segment has no recognisable suffix
    pub container: Option<Container>,
}

impl fmt::Debug for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamTarget")
            .field("kind", &self.kind)
            .field("host", &self.url.host_str())
            .field("container", &self.container)
            .finish()
    }
}
