use std::fmt;
use std::time::Duration;

use anyhow::{Context, bail};
use url::Url;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

/// how live channels are served
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum LiveMode {
    /// fetch the channel ourselves and pipe it to the client
    Relay,
    /// send the client straight to the provider (credentials end up in the Location header)
    Redirect,
}

impl LiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relay => "relay",
            Self::Redirect => "redirect",
        }
    }
}

#[derive(clap::Parser, Clone)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // base address of the provider, e.g. http://provider.example:80
    #[clap(long, env)]
    pub provider_base_url: String,

    #[clap(long, env)]
    pub provider_username: String,

    #[clap(long, env)]
    pub provider_password: String,

    // some providers serve live channels from another port (usually :8080), leave unset to use
    // the base url for everything
    #[clap(long, env)]
    pub provider_live_base_url: Option<String>,

    // relay keeps credentials server side, redirect avoids holding a connection open for the
    // whole lifetime of a live channel
    #[clap(long, env, value_enum, default_value = "relay")]
    pub live_mode: LiveMode,

    // bounds connect and idle time against the provider, not the whole transfer
    #[clap(long, env, default_value = "30")]
    pub upstream_timeout_secs: u64,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            provider_base_url: "http://localhost:8000".to_string(),
            provider_username: "username".to_string(),
            provider_password: "password".to_string(),
            provider_live_base_url: None,
            live_mode: LiveMode::Relay,
            upstream_timeout_secs: 30,
            cors_origin: "*".to_string(),
            sentry_dsn: None,
        }
    }
}

impl AppConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// validates the provider half of the config, nothing can be relayed until this passes
    pub fn provider(&self) -> anyhow::Result<ProviderConfig> {
        let base_url = parse_base_url(&self.provider_base_url).context("PROVIDER_BASE_URL")?;

        let live_base_url = match self.provider_live_base_url.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                parse_base_url(raw).context("PROVIDER_LIVE_BASE_URL")?
            }
            _ => base_url.clone(),
        };

        if self.provider_username.trim().is_empty() {
            bail!("PROVIDER_USERNAME must not be empty");
        }
        if self.provider_password.trim().is_empty() {
            bail!("PROVIDER_PASSWORD must not be empty");
        }

        Ok(ProviderConfig {
            base_url,
            live_base_url,
            // stored as given, the provider compares them byte for byte
            username: self.provider_username.clone(),
            password: self.provider_password.clone(),
        })
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).context("not a well-formed absolute url")?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("expected an http(s) url with a host, got {}", url.scheme());
    }

    Ok(url)
}

/// provider address and credentials, handed to the locator at construction
#[derive(Clone)]
pub struct ProviderConfig {
    pub base_url: Url,
    pub live_base_url: Url,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url.as_str())
            .field("live_base_url", &self.live_base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
