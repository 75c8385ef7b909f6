use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt, future::Future, stream::BoxStream};
use metrics::counter;
use mockall::automock;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::{debug, info, warn};
use url::Url;

use crate::server::{
    error::{AppResult, Error},
    models::{ContentKind, UpstreamTarget},
    utils::header_utils::forward_headers,
};

/// some providers only answer to things that look like a media player
pub const PLAYER_USER_AGENT: &str = "VLC/3.0.20 LibVLC/3.0.20";

pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

pub type DynUpstreamFetcher = Arc<dyn UpstreamFetcher + Send + Sync>;

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub range: Option<String>,
}

pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

/// one GET against the provider. implementations must give up as soon as `cancel` fires
#[automock]
#[async_trait]
pub trait UpstreamFetcher {
    async fn fetch(
        &self,
        request: UpstreamRequest,
        cancel: CancellationToken,
    ) -> AppResult<UpstreamResponse>;
}

pub struct ReqwestFetcher {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// `timeout` bounds connecting, waiting on headers and every gap between body chunks. A
    /// multi gigabyte movie can take as long as it wants as long as bytes keep coming
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(PLAYER_USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::InternalServerErrorWithContext(format!("failed to build http client: {}", e))
            })?;

        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl UpstreamFetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        request: UpstreamRequest,
        cancel: CancellationToken,
    ) -> AppResult<UpstreamResponse> {
        let mut request_builder = self.http.get(request.url).header(header::ACCEPT, "*/*");

        if let Some(range) = request.range.as_deref() {
            request_builder = request_builder.header(header::RANGE, range);
        }

        // errors go through without_url, the url has the provider credentials in its path
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::ClientAborted),
            sent = tokio::time::timeout(self.timeout, request_builder.send()) => match sent {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(Error::UpstreamUnreachable(e.without_url().to_string())),
                Err(_) => {
                    return Err(Error::UpstreamUnreachable(format!(
                        "no response headers within {}s",
                        self.timeout.as_secs()
                    )));
                }
            },
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::other(e.without_url()))
            .boxed();

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// terminal states of a relay once headers went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Streaming,
    Completed,
    ClientAborted,
    UpstreamErrored,
}

impl RelayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::ClientAborted => "client_aborted",
            Self::UpstreamErrored => "upstream_errored",
        }
    }
}

/// response body that owns the upstream stream
///
/// The upstream stream is dropped exactly once, whichever comes first of: it ends, it errors, the
/// request token is cancelled, or hyper drops this body because the client hung up. Dropping it is
/// what hands the provider connection back, so nothing else may hold on to it.
pub struct RelayBody {
    kind: ContentKind,
    upstream: Option<ByteStream>,
    cancel: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    state: RelayState,
    bytes_sent: u64,
}

impl RelayBody {
    pub fn new(kind: ContentKind, upstream: ByteStream, cancel: CancellationToken) -> Self {
        let cancelled = Box::pin(cancel.clone().cancelled_owned());

        Self {
            kind,
            upstream: Some(upstream),
            cancel,
            cancelled,
            state: RelayState::Streaming,
            bytes_sent: 0,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn finish(&mut self, state: RelayState) {
        if self.upstream.take().is_none() {
            return;
        }

        self.state = state;
        self.cancel.cancel();

        match state {
            RelayState::Completed => debug!(
                "Relay of {} completed after {} bytes",
                self.kind, self.bytes_sent
            ),
            RelayState::ClientAborted => info!(
                "Relay of {} stopped after {} bytes, client went away",
                self.kind, self.bytes_sent
            ),
            RelayState::UpstreamErrored => warn!(
                "Relay of {} broke after {} bytes, upstream stream failed",
                self.kind, self.bytes_sent
            ),
            RelayState::Streaming => {}
        }

        counter!(
            "relay_outcomes_total",
            "kind" => self.kind.as_str(),
            "outcome" => state.as_str()
        )
        .increment(1);
    }
}

impl Stream for RelayBody {
    type Item = Result<Bytes, io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.upstream.is_none() {
            return Poll::Ready(None);
        }

        // polled first so a cancel wakes us even while upstream is stalled
        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.finish(RelayState::ClientAborted);
            return Poll::Ready(None);
        }

        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes_sent += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            // the status line is already out, handing hyper an error makes it reset the connection
            Poll::Ready(Some(Err(e))) => {
                this.finish(RelayState::UpstreamErrored);
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish(RelayState::Completed);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayBody {
    fn drop(&mut self) {
        self.finish(RelayState::ClientAborted);
    }
}

/// fetches a located target and turns the provider response into ours
pub struct StreamRelay {
    fetcher: DynUpstreamFetcher,
    // parent of every request token, cancelled on shutdown so live relays don't hold it up
    shutdown: CancellationToken,
}

impl StreamRelay {
    pub fn new(fetcher: DynUpstreamFetcher, shutdown: CancellationToken) -> Self {
        Self { fetcher, shutdown }
    }

    pub async fn relay(&self, target: &UpstreamTarget, range: Option<String>) -> AppResult<Response> {
        counter!("relay_requests_total", "kind" => target.kind.as_str()).increment(1);

        let cancel = self.shutdown.child_token();
        // if the client leaves while we wait on headers this future is dropped and so is the guard
        let guard = cancel.clone().drop_guard();

        debug!("Relaying {:?} (range: {:?})", target, range);

        let request = UpstreamRequest {
            url: target.url.clone(),
            range,
        };

        let UpstreamResponse {
            status,
            headers,
            body,
        } = self
            .fetcher
            .fetch(request, cancel)
            .await
            .inspect_err(|e| {
                if !matches!(e, Error::ClientAborted) {
                    counter!("relay_upstream_failures_total", "kind" => target.kind.as_str())
                        .increment(1);
                }
            })?;

        // ambiguous upstream failures become our generic 500, the body is dropped here which
        // closes the upstream connection
        if status.is_server_error() {
            counter!("relay_upstream_failures_total", "kind" => target.kind.as_str()).increment(1);
            return Err(Error::UpstreamServerError(status));
        }

        if !status.is_success() {
            info!("Forwarding upstream {} for {}", status, target.kind);
        }

        let headers = forward_headers(&headers, target.container);
        let body = RelayBody::new(target.kind, body, guard.disarm());

        let mut response = Response::new(Body::from_stream(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        Ok(response)
    }
}
