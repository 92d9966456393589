use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use grelay_provider_core::{
    Headers, HttpMethod, RelayError, RelayResult, UpstreamBody, UpstreamClient,
    UpstreamHttpRequest, UpstreamHttpResponse,
};
use tracing::warn;
use wreq::Method;

use crate::http_client::{ClientKind, HttpClientPool};

/// `UpstreamClient` backed by pooled `wreq` clients.
#[derive(Debug, Clone)]
pub struct WreqUpstreamClient {
    pool: Arc<HttpClientPool>,
    stream_idle_timeout: Duration,
}

impl WreqUpstreamClient {
    pub fn new(pool: Arc<HttpClientPool>, stream_idle_timeout: Duration) -> Self {
        Self {
            pool,
            stream_idle_timeout,
        }
    }
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = RelayResult<UpstreamHttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            let client = self.pool.client(ClientKind::Relay, req.proxy.as_deref())?;
            let method = match req.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
            };
            let mut builder = client.request(method, &req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let resp = builder.send().await.map_err(map_wreq_error)?;
            convert_response(resp, req.is_stream, self.stream_idle_timeout).await
        })
    }
}

async fn convert_response(
    resp: wreq::Response,
    want_stream: bool,
    stream_idle_timeout: Duration,
) -> RelayResult<UpstreamHttpResponse> {
    let status = resp.status().as_u16();
    let headers = headers_from_wreq(resp.headers());

    let is_success = (200..300).contains(&status);
    if !is_success || !want_stream {
        let body = resp.bytes().await.map_err(|err| {
            RelayError::transport("read_response_body_failed", err.to_string())
        })?;
        return Ok(UpstreamHttpResponse {
            status,
            headers,
            body: UpstreamBody::Bytes(body),
        });
    }

    // The pump ends on upstream EOF, an idle gap, a read error, or when the
    // consumer drops the receiver. Any of these closes the stream downstream.
    let (tx, rx) = tokio::sync::mpsc::channel::<Bytes>(16);
    tokio::spawn(async move {
        let mut stream = resp.bytes_stream();
        loop {
            let item = match tokio::time::timeout(stream_idle_timeout, stream.next()).await {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        event = "upstream_stream_idle",
                        idle_secs = stream_idle_timeout.as_secs(),
                    );
                    break;
                }
            };
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(event = "upstream_stream_read_failed", error = %err);
                    break;
                }
            };
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
    });

    Ok(UpstreamHttpResponse {
        status,
        headers,
        body: UpstreamBody::Stream(rx),
    })
}

fn headers_from_wreq(map: &wreq::header::HeaderMap) -> Headers {
    map.iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn map_wreq_error(err: wreq::Error) -> RelayError {
    let code = if err.is_timeout() {
        "upstream_timeout"
    } else if err.is_connect() {
        "upstream_connect_failed"
    } else {
        "do_request_failed"
    };
    RelayError::transport(code, err.to_string())
}
