pub mod claude;
pub mod doubao;
pub mod openai;
pub mod scholarai;
pub mod vertex_claude;

use bytes::Bytes;
use grelay_provider_core::{RelayError, RelayResult, UpstreamBody};
use serde::Serialize;
use serde::de::DeserializeOwned;

fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn encode_json<T: Serialize>(value: &T) -> RelayResult<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| RelayError::invalid_request("marshal_request_body_failed", err.to_string()))
}

fn decode_json<T: DeserializeOwned>(body: &[u8]) -> RelayResult<T> {
    serde_json::from_slice(body)
        .map_err(|err| RelayError::decode("unmarshal_response_body_failed", err.to_string()))
}

fn expect_stream(body: UpstreamBody) -> grelay_provider_core::ByteStream {
    match body {
        UpstreamBody::Stream(rx) => rx,
        UpstreamBody::Bytes(bytes) => {
            // A buffered body still goes through the same framing path.
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            if !bytes.is_empty() {
                let _ = tx.try_send(bytes);
            }
            rx
        }
    }
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
