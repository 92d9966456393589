use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use grelay_common::RelayConfig;
use grelay_protocol::openai::{ChatCompletionRequest, ChatMessage, StreamOptions};
use grelay_provider_core::{
    AccessToken, ChannelRegistry, CredentialCache, RelayError, RelayMeta, RelayResult,
    TokenExchanger, UpstreamBody, UpstreamClient, UpstreamHttpRequest, UpstreamHttpResponse,
    channel_type, header_get,
};
use grelay_provider_impl::{HttpClientPool, Relay, builtin_adaptors};
use time::OffsetDateTime;
use tokio::sync::mpsc;

enum Canned {
    Body(u16, &'static str),
    Stream(Vec<&'static str>),
}

struct CannedClient {
    reply: Canned,
    seen: Mutex<Vec<UpstreamHttpRequest>>,
}

impl CannedClient {
    fn new(reply: Canned) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<UpstreamHttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl UpstreamClient for CannedClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = RelayResult<UpstreamHttpResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(req);
            let (status, body) = match &self.reply {
                Canned::Body(status, body) => (*status, UpstreamBody::Bytes(Bytes::from(*body))),
                Canned::Stream(parts) => {
                    let (tx, rx) = mpsc::channel(parts.len().max(1));
                    for part in parts {
                        tx.try_send(Bytes::from(*part)).unwrap();
                    }
                    (200, UpstreamBody::Stream(rx))
                }
            };
            Ok(UpstreamHttpResponse {
                status,
                headers: Vec::new(),
                body,
            })
        })
    }
}

struct NoExchange;

#[async_trait]
impl TokenExchanger for NoExchange {
    async fn exchange(&self, _credential: &str, _proxy: Option<&str>) -> RelayResult<AccessToken> {
        Err(RelayError::credential("credential_exchange_failed", "offline"))
    }
}

const SERVICE_ACCOUNT: &str = r#"{"client_email":"svc@proj.iam.gserviceaccount.com"}"#;

async fn relay_with(client: Arc<CannedClient>) -> Relay {
    let config = RelayConfig::default();
    let pool = Arc::new(HttpClientPool::from_config(&config));
    let credentials = Arc::new(CredentialCache::new(
        Arc::new(NoExchange),
        Duration::from_secs(600),
        Duration::from_secs(1),
    ));
    credentials
        .insert(
            SERVICE_ACCOUNT,
            AccessToken {
                token: "ya29.cached".to_string(),
                expires_at: OffsetDateTime::now_utc() + time::Duration::hours(1),
            },
        )
        .await;
    Relay::new(
        Arc::new(ChannelRegistry::with_builtin()),
        builtin_adaptors(pool, credentials, "europe-west1"),
        client,
    )
}

fn meta(channel: i32, api_key: &str) -> RelayMeta {
    RelayMeta {
        channel_type: channel,
        api_key: api_key.to_string(),
        request_path: "/v1/chat/completions".to_string(),
        ..Default::default()
    }
}

fn chat(model: &str, stream: bool) -> ChatCompletionRequest {
    let mut request = ChatCompletionRequest::new(model, vec![ChatMessage::text("user", "hi")]);
    request.stream = stream;
    request
}

async fn drain(mut rx: mpsc::Receiver<Bytes>) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(bytes) = rx.recv().await {
        out.push(String::from_utf8(bytes.to_vec()).unwrap());
    }
    out
}

#[tokio::test]
async fn openai_reply_is_passed_through() {
    let client = CannedClient::new(Canned::Body(
        200,
        r#"{"id":"c1","object":"chat.completion","created":1,"model":"gpt-4o",
            "choices":[{"index":0,"message":{"role":"assistant","content":"yo"},"finish_reason":"stop"}],
            "usage":{"prompt_tokens":9,"completion_tokens":1,"total_tokens":10}}"#,
    ));
    let relay = relay_with(client.clone()).await;
    let (tx, rx) = mpsc::channel(8);

    let usage = relay
        .relay(meta(channel_type::OPENAI, "sk-test"), Some(&chat("gpt-4o", false)), &tx)
        .await
        .unwrap();
    drop(tx);

    assert_eq!((usage.prompt_tokens, usage.completion_tokens, usage.total_tokens), (9, 1, 10));
    let out = drain(rx).await;
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("\"yo\""));

    let sent = client.requests();
    assert_eq!(sent[0].url, "https://api.openai.com/v1/chat/completions");
    assert_eq!(header_get(&sent[0].headers, "Authorization"), Some("Bearer sk-test"));
}

#[tokio::test]
async fn claude_stream_is_translated_with_usage_tail() {
    let client = CannedClient::new(Canned::Stream(vec![
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"model\":\"claude-3-haiku-20240307\",\"usage\":{\"input_tokens\":12,\"output_tokens\":0}}}\n\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\ndata: {\"type\":\"content_block_delta\",\"index\":0,",
        "\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n\n",
        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":2}}\n\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    ]));
    let relay = relay_with(client).await;
    let (tx, rx) = mpsc::channel(32);
    let mut request = chat("claude-3-haiku-20240307", true);
    request.stream_options = Some(StreamOptions {
        include_usage: true,
    });

    let usage = relay
        .relay(meta(channel_type::ANTHROPIC, "sk-ant"), Some(&request), &tx)
        .await
        .unwrap();
    drop(tx);

    assert_eq!((usage.prompt_tokens, usage.completion_tokens), (12, 2));
    let out = drain(rx).await;
    assert_eq!(out.last().map(String::as_str), Some("data: [DONE]\n\n"));
    let text: String = out
        .iter()
        .filter_map(|record| record.strip_prefix("data: "))
        .filter_map(|payload| serde_json::from_str::<serde_json::Value>(payload.trim()).ok())
        .filter_map(|chunk| chunk["choices"][0]["delta"]["content"].as_str().map(str::to_string))
        .collect();
    assert_eq!(text, "Hello");

    let tail: serde_json::Value =
        serde_json::from_str(out[out.len() - 2].trim_start_matches("data: ").trim()).unwrap();
    assert_eq!(tail["usage"]["total_tokens"], 14);
    assert_eq!(tail["id"], "msg_1");
    assert!(tail["choices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_keeps_status_and_body() {
    let client = CannedClient::new(Canned::Body(
        429,
        r#"{"error":{"message":"slow down","type":"rate_limit"}}"#,
    ));
    let relay = relay_with(client).await;
    let (tx, rx) = mpsc::channel(8);

    let err = relay
        .relay(meta(channel_type::OPENAI, "sk"), Some(&chat("gpt-4o", false)), &tx)
        .await
        .unwrap_err();
    drop(tx);

    let (status, envelope) = err.to_envelope();
    assert_eq!(status.as_u16(), 429);
    assert_eq!(envelope.error.message, "slow down");
    assert!(drain(rx).await.is_empty());
}

#[tokio::test]
async fn vertex_uses_redirected_model_and_cached_token() {
    let client = CannedClient::new(Canned::Body(
        200,
        r#"{"id":"msg_v","type":"message","role":"assistant","model":"claude-3-opus@20240229",
            "content":[{"type":"text","text":"ok"}],"stop_reason":"end_turn",
            "usage":{"input_tokens":3,"output_tokens":1}}"#,
    ));
    let relay = relay_with(client.clone()).await;
    let (tx, _rx) = mpsc::channel(8);
    let key = format!("my-proj|{SERVICE_ACCOUNT}");

    relay
        .relay(
            meta(channel_type::VERTEX_CLAUDE, &key),
            Some(&chat("claude-3-opus-20240229", false)),
            &tx,
        )
        .await
        .unwrap();

    let sent = client.requests();
    assert_eq!(
        sent[0].url,
        "https://europe-west1-aiplatform.googleapis.com/v1/projects/my-proj/locations/europe-west1/publishers/anthropic/models/claude-3-opus@20240229:streamRawPredict"
    );
    assert_eq!(
        header_get(&sent[0].headers, "Authorization"),
        Some("Bearer ya29.cached")
    );
    let body: serde_json::Value = serde_json::from_slice(sent[0].body.as_ref().unwrap()).unwrap();
    assert_eq!(body["anthropic_version"], "vertex-2023-10-16");
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn unknown_vertex_model_fails_before_sending() {
    let client = CannedClient::new(Canned::Body(200, "{}"));
    let relay = relay_with(client.clone()).await;
    let (tx, _rx) = mpsc::channel(8);

    let err = relay
        .relay(
            meta(channel_type::VERTEX_CLAUDE, &format!("p|{SERVICE_ACCOUNT}")),
            Some(&chat("claude-2.1", false)),
            &tx,
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "model_not_found");
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn doubao_bot_model_routes_to_bots_endpoint() {
    let client = CannedClient::new(Canned::Body(
        200,
        r#"{"id":"d","choices":[{"index":0,"message":{"role":"assistant","content":"hi"}}],
            "usage":{"prompt_tokens":1,"completion_tokens":1,"total_tokens":2}}"#,
    ));
    let relay = relay_with(client.clone()).await;
    let (tx, _rx) = mpsc::channel(8);

    relay
        .relay(meta(channel_type::DOUBAO, "ark"), Some(&chat("Doubao-bot-chat", false)), &tx)
        .await
        .unwrap();

    assert_eq!(
        client.requests()[0].url,
        "https://ark.cn-beijing.volces.com/api/v3/bots/chat/completions"
    );
}
