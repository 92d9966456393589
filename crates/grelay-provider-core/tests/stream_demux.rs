use std::time::Duration;

use bytes::Bytes;
use grelay_protocol::openai::{ChatCompletionChunk, ChatCompletionRequest, ChatMessage, StreamOptions};
use grelay_provider_core::{
    ChannelRegistry, RelayInfo, RelayMeta, StreamTranslator, Translated, UsageCounters,
    channel_type, relay_stream,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

struct Passthrough;

impl StreamTranslator for Passthrough {
    type Frame = ChatCompletionChunk;

    fn translate(&mut self, frame: ChatCompletionChunk) -> Translated {
        Translated {
            usage: frame.usage.map(UsageCounters::from),
            chunk: Some(frame),
        }
    }
}

fn info(include_usage: bool) -> RelayInfo {
    let mut info = RelayInfo::build(
        RelayMeta {
            channel_type: channel_type::OPENAI,
            ..Default::default()
        },
        &ChannelRegistry::with_builtin(),
    )
    .unwrap();
    let mut request = ChatCompletionRequest::new("gpt-4o", vec![ChatMessage::text("user", "hi")]);
    request.stream = true;
    request.stream_options = Some(StreamOptions { include_usage });
    info.bind_request(&request);
    info
}

/// Runs the demux over `chunks` and returns every downstream record.
async fn run(info: &mut RelayInfo, chunks: &[&[u8]]) -> (Vec<String>, UsageCounters) {
    let (body_tx, body_rx) = mpsc::channel(16);
    for chunk in chunks {
        body_tx.send(Bytes::copy_from_slice(chunk)).await.unwrap();
    }
    drop(body_tx);

    let (down_tx, mut down_rx) = mpsc::channel(64);
    let usage = timeout(
        Duration::from_secs(2),
        relay_stream(info, body_rx, Passthrough, &down_tx),
    )
    .await
    .unwrap()
    .unwrap();
    drop(down_tx);

    let mut records = Vec::new();
    while let Some(record) = down_rx.recv().await {
        records.push(String::from_utf8(record.to_vec()).unwrap());
    }
    (records, usage)
}

fn chunk_of(record: &str) -> ChatCompletionChunk {
    let payload = record
        .strip_prefix("data: ")
        .and_then(|rest| rest.strip_suffix("\n\n"))
        .unwrap();
    serde_json::from_str(payload).unwrap()
}

#[tokio::test]
async fn single_frame_then_sentinel() {
    let mut info = info(false);
    let (records, _) = run(&mut info, &[b"data: {\"id\":\"x\"}\n\ndata: [DONE]\n"]).await;
    assert_eq!(records.len(), 2);
    assert_eq!(chunk_of(&records[0]).id, "x");
    assert_eq!(records[1], "data: [DONE]\n\n");
    assert!(info.has_first_response());
}

#[tokio::test]
async fn malformed_frame_is_skipped() {
    let mut info = info(false);
    let (records, _) = run(
        &mut info,
        &[b"data: {\"id\":\"a\"}\ndata: {bad json\ndata: {\"id\":\"b\"}\n"],
    )
    .await;
    assert_eq!(records.len(), 3);
    assert_eq!(chunk_of(&records[0]).id, "a");
    assert_eq!(chunk_of(&records[1]).id, "b");
    assert_eq!(records[2], "data: [DONE]\n\n");
}

#[tokio::test]
async fn id_model_and_created_are_carried_forward() {
    let mut info = info(false);
    let (records, _) = run(
        &mut info,
        &[
            b"data: {\"id\":\"c1\",\"model\":\"m\",\"created\":1}\n",
            b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}],\"created\":2}\n",
            // Trailing record without newline still counts.
            b"data: {\"id\":\"c2\"}",
        ],
    )
    .await;
    let chunks: Vec<_> = records[..3].iter().map(|record| chunk_of(record)).collect();
    assert_eq!(chunks[1].id, "c1");
    assert_eq!(chunks[1].model, "m");
    assert_eq!(chunks[2].id, "c2");
    assert_eq!(chunks[2].model, "m");
    assert_eq!(chunks[0].created, chunks[1].created);
    assert_eq!(chunks[1].created, chunks[2].created);
    assert_eq!(records[3], "data: [DONE]\n\n");
}

#[tokio::test]
async fn usage_is_summed_and_reported_before_sentinel() {
    let mut info = info(true);
    let (records, usage) = run(
        &mut info,
        &[
            b"data: {\"id\":\"u\",\"usage\":{\"prompt_tokens\":10,\"completion_tokens\":1}}\n",
            b"data: {\"usage\":{\"prompt_tokens\":0,\"completion_tokens\":4,\"total_tokens\":99}}\n",
            b"data: [DONE]\n",
            b"data: {\"id\":\"after-done\"}\n",
        ],
    )
    .await;
    assert_eq!(usage, UsageCounters::new(10, 5));
    assert_eq!(usage.total_tokens, 15);

    assert_eq!(records.len(), 4);
    let usage_chunk = chunk_of(&records[2]);
    assert!(usage_chunk.choices.is_empty());
    assert_eq!(usage_chunk.usage.unwrap().total_tokens, 15);
    assert_eq!(usage_chunk.id, "u");
    assert_eq!(records[3], "data: [DONE]\n\n");
    assert!(records.iter().all(|record| !record.contains("after-done")));
}

#[tokio::test]
async fn unterminated_record_after_sentinel_is_dropped() {
    let mut info = info(false);
    let (records, _) = run(
        &mut info,
        &[b"data: {\"id\":\"x\"}\ndata: [DONE]\ndata: {\"id\":\"after-done\"}"],
    )
    .await;
    assert_eq!(records.len(), 2);
    assert_eq!(chunk_of(&records[0]).id, "x");
    assert_eq!(records[1], "data: [DONE]\n\n");
    assert!(records.iter().all(|record| !record.contains("after-done")));
}

#[tokio::test]
async fn empty_upstream_still_terminates() {
    let mut info = info(false);
    let (records, usage) = run(&mut info, &[]).await;
    assert_eq!(records, vec!["data: [DONE]\n\n".to_string()]);
    assert!(usage.is_empty());
    assert!(!info.has_first_response());
}
