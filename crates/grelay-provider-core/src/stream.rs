use grelay_protocol::openai::{ChatCompletionChunk, OBJECT_CHAT_COMPLETION_CHUNK};
use grelay_protocol::sse::{DataFrame, FrameSplitter, encode_data, encode_done};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::adaptor::{DownstreamSender, forward};
use crate::errors::RelayResult;
use crate::relay_info::RelayInfo;
use crate::upstream::ByteStream;
use crate::usage::UsageCounters;

/// Result of mapping one provider frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translated {
    /// Chunk to forward. `id`/`model` may be empty; they are carried forward
    /// from earlier frames.
    pub chunk: Option<ChatCompletionChunk>,
    /// Tokens reported by this frame, added to the running totals.
    pub usage: Option<UsageCounters>,
}

/// Maps provider stream frames to canonical chunks.
pub trait StreamTranslator: Send {
    type Frame: DeserializeOwned + Send + 'static;

    fn translate(&mut self, frame: Self::Frame) -> Translated;

    /// Called once after the last frame.
    fn finish(&mut self, _usage: &mut UsageCounters) {}
}

/// Relays an upstream `data:` stream as canonical chunks.
///
/// A producer task frames and decodes the raw bytes and hands frames over an
/// unbounded queue, then signals completion. This side maps each frame in
/// arrival order, stamps one `created` value on every chunk and ends with the
/// `[DONE]` sentinel. Undecodable frames are logged and skipped.
pub async fn relay_stream<T: StreamTranslator>(
    info: &mut RelayInfo,
    body: ByteStream,
    mut translator: T,
    downstream: &DownstreamSender,
) -> RelayResult<UsageCounters> {
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<T::Frame>();
    let (done_tx, mut done_rx) = oneshot::channel::<()>();
    tokio::spawn(produce_frames(
        body,
        frame_tx,
        done_tx,
        info.request_id.clone(),
    ));

    let mut state = StreamState {
        created: OffsetDateTime::now_utc().unix_timestamp(),
        id: String::new(),
        model: String::new(),
        usage: UsageCounters::default(),
    };

    loop {
        tokio::select! {
            biased;
            frame = frame_rx.recv() => match frame {
                Some(frame) => {
                    state.forward_frame(info, &mut translator, frame, downstream).await?;
                }
                None => break,
            },
            _ = &mut done_rx => {
                while let Ok(frame) = frame_rx.try_recv() {
                    state.forward_frame(info, &mut translator, frame, downstream).await?;
                }
                break;
            }
        }
    }

    translator.finish(&mut state.usage);
    if info.should_include_usage {
        let chunk = ChatCompletionChunk {
            id: state.id.clone(),
            object: OBJECT_CHAT_COMPLETION_CHUNK.to_string(),
            created: state.created,
            model: state.model.clone(),
            choices: Vec::new(),
            usage: Some(state.usage.into()),
            ..Default::default()
        };
        if let Ok(payload) = serde_json::to_vec(&chunk) {
            forward(downstream, encode_data(&payload)).await?;
        }
    }
    forward(downstream, encode_done()).await?;

    Ok(state.usage)
}

struct StreamState {
    created: i64,
    id: String,
    model: String,
    usage: UsageCounters,
}

impl StreamState {
    async fn forward_frame<T: StreamTranslator>(
        &mut self,
        info: &mut RelayInfo,
        translator: &mut T,
        frame: T::Frame,
        downstream: &DownstreamSender,
    ) -> RelayResult<()> {
        let Translated { chunk, usage } = translator.translate(frame);
        if let Some(delta) = usage {
            self.usage.add(delta);
        }
        let Some(mut chunk) = chunk else {
            return Ok(());
        };

        carry_forward(&mut self.id, &mut chunk.id);
        carry_forward(&mut self.model, &mut chunk.model);
        chunk.created = self.created;
        if chunk.object.is_empty() {
            chunk.object = OBJECT_CHAT_COMPLETION_CHUNK.to_string();
        }

        let payload = match serde_json::to_vec(&chunk) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    event = "stream_chunk_encode_failed",
                    trace_id = %info.request_id,
                    error = %err,
                );
                return Ok(());
            }
        };
        info.set_first_response_time();
        forward(downstream, encode_data(&payload)).await
    }
}

/// Remembers the last non-empty value and fills it into empty ones.
fn carry_forward(last: &mut String, value: &mut String) {
    if value.is_empty() {
        value.clone_from(last);
    } else {
        last.clone_from(value);
    }
}

async fn produce_frames<F: DeserializeOwned + Send + 'static>(
    mut body: ByteStream,
    frames: mpsc::UnboundedSender<F>,
    done: oneshot::Sender<()>,
    trace_id: String,
) {
    let mut splitter = FrameSplitter::new();
    let mut ended = false;
    'read: while let Some(chunk) = body.recv().await {
        for frame in splitter.push_bytes(&chunk) {
            if !decode_and_send(frame, &frames, &trace_id) {
                ended = true;
                break 'read;
            }
        }
    }
    // Leftover bytes after the sentinel are not part of the stream.
    if !ended && let Some(frame) = splitter.finish() {
        decode_and_send(frame, &frames, &trace_id);
    }
    let _ = done.send(());
}

/// Returns `false` once the stream is over (sentinel seen or consumer gone).
fn decode_and_send<F: DeserializeOwned>(
    frame: DataFrame,
    frames: &mpsc::UnboundedSender<F>,
    trace_id: &str,
) -> bool {
    let payload = match frame {
        DataFrame::Done => return false,
        DataFrame::Payload(payload) => payload,
    };
    match serde_json::from_str::<F>(&payload) {
        Ok(frame) => frames.send(frame).is_ok(),
        Err(err) => {
            warn!(
                event = "stream_frame_skipped",
                trace_id = %trace_id,
                error = %err,
                payload = %payload,
            );
            true
        }
    }
}
