use bytes::Bytes;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// One record pulled out of a `data:`-framed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFrame {
    /// JSON payload following `data:` (leading whitespace removed).
    Payload(String),
    /// The literal `[DONE]` sentinel.
    Done,
}

/// Splits a newline-delimited byte stream into `data:` records.
///
/// Bytes are buffered until a `\n` arrives, so multi-byte characters and
/// records split across network chunks are reassembled before decoding.
/// Blank records, records shorter than the prefix and records without the
/// `data:` prefix are dropped.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: Vec<u8>,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<DataFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(frame) = parse_record(&line[..line.len() - 1]) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Flushes the trailing record when the stream ends without a newline.
    pub fn finish(&mut self) -> Option<DataFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_record(&line)
    }
}

fn parse_record(raw: &[u8]) -> Option<DataFrame> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.len() < DATA_PREFIX.len() || !raw.starts_with(DATA_PREFIX.as_bytes()) {
        return None;
    }
    let payload = String::from_utf8_lossy(&raw[DATA_PREFIX.len()..]);
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Some(DataFrame::Done);
    }
    Some(DataFrame::Payload(payload.to_string()))
}

/// Encodes one outbound `data: <payload>\n\n` record.
pub fn encode_data(payload: &[u8]) -> Bytes {
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(b"data: ");
    data.extend_from_slice(payload);
    data.extend_from_slice(b"\n\n");
    Bytes::from(data)
}

pub fn encode_done() -> Bytes {
    Bytes::from_static(b"data: [DONE]\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_records_and_skips_noise() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.push_bytes(b"data: {\"a\":1}\n\nevent: ping\ndat\n:comment\ndata:[DONE]\n");
        assert_eq!(
            frames,
            vec![
                DataFrame::Payload("{\"a\":1}".to_string()),
                DataFrame::Done
            ]
        );
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn reassembles_records_split_across_chunks() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push_bytes(b"data: {\"text\":\"h").is_empty());
        // "é" split between two chunks.
        assert!(splitter.push_bytes(&[0xC3]).is_empty());
        let frames = splitter.push_bytes(&[0xA9, b'"', b'}', b'\r', b'\n']);
        assert_eq!(
            frames,
            vec![DataFrame::Payload("{\"text\":\"hé\"}".to_string())]
        );
    }

    #[test]
    fn trailing_record_without_newline_is_flushed() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.push_bytes(b"data: {\"id\":\"x\"}").is_empty());
        assert_eq!(
            splitter.finish(),
            Some(DataFrame::Payload("{\"id\":\"x\"}".to_string()))
        );
    }

    #[test]
    fn encodes_outbound_records() {
        assert_eq!(encode_data(b"{}"), Bytes::from_static(b"data: {}\n\n"));
        assert_eq!(encode_done(), Bytes::from_static(b"data: [DONE]\n\n"));
    }
}
