use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::GenerationError;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// Reduces a newline-framed event stream to the concatenated text deltas.
///
/// Bytes are buffered until a full line is available, so records (and
/// multi-byte characters) split across chunk boundaries survive. Lines that
/// are blank, not `data:` records, the `[DONE]` sentinel or malformed JSON are
/// skipped.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    pending: Vec<u8>,
    text: String,
    deltas: usize,
}

/// What one framed line turned out to be.
#[derive(Debug, PartialEq, Eq)]
enum Record {
    Delta(String),
    Done,
    Skipped,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns how many deltas it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        self.pending.extend_from_slice(chunk);
        let mut recognized = 0;
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if self.consume_line(&line) {
                recognized += 1;
            }
        }
        recognized
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    /// Flush an unterminated final record and return the accumulated text.
    pub fn finish(mut self) -> String {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.consume_line(&line);
        }
        self.text
    }

    fn consume_line(&mut self, line: &[u8]) -> bool {
        match parse_record(&String::from_utf8_lossy(line)) {
            Record::Delta(delta) => {
                self.text.push_str(&delta);
                self.deltas += 1;
                true
            }
            Record::Done | Record::Skipped => false,
        }
    }
}

fn parse_record(line: &str) -> Record {
    let Some(data) = line.trim().strip_prefix(DATA_PREFIX) else {
        return Record::Skipped;
    };
    let data = data.trim_start();
    if data == DONE_SENTINEL {
        return Record::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return Record::Skipped;
    };
    match value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
    {
        Some(content) if !content.is_empty() => Record::Delta(content.to_string()),
        _ => Record::Skipped,
    }
}

/// Drive `stream` to exhaustion, calling `on_delta` with the running text
/// after each recognized delta.
///
/// A transport error mid-stream aborts accumulation; malformed records never do.
pub async fn accumulate<S, F>(stream: S, mut on_delta: F) -> Result<String, GenerationError>
where
    S: Stream<Item = Result<Bytes, GenerationError>>,
    F: FnMut(&str),
{
    let mut accumulator = StreamAccumulator::new();
    futures_util::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if accumulator.feed(&chunk) > 0 {
            on_delta(accumulator.text());
        }
    }
    Ok(accumulator.finish())
}

/// Pull `choices[0].message.content` out of a non-streaming response body.
pub fn completed_text(body: &[u8]) -> Result<String, GenerationError> {
    let value: Value = serde_json::from_slice(body).map_err(|err| {
        GenerationError::new(crate::FailureKind::InvalidResponse, err.to_string())
    })?;
    Ok(value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}
