#[cfg(test)]
#[path = "stream_decoder_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::mem;

use futures::stream;
use futures::Stream;
use futures::StreamExt;
use serde_derive::Deserialize;

use crate::domain::models::FragmentStream;
use crate::domain::models::StreamFrame;

const FIELD_PREFIX: &str = "data:";
pub const UNEXPECTED_END: &str = "stream ended unexpectedly";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum FramePayload {
    Chunk { content: String },
    Done,
    Error { error: String },
}

impl From<FramePayload> for StreamFrame {
    fn from(payload: FramePayload) -> StreamFrame {
        return match payload {
            FramePayload::Chunk { content } => StreamFrame::Chunk { text: content },
            FramePayload::Done => StreamFrame::Done,
            FramePayload::Error { error } => StreamFrame::Error { message: error },
        };
    }
}

fn parse_line(line: &[u8]) -> Option<StreamFrame> {
    let text = String::from_utf8_lossy(line);
    let payload = text.trim().strip_prefix(FIELD_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<FramePayload>(payload) {
        Ok(frame) => return Some(frame.into()),
        Err(err) => {
            tracing::debug!(error = ?err, line = payload, "Dropping malformed stream frame");
            return None;
        }
    }
}

/// Incremental line-framed decoder. Reads are buffered as bytes so a line, or
/// a multi-byte character, split across reads is only parsed once complete.
#[derive(Default)]
pub struct StreamFrameDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamFrameDecoder {
    pub fn new() -> StreamFrameDecoder {
        return StreamFrameDecoder::default();
    }

    /// True once a terminal frame was produced. Later input is ignored.
    pub fn is_finished(&self) -> bool {
        return self.finished;
    }

    pub fn feed<B: AsRef<[u8]>>(&mut self, fragment: B) -> Vec<StreamFrame> {
        let mut frames = vec![];
        if self.finished {
            return frames;
        }

        self.buffer.extend_from_slice(fragment.as_ref());
        while let Some(pos) = self.buffer.iter().position(|b| return *b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            if let Some(frame) = parse_line(&line) {
                let terminal = frame.is_terminal();
                frames.push(frame);
                if terminal {
                    self.finished = true;
                    self.buffer.clear();
                    break;
                }
            }
        }

        return frames;
    }

    /// Called at end of input. A trailing line without a newline still counts,
    /// but input that never reached Done or Error is reported as truncated.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let mut frames = vec![];
        if self.finished {
            return frames;
        }

        self.finished = true;
        let tail = mem::take(&mut self.buffer);
        if let Some(frame) = parse_line(&tail) {
            let terminal = frame.is_terminal();
            frames.push(frame);
            if terminal {
                return frames;
            }
        }

        tracing::warn!("Answer stream closed without a terminal frame");
        frames.push(StreamFrame::error(UNEXPECTED_END));
        return frames;
    }
}

struct DecodeState {
    fragments: FragmentStream,
    decoder: StreamFrameDecoder,
    pending: VecDeque<StreamFrame>,
    exhausted: bool,
}

/// Lazily turns raw reads into frames. The sequence always ends with exactly
/// one Done or Error frame, network failures included.
pub fn decode_stream(fragments: FragmentStream) -> impl Stream<Item = StreamFrame> + Send {
    let state = DecodeState {
        fragments,
        decoder: StreamFrameDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    return stream::unfold(state, |mut state| {
        return async move {
            loop {
                if let Some(frame) = state.pending.pop_front() {
                    return Some((frame, state));
                }
                if state.exhausted {
                    return None;
                }

                match state.fragments.next().await {
                    Some(Ok(fragment)) => {
                        let frames = state.decoder.feed(&fragment);
                        state.pending.extend(frames);
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = ?err, "Answer stream failed");
                        state.pending.push_back(StreamFrame::error(&err.to_string()));
                        state.exhausted = true;
                    }
                    None => {
                        let frames = state.decoder.finish();
                        state.pending.extend(frames);
                    }
                }

                if state.decoder.is_finished() {
                    state.exhausted = true;
                }
            }
        };
    });
}
