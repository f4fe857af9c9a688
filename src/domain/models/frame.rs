/// One unit of a streamed answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamFrame {
    Chunk { text: String },
    Done,
    Error { message: String },
}

impl StreamFrame {
    pub fn error(message: &str) -> StreamFrame {
        return StreamFrame::Error {
            message: message.to_string(),
        };
    }

    /// Done and Error close the answer, nothing may follow them.
    pub fn is_terminal(&self) -> bool {
        return !matches!(self, StreamFrame::Chunk { .. });
    }
}
