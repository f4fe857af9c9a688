#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;

use super::Role;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MessageType {
    Normal,
    Error,
}

/// One entry of the chat log. Assistant messages may be opened incomplete and
/// filled chunk by chunk while an answer streams in; everything else is
/// complete from the moment it is created.
#[derive(Clone, Debug)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
    mtype: MessageType,
    complete: bool,
    failure: Option<String>,
}

impl Message {
    pub fn new(role: Role, text: &str) -> Message {
        return Message::new_with_type(role, MessageType::Normal, text);
    }

    pub fn new_with_type(role: Role, mtype: MessageType, text: &str) -> Message {
        return Message {
            role,
            text: text.replace('\t', "  "),
            timestamp: Local::now(),
            mtype,
            complete: true,
            failure: None,
        };
    }

    /// An empty assistant message waiting for streamed chunks.
    pub fn placeholder() -> Message {
        let mut msg = Message::new(Role::Assistant, "");
        msg.complete = false;
        return msg;
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn is_complete(&self) -> bool {
        return self.complete;
    }

    pub fn is_error(&self) -> bool {
        return self.mtype == MessageType::Error;
    }

    pub fn failure_reason(&self) -> Option<&str> {
        return self.failure.as_deref();
    }

    /// Whether streamed chunks may still be appended.
    pub fn is_open(&self) -> bool {
        return self.role == Role::Assistant && !self.complete;
    }

    pub fn append(&mut self, text: &str) -> bool {
        if !self.is_open() {
            return false;
        }

        self.text += &text.replace('\t', "  ");
        return true;
    }

    pub fn finish(&mut self) {
        self.complete = true;
    }

    pub fn fail(&mut self, reason: &str) {
        self.complete = true;
        self.mtype = MessageType::Error;
        self.failure = Some(reason.to_string());
    }
}
