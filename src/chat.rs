//! Chat plan builder - transcript and backend state for one planning chat

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::api::ChatReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coach,
    User,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Local>,
}

/// Planning conversation. The backend owns the planning logic; we carry its
/// opaque state between turns and keep the finished plan when it arrives.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    state: Value,
    plan: Option<Value>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn plan(&self) -> Option<&Value> {
        self.plan.as_ref()
    }

    pub fn can_save_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Forget everything. The next turn sent should be the greeting request
    /// (empty message, null state).
    pub fn reset(&mut self) {
        self.messages.clear();
        self.state = Value::Null;
        self.plan = None;
    }

    /// Record user input. Returns the text to send, or `None` for blank input.
    pub fn push_user(&mut self, input: &str) -> Option<String> {
        if input.trim().is_empty() {
            return None;
        }
        self.messages.push(ChatMessage {
            role: Role::User,
            text: input.to_string(),
            at: Local::now(),
        });
        Some(input.to_string())
    }

    /// Apply a backend reply: append the coach message, take the new state,
    /// and keep the plan once the chat is complete.
    pub fn apply_reply(&mut self, reply: ChatReply) {
        self.messages.push(ChatMessage {
            role: Role::Coach,
            text: reply.message,
            at: Local::now(),
        });
        self.state = reply.state;
        if reply.is_complete
            && let Some(plan) = reply.plan_data
        {
            self.plan = Some(plan);
        }
    }
}
