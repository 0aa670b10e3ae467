//! Admission pipeline
//!
//! A sequential, short-circuiting chain of verification stages. Every
//! message update flows classify → local ban → external ban → captcha
//! challenge; a stage either yields to the next one or terminates the
//! pipeline after enacting its side effects. Stage errors are reported and
//! drop the update, never retried in-band.

pub mod challenge;
pub mod classify;
pub mod external_ban;
pub mod local_ban;
pub mod recorder;

use crate::telegram::Dependencies;

/// Whether the next stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFlow {
    Continue,
    Stop,
}

/// Request-scoped context shared by the stages of one update.
pub struct UpdateContext<'a> {
    pub deps: &'a Dependencies,
    pub msg: &'a teloxide::types::Message,
    /// Set by the classifier; later stages skip their checks when false.
    pub should_verify: bool,
}

impl<'a> UpdateContext<'a> {
    pub fn new(deps: &'a Dependencies, msg: &'a teloxide::types::Message) -> Self {
        Self {
            deps,
            msg,
            should_verify: true,
        }
    }

    pub fn sender(&self) -> Option<&'a teloxide::types::User> {
        self.msg.from.as_ref()
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.sender().map(|user| user.id.0 as i64)
    }

    pub fn chat_id(&self) -> i64 {
        self.msg.chat.id.0
    }

    pub fn message_id(&self) -> i64 {
        i64::from(self.msg.id.0)
    }
}
