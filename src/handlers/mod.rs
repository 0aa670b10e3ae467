//! Update handlers
//!
//! Endpoints wired into the dispatcher: message updates run the admission
//! pipeline, callback updates drive the captcha keypad.

pub mod callbacks;
pub mod messages;
