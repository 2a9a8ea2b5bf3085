//! chatdesk - chat client core
//!
//! An in-memory conversation, a submission state machine that allows one
//! pending reply at a time, and pluggable response providers. The `chatdesk`
//! binary is a terminal front end; `chatdesk-server` serves the `/api/chat`
//! contract the default provider speaks.

pub mod api;
pub mod conversation;
pub mod llm;
pub mod runtime;
pub mod state_machine;
