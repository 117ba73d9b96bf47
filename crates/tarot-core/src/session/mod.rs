//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: The session aggregate (`Session`) and its transitions
//! - `phase`: Session phases (`Phase`)
//! - `message`: Chat transcript types (`ChatRole`, `ChatMessage`)
//! - `event`: Notifications for subscribers (`SessionEvent`)

mod event;
mod message;
mod model;
mod phase;

// Re-export public API
pub use event::SessionEvent;
pub use message::{ChatMessage, ChatRole};
pub use model::{
    CONNECTION_FAILED_NOTE, READING_INTERRUPTED_NOTICE, REPLY_FAILED_NOTICE, Session,
};
pub use phase::Phase;
