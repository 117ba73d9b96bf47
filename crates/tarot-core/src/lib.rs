//! Domain layer for Quantum Tarot.
//!
//! Reference data, the session aggregate and the port traits that the
//! interaction and application layers implement and drive.

pub mod card;
pub mod config;
pub mod deck;
pub mod error;
pub mod image;
pub mod ports;
pub mod secret;
pub mod session;
pub mod shuffle;
pub mod spread;

// Re-export common types
pub use card::{Arcana, Card, DrawnCard, Orientation, Suit};
pub use error::{BackendError, Result, TarotError};
pub use session::{ChatMessage, ChatRole, Phase, Session, SessionEvent};
pub use spread::{Spread, SpreadChoice, SpreadPosition};
