//! Application layer for Quantum Tarot.
//!
//! This crate provides the reading session use case that coordinates the
//! domain model with the randomness and generative adapters.

pub mod factory;
pub mod session_usecase;

pub use factory::{SessionOptions, build_gemini_session, build_ports};
pub use session_usecase::{ReadingSessionUseCase, SessionPorts};
