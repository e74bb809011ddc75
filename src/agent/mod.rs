//! Agent module for Aura
//!
//! This module contains the reasoning loop and the chat service that wraps
//! it with history, session locking and the turn budget.

pub mod core;
pub mod service;

pub use core::{Agent, AgentState, ModelTurn};
pub use service::{ChatService, TurnOutcome};
