//! Risa: a gesture-summoned voice assistant.
//!
//! A two-finger swipe down opens a short spoken dialogue:
//! prompt → listen → classify → act → reply.
//!
//! # Architecture
//!
//! - **Gesture gate** ([`gesture`]): pure swipe-down predicate on pointer samples
//! - **Coordinator** ([`pipeline::coordinator`]): single-writer state machine
//!   that sequences speech, timers, recognition and dispatch
//! - **Classifier** ([`voice_command`]): ordered rule table mapping a
//!   transcript to an [`Intent`]
//! - **App resolver** ([`catalog`]): containment then edit-distance matching
//!   against the installed-application snapshot
//! - **Remote queries** ([`remote`]): Gemini `generateContent` with a fixed
//!   fallback answer
//!
//! Speech engines, the settings store, the application inventory and the
//! device controls are host collaborators behind the traits in [`speech`],
//! [`settings`], [`catalog`] and [`actions`].

pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gesture;
pub mod onboarding;
pub mod pipeline;
pub mod remote;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod similarity;
pub mod speech;
pub mod voice_command;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use pipeline::coordinator::{AssistantCoordinator, AssistantHandle, Collaborators};
pub use runtime::RuntimeEvent;
pub use session::{Phase, Session};
pub use voice_command::Intent;
