//! # Colloquy Runtime
//!
//! The debate state container and everything that drives it:
//! - [`reduce`]: pure transitions of [`DebateSessionState`] by [`Action`]
//! - [`DebateSession`]: owns the state, publishes it on a watch channel and
//!   sequences provider calls, preferences and analytics around it
//! - [`spawn_layout_driver`]: animates a force layout on a tokio interval
//! - [`RuntimeConfig`]: `COLLOQUY_*` environment configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use colloquy_core::DebateFormat;
//! use colloquy_provider::MockProvider;
//! use colloquy_runtime::{DebateSession, RuntimeConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let session = DebateSession::new(Arc::new(MockProvider::instant()), RuntimeConfig::default()).await;
//! session
//!     .start_new_debate("Should AI be regulated?", &["technologist", "ethicist"], DebateFormat::Standard)
//!     .await
//!     .unwrap();
//! assert!(session.snapshot().current_debate.is_some());
//! # }
//! ```

pub mod animation;
pub mod config;
pub mod error;
pub mod reducer;
pub mod session;
pub mod state;

pub use animation::{spawn_layout_driver, LayoutDriver};
pub use config::RuntimeConfig;
pub use error::SessionError;
pub use reducer::{reduce, Action};
pub use session::{ConsiderationOutcome, DebateSession};
pub use state::DebateSessionState;
