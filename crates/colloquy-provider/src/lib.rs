//! # Colloquy Provider
//!
//! The seam between a debate session and whatever produces debate content.
//!
//! | Provider | Use |
//! |----------|-----|
//! | [`MockProvider`] | Tests, demos and offline sessions |
//!
//! A real backend implements [`DebateProvider`]; the session only ever talks
//! to the trait.
//!
//! ## Quick Start
//!
//! ```rust
//! use colloquy_core::DebateFormat;
//! use colloquy_provider::{DebateProvider, DebateRequest, MockProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = MockProvider::instant();
//!     let request = DebateRequest::new(
//!         "Should cities ban cars?",
//!         &["economist", "historian"],
//!         DebateFormat::Standard,
//!     );
//!
//!     let debate = provider.generate_debate(request).await.unwrap();
//!     assert!(debate.validate().is_ok());
//! }
//! ```

pub mod mock;
pub mod provider;

pub use mock::MockProvider;
pub use provider::{
    ChallengeResponse, ConsiderationResponse, DebateProvider, DebateRequest, EvidenceResponse,
    FollowUpResponse, GenerationError, SteelmanResponse,
};
