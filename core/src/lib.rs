//! Shared domain types for the meditation-video generation control plane.
//!
//! This crate has no I/O of its own: it defines the entities, status enums,
//! and pricing rules that every other crate (ledger, store, queue, worker,
//! api) builds on, the way a teacher's `*-protocol` crate sits underneath
//! its transport and storage layers.

mod error;
mod ids;
mod pricing;
mod request;
mod status;
mod transaction;
mod video;

pub use error::FieldErrors;
pub use ids::RequestId;
pub use ids::TransactionId;
pub use ids::UserId;
pub use ids::VideoId;
pub use pricing::DurationSeconds;
pub use pricing::PRIVATE_SURCHARGE;
pub use pricing::price_for;
pub use request::GenerationRequest;
pub use request::NewGenerationRequest;
pub use status::CreditTransactionType;
pub use status::GenerationStatus;
pub use status::ModerationStatus;
pub use status::Role;
pub use status::ScriptType;
pub use status::Visibility;
pub use status::VideoVisibility;
pub use transaction::CreditTransaction;
pub use video::Video;
pub use video::title_from_prompt;
