#![forbid(unsafe_code)]

//! Client core for the Teaxis care-matching platform.
//!
//! This crate provides:
//! - Domain types (users, professionals, appointments, ratings, matchings)
//! - The persisted session store
//! - HTTP transport and the authenticated API client
//! - Error classification and form validation
//! - Screen controllers driving each feature area

pub mod types;
pub mod error;
pub mod failure;
pub mod validation;
pub mod config;
pub mod logging;
pub mod session;
pub mod transport;
pub mod api;
pub mod screens;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use failure::{classify, ApiError, ApiErrorKind};
pub use session::{FileStorage, MemoryStorage, SessionPhase, SessionState, SessionStore, SnapshotStorage};
pub use transport::{ApiRequest, Outcome, Transport};
pub use api::ApiClient;
pub use screens::{AppContext, Loadable, Notice, NoticeLevel, Route, ScreenSet};
