//! Server crate for the Smart Recommender.
//!
//! Holds the orchestrator that runs the recommendation pipeline, the
//! account and admin services over the CSV stores, and the HTTP API that
//! exposes them.

pub mod admin;
pub mod auth;
pub mod http;
pub mod orchestrator;
pub mod session;

pub use admin::{AdminService, DashboardMetrics, FeedbackLogEntry, UserSummary};
pub use auth::{AuthError, AuthService, hash_password};
pub use http::{AppState, ServerConfig, build_router, serve};
pub use orchestrator::{Recommendation, RecommendationOrchestrator};
pub use session::{Session, SessionRegistry};
