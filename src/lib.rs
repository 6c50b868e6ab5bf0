//! ptcommand - PT COMMAND fitness program planner
//!
//! Chat-driven plan builder, plan viewer and workout editor on top of the
//! planning backend's REST API.

pub mod api;
pub mod chat;
pub mod edit;
pub mod plan;
pub mod tui;
pub mod workout;

pub use api::ApiClient;
pub use edit::EditSession;
pub use workout::Document;
