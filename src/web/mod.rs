//! Web API module for Hoard.
//!
//! A thin JSON mapping of the tree service: folders, file uploads and downloads,
//! deletion, recent files, breadcrumbs and statistics.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
