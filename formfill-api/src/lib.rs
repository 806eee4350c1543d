//! # formfill-api
//!
//! HTTP service for the formfill library
//!

mod api;
pub mod config;

pub use api::{
    app, app_with_state, fields_handler, fill_handler, health_check, index, process_handler,
    AppError, AppState, ErrorResponse, FieldEntry, FieldsResponse,
};
pub use config::ServerConfig;
