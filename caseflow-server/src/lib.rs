//! HTTP front end for caseflow sessions.
//!
//! Routes:
//!
//! - `POST /analysis` starts a session
//! - `GET /analysis/{id}` returns its snapshot
//! - `POST /analysis/{id}/refine` applies feedback to the report
//! - `POST /analysis/{id}/cancel` stops a running session
//! - `GET /health` and `GET /agents` describe the service

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod cli;
pub mod routes;
pub mod server;
pub mod settings;
pub mod state;

pub use state::AppState;
