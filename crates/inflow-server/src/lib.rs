// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Inflow HTTP API server.
//!
//! A thin axum layer over [`inflow_core`]: one route to ingest records,
//! one to read them back by log coordinates, and a status probe. All
//! ingestion semantics live in the core crate; the handlers translate
//! HTTP requests into workflow runs and workflow errors into HTTP
//! problem responses.
//!
//! | Route         | Method | Purpose                                  |
//! |---------------|--------|------------------------------------------|
//! | `/data`       | POST   | Ingest a record through the workflow     |
//! | `/data`       | GET    | Read a stored record back by coordinates |
//! | `/status`     | GET    | Application and transport availability   |

#![deny(missing_docs)]

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
