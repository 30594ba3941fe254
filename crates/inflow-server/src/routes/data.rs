// Copyright (C) 2025 Inflow Contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Record ingestion and retrieval.

use axum::Json;
use axum::extract::{OriginalUri, Query, State};
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use inflow_core::record::{DataRecord, InboundRecord, StoredRecord};
use inflow_core::timing::timed;
use inflow_core::transport::{AppendTransport, DeliveryReceipt};
use inflow_core::workflow::run_workflow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct IngestQuery {
    data_format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FetchQuery {
    data_format: String,
    partition: u32,
    offset: u64,
}

/// A stored record read back from the log, with its coordinates.
#[derive(Debug, Serialize)]
pub(crate) struct StoredRecordResponse {
    location: String,
    stored_at: DateTime<Utc>,
    #[serde(flatten)]
    record: StoredRecord,
}

/// `POST /data`: run an inbound payload through the ingestion workflow.
///
/// The optional `data_format` query parameter selects the log category.
/// Responds with the confirmed record, including its storage location
/// and elapsed timings.
pub(crate) async fn ingest_data(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<DataRecord>, ApiError> {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let origin_url = format!("http://{host}{}", uri.path());

    let mut inbound = InboundRecord::new(payload, origin_url);
    if let Some(data_format) = query.data_format {
        inbound = inbound.with_data_format(data_format);
    }

    let bus = state.clients.bus().await?;
    let record = timed(bus.as_ref(), "ingest_data", || {
        run_workflow(inbound, state.bridge.clone(), state.pipeline.clone())
    })
    .await?;
    Ok(Json(record))
}

/// `GET /data`: read a stored record back by its log coordinates.
pub(crate) async fn fetch_data(
    State(state): State<AppState>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<StoredRecordResponse>, ApiError> {
    let store = state.clients.store().await?;
    let entry = store
        .fetch(&query.data_format, query.partition, query.offset)
        .await?
        .ok_or_else(|| ApiError::not_found("Data record not found"))?;
    let record: StoredRecord = serde_json::from_slice(&entry.payload)
        .map_err(|error| ApiError::internal(format!("stored record is not decodable: {error}")))?;
    let receipt = DeliveryReceipt {
        category: query.data_format,
        partition: query.partition,
        offset: query.offset,
    };
    Ok(Json(StoredRecordResponse {
        location: receipt.location(),
        stored_at: entry.appended_at,
        record,
    }))
}
