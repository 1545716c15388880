/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Error types for the reconciliation engine.
//!
//! Each layer owns its own error enum:
//!
//! - [`StoreError`] for the Entity Store (pool, diesel, row decoding)
//! - [`StatusClientError`] for the controller status API
//! - [`NotifyError`] for notification delivery
//! - [`ReconcileError`] for a whole reconciliation pass
//!
//! Only store and status-client failures abort a pass. Notification failures
//! are isolated per job and surface in the pass outcome instead.

use thiserror::Error;

/// Errors raised by the Entity Store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection could not be checked out of the pool, or the blocking
    /// interaction with it failed.
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    /// The underlying query failed.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Embedded migrations could not be applied.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored timestamp could not be parsed back into a UTC datetime.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A stored job request status is not one of the known cached statuses.
    #[error("Invalid job request status: '{0}'")]
    InvalidStatus(String),

    /// Metrics could not be encoded or decoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested entity does not exist.
    #[error("{entity} not found: {identifier}")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    /// The database could not be configured from the supplied URL.
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while querying the controller's status endpoint.
#[derive(Debug, Error)]
pub enum StatusClientError {
    /// The request never produced a response (connect failure, timeout).
    #[error("Status request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller answered with a non-success status code.
    #[error("Controller returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a valid status document.
    #[error("Could not decode status response: {0}")]
    Decode(String),

    /// The client could not be built from its settings.
    #[error("Invalid status client configuration: {0}")]
    Configuration(String),
}

/// Errors raised by a [`crate::notifier::Notifier`].
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Errors that abort a reconciliation pass.
///
/// Writes already applied before the failure are kept; every write the
/// engine performs is idempotent, so the next pass simply retries.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    StatusClient(#[from] StatusClientError),
}
