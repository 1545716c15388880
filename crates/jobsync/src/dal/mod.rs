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

//! Data Access Layer for the SQLite Entity Store.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobsync::dal::DAL;
//! use jobsync::database::Database;
//!
//! let dal = DAL::new(Database::try_new("jobsync.db")?);
//! let active = dal.job_request().list_active_identifiers().await?;
//! ```

use crate::database::Database;

pub mod job;
pub mod job_request;
pub mod models;

pub use job::{JobDAL, UpsertedJob};
pub use job_request::JobRequestDAL;

/// The Data Access Layer struct.
///
/// `DAL` is `Clone` and can be shared between tasks; every clone references
/// the same connection pool.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The database instance with connection pool
    pub database: Database,
}

impl DAL {
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns a job request DAL.
    pub fn job_request(&self) -> JobRequestDAL<'_> {
        JobRequestDAL::new(self)
    }

    /// Returns a job DAL.
    pub fn job(&self) -> JobDAL<'_> {
        JobDAL::new(self)
    }
}
