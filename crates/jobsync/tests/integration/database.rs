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

use jobsync::{Database, StoreError};

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("state.db").display());

    let database = Database::try_new(&url).unwrap();
    database.run_migrations().await.unwrap();
    database.run_migrations().await.unwrap();

    let reopened = Database::try_new(&url).unwrap();
    reopened.run_migrations().await.unwrap();
}

#[tokio::test]
async fn test_rejects_non_sqlite_urls() {
    assert!(matches!(
        Database::try_new("postgres://localhost/jobsync"),
        Err(StoreError::Configuration(_))
    ));
    assert!(matches!(
        Database::try_new(""),
        Err(StoreError::Configuration(_))
    ));
}
