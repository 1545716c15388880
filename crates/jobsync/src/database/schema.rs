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

//! Diesel table definitions for the SQLite store.
//!
//! Timestamps are RFC3339 TEXT, booleans INTEGER (0/1), metrics JSON TEXT.

diesel::table! {
    job_requests (identifier) {
        identifier -> Text,
        cached_status -> Text,
        status_message -> Nullable<Text>,
        will_notify -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    jobs (identifier) {
        identifier -> Text,
        job_request_id -> Text,
        action -> Text,
        run_command -> Text,
        status -> Text,
        status_code -> Text,
        status_message -> Text,
        metrics -> Text,
        created_at -> Text,
        updated_at -> Text,
        started_at -> Nullable<Text>,
        completed_at -> Nullable<Text>,
    }
}

diesel::joinable!(jobs -> job_requests (job_request_id));

diesel::allow_tables_to_appear_in_same_query!(job_requests, jobs);
