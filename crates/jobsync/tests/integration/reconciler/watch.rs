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

use std::sync::Arc;
use std::time::Duration;

use jobsync::{JobRequestStatus, ReconcilerConfig};
use tokio::sync::watch;

use crate::fixtures::{
    fast_watch_config, reconciler_with_config, record, response, RecordingNotifier,
    ScriptedController, TestDb,
};

#[tokio::test]
async fn test_watch_polls_until_shutdown() {
    let db = TestDb::new().await;
    db.create_request("jr1", JobRequestStatus::Pending, false).await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = Arc::new(reconciler_with_config(
        &db,
        &controller,
        &notifier,
        fast_watch_config(),
    ));

    controller.push(response(vec![record("j1", "jr1", "running")]));
    controller.push_failure(502);
    controller.push(response(vec![record("j1", "jr1", "succeeded")]));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.watch(shutdown_rx).await })
    };

    let mut settled = false;
    for _ in 0..200 {
        if db.request("jr1").await.cached_status == JobRequestStatus::Succeeded {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown_tx.send(true).unwrap();
    let passes = handle.await.unwrap();

    assert!(settled, "request never reached succeeded");
    // The failed poll in between did not stop the loop.
    assert!(controller.calls().len() >= 3);
    assert!(passes >= 2);
}

#[tokio::test]
async fn test_watch_stops_when_sender_dropped() {
    let db = TestDb::new().await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let reconciler = reconciler_with_config(&db, &controller, &notifier, fast_watch_config());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    drop(shutdown_tx);

    let passes = tokio::time::timeout(Duration::from_secs(5), reconciler.watch(shutdown_rx))
        .await
        .expect("watch loop did not stop");
    assert!(passes <= 1);
}

#[tokio::test]
async fn test_watch_with_zero_interval_config() {
    let db = TestDb::new().await;
    let controller = ScriptedController::new();
    let notifier = RecordingNotifier::new();
    let config = ReconcilerConfig::builder()
        .poll_interval(Duration::ZERO)
        .build();
    let reconciler = reconciler_with_config(&db, &controller, &notifier, config);

    let (_shutdown_tx, shutdown_rx) = watch::channel(true);
    let passes = reconciler.watch(shutdown_rx).await;
    assert_eq!(passes, 0);
}
