//! Tests for the upload worker loop

use super::*;
use crate::app::models::UnitSystem;
use chrono::Utc;

fn record(date_time: i64) -> Record {
    Record::new(date_time, UnitSystem::Us)
        .with_value("outTemp", 32.5)
        .with_value("outHumidity", 24.0)
}

fn count_posted(events: &[UploadEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, UploadEvent::Posted { .. }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_single_record_end_to_end() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, observer) = create_worker(create_test_config(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_700_000_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.received, 1);
    assert_eq!(summary.posted, 1);
    assert_eq!(summary.attempts, 1);
    assert!(summary.is_consistent());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let request = &sent[0].request;
    assert_eq!(request.param("datetime").as_deref(), Some("2023-11-14T22:13:20Z"));
    assert_eq!(request.param("field1").as_deref(), Some("32.5"));
    assert_eq!(request.param("field2").as_deref(), Some("24"));
    assert_eq!(request.param("field3"), None);
    assert_eq!(request.header("THINGSPEAKAPIKEY"), Some(TEST_API_KEY));

    assert_eq!(
        observer.events(),
        vec![UploadEvent::Posted {
            date_time: 1_700_000_000,
            attempts: 1
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_record_is_dropped_not_requeued() {
    let transport = ScriptedTransport::always(Scripted::Respond(500, ""), 3);
    let (worker, observer) = create_worker(create_test_config(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.enqueue(record(2_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.posted, 1);
    assert_eq!(summary.attempts, 4);
    assert_eq!(transport.sent().len(), 4);

    let events = observer.events();
    let attempt_failures = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::AttemptFailed { date_time: 1_000, .. }))
        .count();
    assert_eq!(attempt_failures, 3);
    assert!(events.contains(&UploadEvent::Failed {
        date_time: 1_000,
        error: "Failed upload after 3 tries".to_string(),
    }));
    assert!(events.contains(&UploadEvent::Posted {
        date_time: 2_000,
        attempts: 1
    }));
}

#[tokio::test(start_paused = true)]
async fn test_zero_body_retried_until_accepted() {
    let transport = ScriptedTransport::new(vec![
        Scripted::Respond(200, "0"),
        Scripted::Respond(200, "0"),
    ]);
    let (worker, observer) = create_worker(create_test_config(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.posted, 1);
    assert_eq!(transport.sent().len(), 3);
    assert!(observer.events().contains(&UploadEvent::Posted {
        date_time: 1_000,
        attempts: 3
    }));
}

#[tokio::test(start_paused = true)]
async fn test_backlog_keeps_newest_records() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config().with_max_backlog(2);
    let (worker, observer) = create_worker(config, transport.clone());
    let queue = worker.queue();

    for i in 1..=5 {
        queue.enqueue(record(i * 1_000)).unwrap();
    }
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.received, 5);
    assert_eq!(summary.discarded_backlog, 3);
    assert_eq!(summary.posted, 2);
    assert!(summary.is_consistent());
    assert_eq!(
        transport.sent_datetimes(),
        vec!["1970-01-01T01:06:40Z", "1970-01-01T01:23:20Z"]
    );
    assert_eq!(observer.events()[0], UploadEvent::BacklogDiscarded { count: 3 });
}

#[tokio::test(start_paused = true)]
async fn test_zero_backlog_discards_everything() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, _) = create_worker(create_test_config().with_max_backlog(0), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.discarded_backlog, 1);
    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_post_interval_skips_close_records() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config().with_post_interval(Duration::from_secs(300));
    let (worker, observer) = create_worker(config, transport.clone());
    let queue = worker.queue();

    for date_time in [1_000, 1_100, 1_299, 1_300, 1_600] {
        queue.enqueue(record(date_time)).unwrap();
    }
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.posted, 3);
    assert_eq!(summary.skipped_interval, 2);
    assert!(observer.events().contains(&UploadEvent::SkippedInterval {
        date_time: 1_100,
        last_post: 1_000
    }));
}

#[tokio::test(start_paused = true)]
async fn test_failed_post_still_paces_next_record() {
    let transport = ScriptedTransport::always(Scripted::Respond(500, ""), 1);
    let config = create_test_config()
        .with_retry(1, Duration::from_secs(5))
        .with_post_interval(Duration::from_secs(300));
    let (worker, _) = create_worker(config, transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.enqueue(record(1_100)).unwrap();
    queue.enqueue(record(1_300)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped_interval, 1);
    assert_eq!(summary.posted, 1);
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_records_skipped() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config().with_stale(Duration::from_secs(3_600));
    let (worker, observer) = create_worker(config, transport.clone());
    let queue = worker.queue();
    let now = Utc::now().timestamp();

    queue.enqueue(record(now - 7_200)).unwrap();
    queue.enqueue(record(now - 10)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.skipped_stale, 1);
    assert_eq!(summary.posted, 1);
    assert_eq!(transport.sent().len(), 1);
    assert!(observer.events().iter().any(|e| matches!(
        e,
        UploadEvent::SkippedStale { date_time, age_secs } if *date_time == now - 7_200 && *age_secs >= 7_200
    )));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_timestamp_does_not_stop_worker() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config()
        .with_stale(Duration::from_secs(3_600))
        .with_post_interval(Duration::from_secs(300));
    let (worker, _) = create_worker(config, transport.clone());
    let handle = worker.start();
    let now = Utc::now().timestamp();

    handle.enqueue(record(i64::MIN)).unwrap();
    handle.enqueue(record(now - 10)).unwrap();
    let summary = handle.shutdown().await.unwrap();

    assert_eq!(summary.received, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.posted, 1);
    assert_eq!(summary.skipped_stale, 0);
    assert_eq!(summary.skipped_interval, 0);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_huge_durations_saturate() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config()
        .with_stale(Duration::from_secs(u64::MAX))
        .with_post_interval(Duration::from_secs(u64::MAX));
    let (worker, _) = create_worker(config, transport.clone());
    let queue = worker.queue();
    let now = Utc::now().timestamp();

    queue.enqueue(record(now - 10)).unwrap();
    queue.enqueue(record(now)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.skipped_stale, 0);
    assert_eq!(summary.posted, 1);
    assert_eq!(summary.skipped_interval, 1);
}

#[tokio::test(start_paused = true)]
async fn test_augmentation_fills_missing_values() {
    let transport = ScriptedTransport::new(vec![]);
    let source = StaticSource::returning(
        Record::new(1_000, UnitSystem::Us)
            .with_value("outTemp", 99.0)
            .with_value("rain", 0.5),
    );
    let (worker, _) = create_worker(create_test_config(), transport.clone());
    let worker = worker.with_augmenter(source.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    worker.run().await;

    let request = &transport.sent()[0].request;
    assert_eq!(request.param("field1").as_deref(), Some("32.5"));
    assert_eq!(request.param("field7").as_deref(), Some("0.50"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_augmentation_failure_falls_back() {
    let transport = ScriptedTransport::new(vec![]);
    let source = StaticSource::failing();
    let (worker, observer) = create_worker(create_test_config(), transport.clone());
    let worker = worker.with_augmenter(source.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.posted, 1);
    assert_eq!(summary.augment_failures, 1);
    assert_eq!(transport.sent()[0].request.param("field1").as_deref(), Some("32.5"));
    assert!(observer.events().iter().any(|e| matches!(e, UploadEvent::AugmentFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_augmentation_disabled() {
    let transport = ScriptedTransport::new(vec![]);
    let source = StaticSource::failing();
    let config = create_test_config().without_augmentation();
    let (worker, _) = create_worker(config, transport.clone());
    let worker = worker.with_augmenter(source.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert_eq!(source.calls(), 0);
    assert_eq!(summary.augment_failures, 0);
    assert_eq!(summary.posted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unit_system_normalisation() {
    let transport = ScriptedTransport::new(vec![]);
    let config = create_test_config().with_unit_system(UnitSystem::MetricWx);
    let (worker, _) = create_worker(config, transport.clone());
    let queue = worker.queue();

    queue
        .enqueue(
            Record::new(1_000, UnitSystem::Us)
                .with_value("outTemp", 212.0)
                .with_value("rain", 1.0),
        )
        .unwrap();
    queue.shutdown().unwrap();
    worker.run().await;

    let request = &transport.sent()[0].request;
    assert_eq!(request.param("field1").as_deref(), Some("100.0"));
    assert_eq!(request.param("field7").as_deref(), Some("25.40"));
}

#[tokio::test(start_paused = true)]
async fn test_skip_upload_formats_without_sending() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, observer) = create_worker(create_test_config().with_skip_upload(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    let summary = worker.run().await;

    assert!(transport.sent().is_empty());
    assert_eq!(summary.skipped_upload, 1);
    assert_eq!(count_posted(&observer.events()), 0);
    assert_eq!(observer.events(), vec![UploadEvent::SkippedUpload { date_time: 1_000 }]);
}

#[tokio::test(start_paused = true)]
async fn test_records_after_sentinel_are_ignored() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, _) = create_worker(create_test_config(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    queue.shutdown().unwrap();
    queue.enqueue(record(2_000)).unwrap();
    let summary = worker.run().await;

    assert_eq!(summary.received, 1);
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_every_handle_dropped() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, _) = create_worker(create_test_config(), transport.clone());
    let queue = worker.queue();

    queue.enqueue(record(1_000)).unwrap();
    drop(queue);
    let summary = worker.run().await;

    assert_eq!(summary.posted, 1);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_worker_states() {
    let transport = ScriptedTransport::new(vec![]);
    let (worker, _) = create_worker(create_test_config(), transport.clone());
    transport.watch_state(worker.subscribe());

    let handle = worker.start();
    let queue = handle.queue();
    let mut state = handle.subscribe();
    state
        .wait_for(|s| *s == WorkerState::Idle)
        .await
        .unwrap();

    handle.enqueue(record(1_000)).unwrap();
    handle.enqueue(record(2_000)).unwrap();
    let summary = handle.shutdown().await.unwrap();

    assert_eq!(summary.posted, 2);
    assert_eq!(*state.borrow(), WorkerState::Stopped);
    for sent in transport.sent() {
        assert_eq!(sent.state, Some(WorkerState::Posting));
    }
    assert!(matches!(queue.enqueue(record(3_000)), Err(Error::QueueClosed)));
    assert!(queue.is_closed());
}

#[test]
fn test_invalid_config_rejected_at_construction() {
    let transport = ScriptedTransport::new(vec![]);
    let result = UploadWorker::new(
        create_test_config().with_retry(0, Duration::from_secs(1)),
        FieldMap::default_layout(),
        transport,
        Arc::new(StandardUnits::new()),
    );
    assert!(matches!(result, Err(Error::Configuration { .. })));
}
