//! Concurrent appends against one daily log.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use drawing_gateway::history::{parse_day, DailyLog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    n: usize,
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(DailyLog::<Entry>::new(dir.path(), "history"));
    let day = parse_day("2026-10-17").unwrap();

    let tasks: Vec<_> = (0..50)
        .map(|n| {
            let log = log.clone();
            tokio::spawn(async move { log.append_on(day, Entry { n }).await })
        })
        .collect();
    for result in futures_util::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let mut entries = log.read_day(day).await.unwrap();
    assert_eq!(entries.len(), 50);
    entries.sort_by_key(|e| e.n);
    assert!(entries.iter().enumerate().all(|(i, e)| e.n == i));

    // No temp file left behind.
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_reads_interleaved_with_writes_see_whole_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(DailyLog::<Entry>::new(dir.path(), "visits"));
    let day = parse_day("2026-10-17").unwrap();

    let writer = {
        let log = log.clone();
        tokio::spawn(async move {
            for n in 0..30 {
                log.append_on(day, Entry { n }).await.unwrap();
            }
        })
    };
    let reader = {
        let log = log.clone();
        tokio::spawn(async move {
            let mut last = 0;
            for _ in 0..30 {
                let seen = log.read_day(day).await.unwrap().len();
                assert!(seen >= last, "day shrank from {} to {}", last, seen);
                last = seen;
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(log.read_day(day).await.unwrap().len(), 30);
}

#[tokio::test]
async fn test_days_listed_newest_first_per_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let audit = DailyLog::<Entry>::new(dir.path(), "history");
    let visits = DailyLog::<Entry>::new(dir.path(), "visits");

    let days = ["2026-10-15", "2026-10-17", "2026-10-16"];
    for raw in days {
        audit.append_on(parse_day(raw).unwrap(), Entry { n: 0 }).await.unwrap();
    }
    visits
        .append_on(parse_day("2026-01-01").unwrap(), Entry { n: 0 })
        .await
        .unwrap();

    let listed = audit.list_days().await.unwrap();
    assert_eq!(
        listed,
        vec![
            NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
        ]
    );
    assert_eq!(visits.list_days().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_absent_day_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let log = DailyLog::<Entry>::new(dir.path().join("not-created-yet"), "history");
    assert!(log.read_day(parse_day("2026-10-17").unwrap()).await.unwrap().is_empty());
    assert!(log.list_days().await.unwrap().is_empty());
}
