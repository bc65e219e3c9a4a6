//! End-to-end enrichment tests over real CSV files
//!
//! Classification goes through `FakeClassifier`; everything else (checkpoint
//! load, source reader, append sink, throttle) is the production code path.

mod helpers;

use helpers::{attributes_json, data_lines, write_source, FakeClassifier, FakeReply, LogCapture};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::Level;
use vehenrich::services::Throttle;
use vehenrich::workflow::{run_enrichment, PipelineOptions, PipelineStats};

const OUTPUT_HEADER: &str =
    "Veh_Make_ID,Veh_Mod_ID,Veh_Mod_Year,n_crashes,IsElectric,IsHybrid,HasAutomaticBrakingSystem";

async fn run_once(
    classifier: Arc<FakeClassifier>,
    input: &Path,
    output: &Path,
    interval: Duration,
    limit: Option<usize>,
) -> PipelineStats {
    run_enrichment(
        classifier,
        Throttle::new(interval),
        input,
        output,
        PipelineOptions { limit },
    )
    .await
    .unwrap()
}

fn three_vehicles(dir: &Path) -> std::path::PathBuf {
    write_source(
        dir,
        "unique.csv",
        &[
            "FORD,F-150,2020,12",
            "TESLA,MODEL 3,2022,3",
            "TOYOTA,PRIUS,2015,8",
        ],
    )
}

#[tokio::test]
async fn test_tesla_row_is_enriched_with_crash_count_preserved() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_source(temp_dir.path(), "unique.csv", &["Tesla,Model3,2022,15"]);
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new().with_reply(
        "Make: Tesla, Model: Model3, Year: 2022",
        FakeReply::Text(attributes_json(true, false, true)),
    ));

    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.classified, 1);
    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        format!("{}\nTesla,Model3,2022,15,true,false,true\n", OUTPUT_HEADER)
    );
    assert_eq!(classifier.prompts(), vec!["Make: Tesla, Model: Model3, Year: 2022"]);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let input = three_vehicles(temp_dir.path());
    let output = temp_dir.path().join("streamed.csv");

    let first = Arc::new(FakeClassifier::new());
    let stats = run_once(first, &input, &output, Duration::ZERO, None).await;
    assert_eq!(stats.written(), 3);
    let after_first = std::fs::read_to_string(&output).unwrap();

    let second = Arc::new(FakeClassifier::new());
    let stats = run_once(second.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.written(), 0);
    assert_eq!(stats.skipped, 3);
    assert_eq!(second.call_count(), 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), after_first);
}

#[tokio::test]
async fn test_interrupted_run_resumes_without_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let input = three_vehicles(temp_dir.path());
    let output = temp_dir.path().join("streamed.csv");

    // Stop after the first vehicle, as if the process died there
    let first = Arc::new(FakeClassifier::new());
    let stats = run_once(first.clone(), &input, &output, Duration::ZERO, Some(1)).await;
    assert_eq!(stats.written(), 1);
    assert_eq!(first.prompts(), vec!["Make: FORD, Model: F-150, Year: 2020"]);

    let second = Arc::new(FakeClassifier::new());
    let stats = run_once(second.clone(), &input, &output, Duration::ZERO, None).await;
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.written(), 2);
    assert_eq!(
        second.prompts(),
        vec![
            "Make: TESLA, Model: MODEL 3, Year: 2022",
            "Make: TOYOTA, Model: PRIUS, Year: 2015",
        ]
    );

    assert_eq!(
        data_lines(&output),
        vec![
            "FORD,F-150,2020,12,false,false,false",
            "TESLA,MODEL 3,2022,3,false,false,false",
            "TOYOTA,PRIUS,2015,8,false,false,false",
        ]
    );
}

#[tokio::test]
async fn test_invalid_rows_are_never_emitted() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_source(
        temp_dir.path(),
        "unique.csv",
        &[
            "FORD,,2020,4",
            "  ,CIVIC,2019,2",
            "HONDA,CIVIC,   ,1",
            "HONDA,CIVIC,2019,6",
        ],
    );
    let output = temp_dir.path().join("streamed.csv");

    let capture = LogCapture::new();
    let _guard = capture.install();

    let classifier = Arc::new(FakeClassifier::new());
    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.invalid, 3);
    assert_eq!(stats.written(), 1);
    assert_eq!(classifier.call_count(), 1);
    assert_eq!(data_lines(&output), vec!["HONDA,CIVIC,2019,6,false,false,false"]);
    assert_eq!(capture.count_matching(Level::WARN, "Skipping row with missing data"), 3);
    capture.assert_contains("All rows processed and saved");
}

#[tokio::test]
async fn test_fallback_rows_are_final() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_source(
        temp_dir.path(),
        "unique.csv",
        &["KIA,EV6,2023,2", "NISSAN,LEAF,2018,9", "MAZDA,CX-5,2021,4"],
    );
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(
        FakeClassifier::new()
            .with_reply(
                "Make: KIA, Model: EV6, Year: 2023",
                FakeReply::Text("I'm not certain about this one.".to_string()),
            )
            .with_reply("Make: NISSAN, Model: LEAF, Year: 2018", FakeReply::Fail)
            .with_reply(
                "Make: MAZDA, Model: CX-5, Year: 2021",
                FakeReply::Text(format!("```json\n{}\n```", attributes_json(false, false, true))),
            ),
    );

    let stats = run_once(classifier, &input, &output, Duration::ZERO, None).await;
    assert_eq!(stats.unparseable, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.classified, 1);

    assert_eq!(
        data_lines(&output),
        vec![
            "KIA,EV6,2023,2,Unknown,Unknown,Unknown",
            "NISSAN,LEAF,2018,9,Error,Error,Error",
            "MAZDA,CX-5,2021,4,false,false,true",
        ]
    );

    // Neither fallback is retried on the next run
    let rerun = Arc::new(FakeClassifier::new());
    let stats = run_once(rerun.clone(), &input, &output, Duration::ZERO, None).await;
    assert_eq!(stats.written(), 0);
    assert_eq!(rerun.call_count(), 0);
}

#[tokio::test]
async fn test_duplicate_keys_in_input_are_queried_once() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_source(
        temp_dir.path(),
        "crashes.csv",
        &["FORD,F-150,2020,12", " FORD , F-150,2020 ,7"],
    );
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new());
    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(classifier.call_count(), 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(data_lines(&output), vec!["FORD,F-150,2020,12,false,false,false"]);
}

#[tokio::test]
async fn test_throttle_spaces_classifier_calls() {
    let temp_dir = TempDir::new().unwrap();
    let input = three_vehicles(temp_dir.path());
    let output = temp_dir.path().join("streamed.csv");

    let interval = Duration::from_millis(40);
    let classifier = Arc::new(FakeClassifier::new());

    let start = Instant::now();
    run_once(classifier.clone(), &input, &output, interval, None).await;
    let elapsed = start.elapsed();

    assert_eq!(classifier.call_count(), 3);
    assert!(
        elapsed >= interval * 3,
        "expected at least {:?}, took {:?}",
        interval * 3,
        elapsed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_at_most_one_call_in_flight() {
    let temp_dir = TempDir::new().unwrap();
    let input = three_vehicles(temp_dir.path());
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new().with_delay(Duration::from_millis(20)));
    run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(classifier.call_count(), 3);
    assert_eq!(classifier.max_in_flight(), 1);
}

#[tokio::test]
async fn test_existing_output_without_trailing_newline_is_appended_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let input = three_vehicles(temp_dir.path());
    let output = temp_dir.path().join("streamed.csv");
    std::fs::write(
        &output,
        format!("{}\nFORD,F-150,2020,12,true,false,true", OUTPUT_HEADER),
    )
    .unwrap();

    let classifier = Arc::new(FakeClassifier::new());
    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.written(), 2);
    assert_eq!(
        data_lines(&output),
        vec![
            "FORD,F-150,2020,12,true,false,true",
            "TESLA,MODEL 3,2022,3,false,false,false",
            "TOYOTA,PRIUS,2015,8,false,false,false",
        ]
    );
}

#[tokio::test]
async fn test_short_row_is_invalid_and_run_continues() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_source(
        temp_dir.path(),
        "unique.csv",
        &["FORD,F-150", "HONDA,CIVIC,2019,6"],
    );
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new());
    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.rows_read, 2);
    assert_eq!(stats.invalid, 1);
    assert_eq!(classifier.prompts(), vec!["Make: HONDA, Model: CIVIC, Year: 2019"]);
    assert_eq!(data_lines(&output), vec!["HONDA,CIVIC,2019,6,false,false,false"]);
}

#[tokio::test]
async fn test_non_utf8_row_is_decoded_and_run_continues() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("unique.csv");
    let mut content = format!("{}\n", helpers::SOURCE_HEADER).into_bytes();
    content.extend_from_slice(b"CITRO\xcbN,C4,2019,1\nHONDA,CIVIC,2019,6\n");
    std::fs::write(&input, content).unwrap();
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new());
    let stats = run_once(classifier.clone(), &input, &output, Duration::ZERO, None).await;

    assert_eq!(stats.written(), 2);
    assert_eq!(
        classifier.prompts(),
        vec![
            "Make: CITRO\u{FFFD}N, Model: C4, Year: 2019",
            "Make: HONDA, Model: CIVIC, Year: 2019",
        ]
    );

    // The replacement character round-trips through the checkpoint
    let rerun = Arc::new(FakeClassifier::new());
    let stats = run_once(rerun.clone(), &input, &output, Duration::ZERO, None).await;
    assert_eq!(stats.skipped, 2);
    assert_eq!(rerun.call_count(), 0);
}

#[tokio::test]
async fn test_missing_input_leaves_no_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("streamed.csv");

    let classifier = Arc::new(FakeClassifier::new());
    let result = run_enrichment(
        classifier.clone(),
        Throttle::new(Duration::ZERO),
        &temp_dir.path().join("absent.csv"),
        &output,
        PipelineOptions::default(),
    )
    .await;

    assert!(result.is_err());
    assert!(!output.exists());
    assert_eq!(classifier.call_count(), 0);
}
