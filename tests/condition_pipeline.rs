//! Integration tests for the file-based condition counting pipeline.

use epoch_spikes::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const HEADER: &str = "trial_on,reward_on,light_on,neuron_1,neuron_2,neuron_3";

/// The six-sample fixture with the given epoch columns.
fn fixture_rows(trial: [&str; 6], reward: [&str; 6], light: [&str; 6]) -> String {
    let n1 = [0, 1, 0, 1, 1, 0];
    let n2 = [-1, 1, 1, 0, 0, -1];
    let n3 = [1, 0, -1, 1, -1, -1];

    let mut lines = vec![HEADER.to_string()];
    for i in 0..6 {
        lines.push(format!(
            "{},{},{},{},{},{}",
            trial[i], reward[i], light[i], n1[i], n2[i], n3[i]
        ));
    }
    lines.join("\n")
}

fn fixture_csv() -> String {
    fixture_rows(
        ["True", "False", "False", "False", "True", "True"],
        ["False", "True", "False", "True", "True", "True"],
        ["False", "False", "True", "True", "False", "True"],
    )
}

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

fn params_json(sample_rate: &str, threshold: &str) -> String {
    format!(
        r#"{{"sample_rate": {}, "threshold": {}}}"#,
        sample_rate, threshold
    )
}

fn run_strings(data: &str, params: &str) -> SpikeCounts {
    let data_file = write_file(data);
    let params_file = write_file(params);
    run_files(data_file.path(), params_file.path()).unwrap()
}

fn assert_counts(counts: &SpikeCounts, expected: [(&str, u64); 7]) {
    assert_eq!(counts.len(), 7);
    for (key, value) in expected {
        assert_eq!(counts.get_key(key), Some(value), "count for '{}'", key);
    }
}

#[test]
fn test_low_threshold_counts() {
    let counts = run_strings(&fixture_csv(), &params_json("1500.0", "-100.0"));
    assert_counts(
        &counts,
        [("t", 0), ("r", 3), ("l", 2), ("tr", 0), ("tl", 0), ("rl", 2), ("trl", 0)],
    );
}

#[test]
fn test_high_threshold_counts() {
    let counts = run_strings(&fixture_csv(), &params_json("1500.0", "100.0"));
    assert_counts(
        &counts,
        [("t", 0), ("r", 0), ("l", 0), ("tr", 0), ("tl", 0), ("rl", 0), ("trl", 0)],
    );
}

#[test]
fn test_all_markers_active() {
    let on = ["True"; 6];
    let counts = run_strings(&fixture_rows(on, on, on), &params_json("1500.0", "0.0"));
    assert_counts(
        &counts,
        [("t", 3), ("r", 3), ("l", 3), ("tr", 3), ("tl", 3), ("rl", 3), ("trl", 3)],
    );
}

#[test]
fn test_lowercase_booleans_accepted() {
    let data = fixture_csv().replace("True", "true").replace("False", "false");
    let counts = run_strings(&data, &params_json("1500.0", "-100.0"));
    assert_eq!(counts.get(Condition::Reward), Some(3));
}

#[test]
fn test_integer_parameter_rejected() {
    let counts = run_strings(&fixture_csv(), &params_json("1500", "0.0"));
    assert!(counts.is_empty());

    let counts = run_strings(&fixture_csv(), &params_json("1500.0", "0"));
    assert!(counts.is_empty());
}

#[test]
fn test_missing_parameter_rejected() {
    let counts = run_strings(&fixture_csv(), r#"{"sample_rate": 1500.0}"#);
    assert!(counts.is_empty());
}

#[test]
fn test_missing_neuron_value_rejected() {
    let data = fixture_csv().replacen("True,False,False,0,", "True,False,False,,", 1);
    assert!(data.contains(",,"));
    let counts = run_strings(&data, &params_json("1500.0", "-100.0"));
    assert!(counts.is_empty());
}

#[test]
fn test_nan_neuron_value_rejected() {
    let data = fixture_csv().replacen("True,False,False,0,", "True,False,False,NaN,", 1);
    let counts = run_strings(&data, &params_json("1500.0", "-100.0"));
    assert!(counts.is_empty());
}

#[test]
fn test_non_boolean_epoch_rejected() {
    let data = fixture_rows(
        ["1", "0", "0", "0", "1", "1"],
        ["False", "True", "False", "True", "True", "True"],
        ["False", "False", "True", "True", "False", "True"],
    );
    let counts = run_strings(&data, &params_json("1500.0", "-100.0"));
    assert!(counts.is_empty());
}

#[test]
fn test_missing_epoch_column_rejected() {
    let data = fixture_csv().replace("light_on", "lights");
    let counts = run_strings(&data, &params_json("1500.0", "-100.0"));
    assert!(counts.is_empty());
}

#[test]
fn test_no_neuron_columns_rejected() {
    let data = "trial_on,reward_on,light_on\nTrue,False,False\nFalse,True,True\nTrue,True,False";
    let counts = run_strings(data, &params_json("1500.0", "-100.0"));
    assert!(counts.is_empty());
}

#[test]
fn test_unreadable_inputs_give_empty_result() {
    let params_file = write_file(&params_json("1500.0", "-100.0"));
    let data_file = write_file(&fixture_csv());

    let counts = run_files("/nonexistent/data.csv", params_file.path()).unwrap();
    assert!(counts.is_empty());

    let counts = run_files(data_file.path(), "/nonexistent/parameters.json").unwrap();
    assert!(counts.is_empty());

    let empty = write_file("");
    let counts = run_files(empty.path(), params_file.path()).unwrap();
    assert!(counts.is_empty());

    let malformed = write_file("{\"sample_rate\": ");
    let counts = run_files(data_file.path(), malformed.path()).unwrap();
    assert!(counts.is_empty());
}

#[test]
fn test_window_longer_than_trace_is_error() {
    let data_file = write_file(&fixture_csv());
    let params_file = write_file(&params_json("10000.0", "0.0"));

    let result = run_files(data_file.path(), params_file.path());
    assert!(matches!(result, Err(SpikeError::WindowTooLong { .. })));
}

#[test]
fn test_idempotent() {
    let data_file = write_file(&fixture_csv());
    let params_file = write_file(&params_json("1500.0", "-100.0"));

    let first = run_files(data_file.path(), params_file.path()).unwrap();
    let second = run_files(data_file.path(), params_file.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_json_output_keys() {
    let counts = run_strings(&fixture_csv(), &params_json("1500.0", "-100.0"));
    let json: serde_json::Value = serde_json::from_str(&counts.to_json_string().unwrap()).unwrap();
    let object = json.as_object().unwrap();

    let mut keys: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
    keys.sort();
    assert_eq!(keys, vec!["l", "r", "rl", "t", "tl", "tr", "trl"]);
    assert_eq!(object["r"], serde_json::json!(3));
}

#[test]
fn test_synthetic_recording_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = RecordingConfig::default().with_dimensions(20_000, 4);
    let recording = generate_recording(&config).unwrap();
    let (data_path, params_path) = recording.to_files(dir.path()).unwrap();

    let run = Pipeline::new().execute_files(&data_path, &params_path).unwrap();
    assert!(!run.is_rejected());
    assert_eq!(run.last_stage, PipelineStage::Done);
    assert_eq!(run.counts.len(), 7);

    // A conjunction can never exceed any of its components
    for condition in Condition::ALL {
        let count = run.counts.get(condition).unwrap();
        for component in condition.components() {
            assert!(count <= run.counts.get(*component).unwrap());
        }
    }

    let truth = recording.total_spikes() as f64;
    let detected = run.total_spikes() as f64;
    assert!((detected - truth).abs() <= 0.2 * truth);
}
