//! End to end runs over files on disk.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use pstats::{
    config::Options,
    stream::{self, Input, Output},
};
use pstats_capture::parse;
use serde_json::{Value, json};
use tempfile::TempDir;

const PSTATS_LOG: &str = "\
Mon Jul  1 15:31:19 2019: { \"name\": \"imudp(*:10514)\", \"origin\": \"imudp\", \"submitted\": 100000 }
Mon Jul  1 15:31:19 2019: { \"name\": \"resource-usage\", \"origin\": \"impstats\", \"utime\": 607857, \"stime\": 630538, \"maxrss\": 4504, \"minflt\": 532, \"majflt\": 0, \"inblock\": 0, \"oublock\": 50768, \"nvcsw\": 139802, \"nivcsw\": 16, \"openfiles\": 14 }
Jul  1 15:31:19 myhost rsyslogd: [origin software=\"rsyslogd\"] rsyslogd was HUPed
Mon Jul  1 15:31:20 2019: @cee: { \"name\": \"imudp(*:10514)\", \"origin\": \"imudp\", \"submitted\": 100050 }
Mon Jul  1 15:31:20 2019: @cee: { \"name\": \"main Q\", \"origin\": \"core.queue\", \"size\": 0, \"enqueued\": 0, \"full\": 0, \"discarded.full\": 0 }
Mon Jul  1 15:31:29 2019: { \"name\": \"msg_per_host\", \"origin\": \"dynstats.bucket\", \"values\": { \"foo.bar\": 12, \"baz.qux\": 3 } }
";

fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("pstats.log");
    let mut file = fs::File::create(&path).expect("create input");
    file.write_all(contents.as_bytes()).expect("write input");
    path
}

fn read_output(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read output");
    assert!(!text.ends_with('\n'), "file output is compact");
    serde_json::from_str(&text).expect("output is valid json")
}

#[test]
fn aggregates_file_into_file() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, PSTATS_LOG);
    let output = dir.path().join("summary.json");

    let options = Options {
        aggregate_stats: true,
        ..Options::default()
    };
    stream::summarise(
        &Input::File(input),
        &Output::File(output.clone()),
        &options,
    )
    .expect("summary succeeds");

    let summary = read_output(&output);
    let pstats = &summary["rsyslog_pstats"];
    assert_eq!(pstats["timestamp_start"], json!("2019-07-01T15:31:19"));
    assert_eq!(pstats["timestamp_end"], json!("2019-07-01T15:31:29"));
    assert_eq!(pstats["runtime_seconds"], json!(10));

    let agg = &pstats["agg_stats"];
    let submitted = &agg["imudp(*:10514)"]["metrics"]["submitted"];
    assert_eq!(submitted["count"], json!(2));
    assert_eq!(submitted["min"], json!(100_000));
    assert_eq!(submitted["max"], json!(100_050));
    assert_eq!(submitted["mean"], json!(100_025));
    assert_eq!(submitted["sum"], json!(200_050));

    let majflt = &agg["resource-usage"]["metrics"]["majflt"];
    assert_eq!(majflt["count"], json!(1));
    assert_eq!(majflt["count_non_zero"], json!(0));
    assert_eq!(majflt["min"], json!(0));
    assert_eq!(majflt["max"], json!(0));
    assert_eq!(majflt["mean"], json!(0));
    for key in [
        "mean_non_zero",
        "timestamp_non_zero_min",
        "timestamp_non_zero_max",
        "time_delta_seconds_non_zero",
    ] {
        assert!(majflt.get(key).is_none(), "{key} should be omitted");
    }

    let queue = &agg["main Q"]["metrics"];
    assert_eq!(queue["full"]["sum"], json!(0));
    assert!(queue["size"].get("sum").is_none());

    let bucket = &agg["msg_per_host"]["metrics"];
    assert_eq!(bucket["foo.bar"]["sum"], json!(12));
    assert_eq!(bucket["baz.qux"]["sum"], json!(3));
}

#[test]
fn show_zero_values_reports_explicit_nulls() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, PSTATS_LOG);
    let output = dir.path().join("summary.json");

    let options = Options {
        aggregate_stats: true,
        show_values: true,
        show_zero_values: true,
        ..Options::default()
    };
    stream::summarise(
        &Input::File(input),
        &Output::File(output.clone()),
        &options,
    )
    .expect("summary succeeds");

    let summary = read_output(&output);
    let majflt = &summary["rsyslog_pstats"]["agg_stats"]["resource-usage"]["metrics"]["majflt"];
    assert_eq!(majflt["mean_non_zero"], Value::Null);
    assert_eq!(majflt["timestamp_non_zero_min"], Value::Null);
    assert_eq!(majflt["timestamp_non_zero_max"], Value::Null);
    assert_eq!(majflt["time_delta_seconds_non_zero"], Value::Null);
    assert_eq!(majflt["values"], json!({"2019-07-01T15:31:19": 0}));
}

#[test]
fn malformed_json_writes_no_output() {
    let dir = TempDir::new().expect("create temp dir");
    let contents = format!("{PSTATS_LOG}Mon Jul  1 15:31:30 2019: {{ \"name\": \"x\", }}\n");
    let input = write_input(&dir, &contents);
    let output = dir.path().join("summary.json");

    let options = Options {
        aggregate_stats: true,
        original_stats: true,
        ..Options::default()
    };
    let err = stream::summarise(
        &Input::File(input),
        &Output::File(output.clone()),
        &options,
    )
    .expect_err("malformed json aborts");
    assert!(
        matches!(err, stream::Error::Parse(parse::Error::Json { line: 7, .. })),
        "{err:?}"
    );
    assert!(!output.exists());
}

#[test]
fn malformed_bucket_aborts_original_stats_only_run() {
    let dir = TempDir::new().expect("create temp dir");
    let contents = format!(
        "{PSTATS_LOG}Mon Jul  1 15:31:30 2019: {{ \"name\": \"b\", \"origin\": \"dynstats.bucket\", \"values\": \"x\" }}\n"
    );
    let input = write_input(&dir, &contents);
    let output = dir.path().join("summary.json");

    let options = Options {
        original_stats: true,
        ..Options::default()
    };
    let err = stream::summarise(
        &Input::File(input),
        &Output::File(output.clone()),
        &options,
    )
    .expect_err("malformed bucket aborts");
    assert!(matches!(err, stream::Error::Report(_)), "{err:?}");
    assert!(!output.exists());
}

#[test]
fn input_without_stats_names_the_file() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, "just\nsome\nsyslog\n");
    let output = dir.path().join("summary.json");

    let err = stream::summarise(
        &Input::File(input.clone()),
        &Output::File(output.clone()),
        &Options::default(),
    )
    .expect_err("no stats");
    assert!(matches!(
        err,
        stream::Error::Parse(parse::Error::NoStats { .. })
    ));
    assert!(err.to_string().contains(&input.display().to_string()));
    assert!(!output.exists());
}

#[test]
fn binary_writes_compact_file_and_pretty_stdout() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, PSTATS_LOG);
    let output = dir.path().join("summary.json");

    let status = Command::new(env!("CARGO_BIN_EXE_pstats-summary"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(["-a", "-s", "-n"])
        .status()
        .expect("run binary");
    assert!(status.success());
    let from_file = read_output(&output);
    let original = from_file["rsyslog_pstats"]["original_stats"]
        .as_object()
        .expect("grouped original stats");
    assert_eq!(original.len(), 3);

    let run = Command::new(env!("CARGO_BIN_EXE_pstats-summary"))
        .arg("--input-rsyslog-pstats-file")
        .arg(&input)
        .args(["--aggregate-stats", "--original-stats", "--no-flatten"])
        .output()
        .expect("run binary");
    assert!(run.status.success());
    let stdout = String::from_utf8(run.stdout).expect("utf8 stdout");
    assert!(stdout.starts_with("{\n  \"rsyslog_pstats\""));
    assert!(stdout.ends_with("}\n"));
    let from_stdout: Value = serde_json::from_str(&stdout).expect("stdout is valid json");
    assert_eq!(from_stdout, from_file);
}

#[test]
fn binary_fails_on_input_without_stats() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, "nothing to see\n");
    let output = dir.path().join("summary.json");

    let run = Command::new(env!("CARGO_BIN_EXE_pstats-summary"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("-a")
        .output()
        .expect("run binary");
    assert!(!run.status.success());
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&run.stderr);
    assert!(stderr.contains("Unable to match any rsyslog pstats"), "{stderr}");
}

#[test]
fn config_file_supplies_defaults() {
    let dir = TempDir::new().expect("create temp dir");
    let input = write_input(&dir, PSTATS_LOG);
    let output = dir.path().join("summary.json");
    let config = dir.path().join("pstats.yaml");
    fs::write(&config, "aggregate_stats: true\n").expect("write config");

    let status = Command::new(env!("CARGO_BIN_EXE_pstats-summary"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--config-path")
        .arg(&config)
        .arg("-s")
        .status()
        .expect("run binary");
    assert!(status.success());

    let summary = read_output(&output);
    assert!(summary["rsyslog_pstats"]["agg_stats"].is_object());
    assert!(summary["rsyslog_pstats"]["original_stats"].is_array());
}
