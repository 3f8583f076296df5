use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tabstash"))
}

fn fixture_file(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON report on stdout")
}

#[test]
fn test_render_writes_wav_report() {
    let path = std::env::temp_dir().join(format!("tabstash-cli-{}.wav", std::process::id()));
    let output = cli()
        .args([
            "render",
            "--bpm",
            "120",
            "--beats",
            "4",
            "--sample-rate",
            "8000",
            "--output",
        ])
        .arg(&path)
        .output()
        .expect("failed to run tabstash render");
    assert!(output.status.success(), "exit {:?}", output.status.code());

    let json = stdout_json(&output);
    assert_eq!(json["beats"], 4);
    assert_eq!(json["bpm"], 120);
    assert!(path.exists());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_render_clamps_tempo_text() {
    let path = std::env::temp_dir().join(format!("tabstash-cli-clamp-{}.wav", std::process::id()));
    let output = cli()
        .args(["render", "--bpm", "999", "--beats", "1", "--output"])
        .arg(&path)
        .output()
        .expect("failed to run tabstash render");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["bpm"], 300);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_render_rejects_oversized_track() {
    let path = std::env::temp_dir().join(format!("tabstash-cli-huge-{}.wav", std::process::id()));
    let output = cli()
        .args(["render", "--beats", "18446744073709551615", "--output"])
        .arg(&path)
        .output()
        .expect("failed to run tabstash render");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_search_prints_ranked_panel() {
    let output = cli()
        .args(["search", "--index", &fixture_file("search-index.json"), "iron"])
        .output()
        .expect("failed to run tabstash search");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["panel"]["panel"], "hits");
    assert_eq!(json["panel"]["results"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["visible_items"], 3);
}

#[test]
fn test_search_with_missing_index_falls_back() {
    let output = cli()
        .args(["search", "--index", "/nonexistent/search-index.json", "iron"])
        .output()
        .expect("failed to run tabstash search");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["panel"]["panel"], "unavailable");
}

#[test]
fn test_scroll_simulation_reaches_end() {
    let output = cli()
        .args([
            "scroll",
            "--speed",
            "fast",
            "--viewport",
            "600",
            "--document",
            "1000",
        ])
        .output()
        .expect("failed to run tabstash scroll");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["reached_end"], true);
    assert_eq!(json["state"]["is_active"], false);
    assert!(json["scroll_top"].as_f64().unwrap_or_default() >= 390.0);
}
