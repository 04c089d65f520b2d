/*!
 * Tests for file and folder utilities
 */

use std::path::PathBuf;

use deck_translator::file_utils::FileManager;
use crate::common;

#[test]
fn test_generate_output_path_withNestedInput_shouldKeepDirectory() {
    let output = FileManager::generate_output_path("/decks/2024/review.pptx", "/decks/2024", "es");
    assert_eq!(output, PathBuf::from("/decks/2024/review.es.pptx"));
}

#[test]
fn test_generate_output_path_withFreeTextLanguage_shouldSanitize() {
    let output = FileManager::generate_output_path("review.pptx", "out", "auto (en-US)");
    assert_eq!(output, PathBuf::from("out/review.auto__en-US_.pptx"));
}

#[test]
fn test_find_presentations_withSubdirectories_shouldRecurse() {
    let dir = common::create_temp_dir().unwrap();
    let nested = dir.path().join("q1");
    FileManager::ensure_dir(&nested).unwrap();
    std::fs::write(dir.path().join("a.pptx"), b"x").unwrap();
    std::fs::write(nested.join("b.pptx"), b"x").unwrap();
    std::fs::write(nested.join("b.de.pptx"), b"x").unwrap();

    let found = FileManager::find_presentations(dir.path(), "de").unwrap();
    assert_eq!(found, vec![dir.path().join("a.pptx"), nested.join("b.pptx")]);
}

#[test]
fn test_append_to_log_file_shouldAppendLines() {
    let dir = common::create_temp_dir().unwrap();
    let log = dir.path().join("logs/run.log");
    FileManager::append_to_log_file(&log, "first").unwrap();
    FileManager::append_to_log_file(&log, "second").unwrap();

    let content = std::fs::read_to_string(&log).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("first"));
    assert!(lines[1].ends_with("second"));
}
