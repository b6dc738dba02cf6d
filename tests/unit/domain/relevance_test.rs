// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use leakrs::domain::models::pattern::{ContentType, Pattern};
use leakrs::domain::services::content_classifier::ContentClassifier;
use leakrs::domain::services::diff::diff_percent;
use leakrs::domain::services::relevance_filter::{BaselineVerdict, RelevanceFilter};

#[test]
fn test_each_content_type_is_recognised() {
    let classifier = ContentClassifier::new();
    let samples = [
        (r#"{"a":1}"#, ContentType::Json),
        ("database:\n  host: localhost\n  port: 5432", ContentType::Yml),
        (
            r#"<?xml version="1.0"?><settings><key>v</key></settings>"#,
            ContentType::Xml,
        ),
        ("<!DOCTYPE html><html><body>hi</body></html>", ContentType::Html),
        ("<div><p>fragment</p></div>", ContentType::Html),
        ("DB_HOST=localhost\nDB_PASSWORD=secret", ContentType::NoSpaces),
        ("# comment line with spaces\nKEY=value", ContentType::NoSpaces),
        ("just some words", ContentType::Text),
    ];

    for (content, expected) in samples {
        assert_eq!(classifier.classify(content), Some(expected), "{:?}", content);
    }
    assert_eq!(classifier.classify("   \n "), None);
}

#[test]
fn test_diff_percent_properties() {
    assert_eq!(diff_percent("hello there", "hello there"), 0);
    assert_eq!(diff_percent("hello there", "hello ther"), 9);
    assert_eq!(diff_percent("hello there", "see ya along"), 83);
    assert_eq!(
        diff_percent("hello there", "see ya along"),
        diff_percent("see ya along", "hello there")
    );
    assert_eq!(diff_percent("", ""), 0);
}

#[test]
fn test_lexical_rejection_is_case_insensitive() {
    let filter = RelevanceFilter::new(60);
    let text = Pattern::Type(ContentType::Text);
    for body in ["OK", "Forbidden", "404", "Error 404 - page missing", "Access Denied here"] {
        assert!(!filter.is_relevant("https://a.com/x", body, &text), "{:?}", body);
    }
    assert!(filter.is_relevant("https://a.com/x", "some useful text", &text));
}

#[test]
fn test_literal_patterns_match_substrings() {
    let filter = RelevanceFilter::new(60);
    let pattern = Pattern::parse("[core]");
    assert!(filter.is_relevant(
        "https://a.com/.git/config",
        "[core]\n\trepositoryformatversion = 0",
        &pattern
    ));
    assert!(!filter.is_relevant("https://a.com/.git/config", "<html>home</html>", &pattern));
}

#[test]
fn test_baseline_comparison() {
    let filter = RelevanceFilter::new(60);
    let json = Pattern::Type(ContentType::Json);

    assert_eq!(
        filter.compare_with_baseline("u", r#"{"test": "testing"}"#, "not found sorry", &json),
        BaselineVerdict::Accept
    );
    assert_eq!(
        filter.compare_with_baseline(
            "u",
            r#"{"status": "not here"}"#,
            r#"{"status": "not found"}"#,
            &json
        ),
        BaselineVerdict::TooSimilar { percent: 21 }
    );
    assert_eq!(
        filter.compare_with_baseline("u", "phpinfo()", "not found sorry", &Pattern::parse("phpinfo()")),
        BaselineVerdict::Accept
    );
}
