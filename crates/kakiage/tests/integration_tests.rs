/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for kakiage using test fixtures.
 */

use kakiage::{FileSystemIncluder, Kakiage, TemplateError, Values};
use kakiage_error_reporting::{DiagnosticKind, SourceText};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Engine that resolves includes against the fixture directory
fn engine() -> Kakiage {
    Kakiage::new().with_includer(FileSystemIncluder::new(fixture_path("")))
}

fn expand_fixture(name: &str, values: &Values) -> kakiage::Expansion {
    engine()
        .expand_file(&fixture_path(name), values)
        .unwrap_or_else(|err| panic!("Failed to expand {}: {}", name, err))
}

#[test]
fn test_simple_substitution() {
    let values: Values = [("name", "World")].into_iter().collect();
    let expansion = expand_fixture("simple.template", &values);
    assert_eq!(expansion.text, "Hello, World!");
    assert!(expansion.diagnostics.is_empty());
}

#[test]
fn test_conditional_true() {
    let values: Values = [("show_greeting", "1"), ("name", "Alice")]
        .into_iter()
        .collect();
    let expansion = expand_fixture("conditional.template", &values);
    assert_eq!(expansion.text, "Hello, Alice!");
}

#[test]
fn test_conditional_false() {
    let values: Values = [("show_greeting", "0"), ("name", "Alice")]
        .into_iter()
        .collect();
    let expansion = expand_fixture("conditional.template", &values);
    assert_eq!(expansion.text, "Goodbye.");
}

#[test]
fn test_page_with_includes() {
    let values: Values = [("title", "News"), ("body", "Hello"), ("year", "2025")]
        .into_iter()
        .collect();
    let expansion = expand_fixture("page.template", &values);
    assert_eq!(
        expansion.text,
        "<html>\n<h1>News</h1>\n<p>Hello</p>\n<footer>(c) 2025 {{.year}}</footer>\n</html>\n"
    );
    assert!(expansion.diagnostics.is_empty());
}

#[test]
fn test_macros() {
    let values: Values = [("name", "Taro")].into_iter().collect();
    let expansion = expand_fixture("macros.template", &values);
    assert_eq!(expansion.text, "Hello, Taro and Hello, Taro!\n");
}

#[test]
fn test_self_include_stops_at_depth_limit() {
    let expansion = expand_fixture("includes/loop.template", &Values::new());
    assert_eq!(expansion.text, "x".repeat(11));
    assert!(expansion.has_errors());
    let codes: Vec<_> = expansion
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .collect();
    assert_eq!(codes, vec!["K-2-3"]);
}

#[test]
fn test_broken_template_diagnostics() {
    let path = fixture_path("broken.template");
    let source = std::fs::read_to_string(&path).unwrap();
    let expansion = engine().expand(&source, &Values::new());

    assert_eq!(expansion.text, "unclosed \n");
    assert!(!expansion.has_errors());

    let codes: Vec<_> = expansion
        .diagnostics
        .iter()
        .map(|d| (d.code.as_deref(), d.kind))
        .collect();
    assert_eq!(
        codes,
        vec![
            (Some("K-3-3"), DiagnosticKind::Warning),
            (Some("K-1-1"), DiagnosticKind::Warning),
        ]
    );

    let rendered = expansion.diagnostics[1].to_text(Some(SourceText {
        name: "broken.template",
        content: &source,
    }));
    assert!(rendered.contains("K-1-1"));
    assert!(rendered.contains("broken.template"));
}

#[test]
fn test_strict_mode_reports_errors() {
    let expansion = engine()
        .with_strict_mode(true)
        .expand_file(&fixture_path("broken.template"), &Values::new())
        .unwrap();
    assert!(expansion.has_errors());
    assert!(
        expansion
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::Error)
    );
}

#[test]
fn test_missing_template_file() {
    let result = engine().expand_file(&fixture_path("no-such.template"), &Values::new());
    match result {
        Err(TemplateError::Read { path, .. }) => {
            assert!(path.ends_with("no-such.template"));
        }
        Ok(_) => panic!("expected a read error"),
    }
}

#[test]
fn test_html_mode_with_fixture() {
    let values: Values = [("name", "<b>&</b>")].into_iter().collect();
    let expansion = Kakiage::new()
        .with_html_mode(true)
        .expand_file(&fixture_path("simple.template"), &values)
        .unwrap();
    assert_eq!(expansion.text, "Hello, &lt;b&gt;&amp;&lt;/b&gt;!");
}
