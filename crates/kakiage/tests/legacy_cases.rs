/*
 * legacy_cases.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Table of directive forms existing templates rely on, run against stub
 * collaborators.
 */

use kakiage::{Kakiage, MemoryEnvironment, MemoryIncluder, Values};
use pretty_assertions::assert_eq;

fn engine() -> Kakiage {
    Kakiage::new()
        .with_includer(MemoryIncluder::with_files([(
            "test.txt",
            "<span>{copyright}</span>",
        )]))
        .with_evaluator(|name: &str, args: &[String]| match (name, args) {
            ("inet_checkip", _) => Some("14.3.142.77".to_string()),
            ("inet_resolve", [host]) if host == "a.root-servers.net" => {
                Some("198.41.0.4".to_string())
            }
            _ => None,
        })
        .with_runner(|command: &str| (command == "uname").then(|| "Linux\n".to_string()))
        .with_environment(MemoryEnvironment::with_vars([("SHELL", "/bin/bash")]))
}

fn values() -> Values {
    [("name", "Taro"), ("age", "24")].into_iter().collect()
}

const CASES: &[(&str, &str)] = &[
    ("{{.#put.inet_checkip}}", "14.3.142.77"),
    // unbalanced parenthesis still closes at `}}`
    ("{{.#put('inet_checkip'}}", "14.3.142.77"),
    ("{{.#put.inet_resolve(\"a.root-servers.net\")}}", "198.41.0.4"),
    ("{{.#put(\"inet_resolve\", \"a.root-servers.net\")}}", "198.41.0.4"),
    ("{{.#url(<test.txt>)}}", "%3Cspan%3E%7Bcopyright%7D%3C%2Fspan%3E"),
    ("{{.#url(\"<test.txt>\")}}", "%3Ctest.txt%3E"),
    ("{{.#html(<test.txt>)}}", "&lt;span&gt;{copyright}&lt;/span&gt;"),
    ("{{.#html(\"<test.txt>\")}}", "&lt;test.txt&gt;"),
    ("{{.#include.\"test.txt\"}}", "<span>{copyright}</span>"),
    ("{{.#include(\"test.txt\")}}", "<span>{copyright}</span>"),
    ("name = {{.name}}", "name = Taro"),
    ("age = {{.age}}", "age = 24"),
    ("{{.#raw.name}}", "Taro"),
    ("{{.#raw(name)}}", "Taro"),
    ("{{.`uname`}}", "Linux"),
    ("{{.<test.txt>}}", "<span>{copyright}</span>"),
    ("{{.$(SHELL)}}", "/bin/bash"),
    ("{{.#define.hoge=fuga}}{{.#put.hoge}}", "fuga"),
    ("{{.#define.hoge fuga}}{{.#put.hoge}}", "fuga"),
    ("{{.#define.hoge  fuga}}{{.#put.hoge}}", "fuga"),
    ("{{.#define('hoge','fuga')}}{{.#put.hoge}}", "fuga"),
    ("{{.#define('hoge', 'fuga')}}{{.#put.hoge}}", "fuga"),
    ("{{.#define(\"hoge\",\"fuga\")}}{{.#put.hoge}}", "fuga"),
    ("{{.#define(\"hoge\", \"fuga\")}}{{.#put.hoge}}", "fuga"),
    ("{{.#define.hoge=fuga}}{{.#put('hoge')}}", "fuga"),
    ("{{.#define.hoge fuga}}{{.#put(\"hoge\")}}", "fuga"),
    // a bare name is looked up in the value map, so this asks for `?hoge?`
    ("{{.#define.hoge fuga}}{{.#put(hoge)}}", "?hoge?"),
    // macro bodies are expanded on use
    ("{{.#define.hoge={{.'fuga'}}}}{{.#put.hoge}}", "fuga"),
    ("({{.#if.1}}foo{{.#else}}bar{{.}})", "(foo)"),
    ("({{.#if.0}}foo{{.#else}}bar{{.}})", "(bar)"),
    ("({{.#if.1}}foo{{.#else}}bar{{.#end}})", "(foo)"),
    ("({{.#if.0}}foo{{.#else}}bar{{.#end}})", "(bar)"),
    ("(&&.{};)", "(&.{})"),
    ("(&&&&&;)", "(&&&&)"),
    ("a&{;b&{{;c&{{{;d", "a{b{{c{{{d"),
    (";a&{{&b.}};;c;", ";a{{&b.}};c;"),
];

#[test]
fn test_legacy_cases() {
    let engine = engine();
    let values = values();
    let failures: Vec<String> = CASES
        .iter()
        .enumerate()
        .filter_map(|(i, (source, expected))| {
            let actual = engine.generate(source, &values);
            (actual != *expected).then(|| {
                format!(
                    "case {}: {}\n  expected: {}\n  actual:   {}",
                    i, source, expected, actual
                )
            })
        })
        .collect();
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_misspelled_put_reports_both_misses() {
    let expansion = engine().expand("{{.#define.hoge fuga}}{{.#put(hoge)}}", &values());
    let codes: Vec<_> = expansion
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .collect();
    assert_eq!(codes, vec!["K-1-1", "K-1-2"]);
}

#[test]
fn test_evaluator_arity_mismatch_is_undefined() {
    let expansion = engine().expand("{{.#put.inet_resolve('a', 'b')}}", &values());
    assert_eq!(expansion.text, "inet_resolve");
    assert_eq!(
        expansion.diagnostics[0].code.as_deref(),
        Some("K-1-2")
    );
}
