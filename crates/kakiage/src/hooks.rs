/*
 * hooks.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Collaborators the engine calls out to.
//!
//! The engine itself performs no I/O. Including files, resolving `put`
//! names it has no macro for, running back-tick commands and reading
//! `$(NAME)` variables all go through these traits. Every call is
//! synchronous and reports failure as `None`; the engine turns that into a
//! diagnostic.
//!
//! Each trait is implemented for matching closures, so ad-hoc hooks need no
//! wrapper type:
//!
//! ```
//! use kakiage::Kakiage;
//!
//! let engine = Kakiage::new().with_includer(|name: &str| {
//!     (name == "greeting").then(|| "hello".to_string())
//! });
//! assert_eq!(engine.generate("{{.#include('greeting')}}", &Default::default()), "hello");
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Resolves an include name to template text.
pub trait Includer {
    fn include(&self, name: &str) -> Option<String>;
}

/// Resolves a `put` name with arguments to (unexpanded) template text.
pub trait MacroEvaluator {
    fn evaluate(&self, name: &str, args: &[String]) -> Option<String>;
}

/// Runs a command and captures its standard output.
pub trait CommandRunner {
    /// `None` when the command could not be started or exited unsuccessfully.
    fn run(&self, command: &str) -> Option<String>;
}

/// Reads environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

impl<F> Includer for F
where
    F: Fn(&str) -> Option<String>,
{
    fn include(&self, name: &str) -> Option<String> {
        self(name)
    }
}

impl<F> MacroEvaluator for F
where
    F: Fn(&str, &[String]) -> Option<String>,
{
    fn evaluate(&self, name: &str, args: &[String]) -> Option<String> {
        self(name, args)
    }
}

impl<F> CommandRunner for F
where
    F: Fn(&str) -> Option<String>,
{
    fn run(&self, command: &str) -> Option<String> {
        self(command)
    }
}

impl<F> Environment for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Includer that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIncluder;

impl Includer for NullIncluder {
    fn include(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Includer backed by an in-memory map.
///
/// Useful for tests and for templates bundled into an application.
#[derive(Debug, Clone, Default)]
pub struct MemoryIncluder {
    files: HashMap<String, String>,
}

impl MemoryIncluder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the includer.
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.files.insert(name.into(), content.into());
        self
    }

    /// Create an includer with the given files.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut includer = Self::new();
        for (name, content) in files {
            includer.add(name, content);
        }
        includer
    }
}

impl Includer for MemoryIncluder {
    fn include(&self, name: &str) -> Option<String> {
        self.files.get(name).cloned()
    }
}

/// Includer that reads files relative to a base directory.
///
/// Absolute names are read as they are.
#[derive(Debug, Clone)]
pub struct FileSystemIncluder {
    base_dir: PathBuf,
}

impl FileSystemIncluder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl Includer for FileSystemIncluder {
    fn include(&self, name: &str) -> Option<String> {
        let path = self.resolve(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "include read failed");
                None
            }
        }
    }
}

/// Evaluator that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEvaluator;

impl MacroEvaluator for NullEvaluator {
    fn evaluate(&self, _name: &str, _args: &[String]) -> Option<String> {
        None
    }
}

/// Runs commands through the platform shell (`sh -c`, or `cmd /C` on
/// Windows). Standard error passes through to the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Option<String> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        let output = cmd
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(command, error = %err, "failed to spawn shell");
                return None;
            }
        };
        if !output.status.success() {
            tracing::debug!(command, code = ?output.status.code(), "command exited unsuccessfully");
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Runner that refuses every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRunner;

impl CommandRunner for NullRunner {
    fn run(&self, _command: &str) -> Option<String> {
        None
    }
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnvironment {
    vars: HashMap<String, String>,
}

impl MemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vars(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            vars: vars
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for MemoryEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// The collaborators one engine uses.
pub struct Hooks {
    pub includer: Box<dyn Includer>,
    pub evaluator: Box<dyn MacroEvaluator>,
    pub runner: Box<dyn CommandRunner>,
    pub environment: Box<dyn Environment>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            includer: Box::new(NullIncluder),
            evaluator: Box::new(NullEvaluator),
            runner: Box::new(ShellRunner),
            environment: Box::new(ProcessEnvironment),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
