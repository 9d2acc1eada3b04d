/*
 * args.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Directive argument lists.
//!
//! An argument list is scanned straight off the source bytes, splitting on
//! separator bytes and ending at (but not consuming) a stop byte. Inside a
//! field:
//!
//! - `"..."`, `'...'`: literal text, escapes decoded
//! - `` `...` ``: run as a command, trimmed stdout
//! - `<...>`: include file content, trimmed and *not* expanded
//! - `$(NAME)`: environment variable
//! - `%(fmt, args...)`: printf-style formatting
//! - `(...)` opening a field of a separated list: a nested list whose
//!   fields are concatenated
//!
//! Any of these suppresses value-map lookup for the field it lands in. A
//! field made of plain text is trimmed and, when it starts like a symbol,
//! replaced from the value map. Openers nested deeper than [`MAX_NESTING`]
//! are kept as plain text.

use crate::eval_context::EvalContext;
use crate::format::sprintf;
use crate::hooks::Hooks;
use crate::literal::scan_literal;
use crate::text::{is_symbol_start, lossy, trimmed};
use crate::values::Values;
use std::cell::Cell;

/// Deepest `$(`, `%(` or `(` nesting scanned inside one argument list.
pub const MAX_NESTING: usize = 128;

/// One decoded argument.
pub type Field = Vec<u8>;

/// What to substitute for a symbol missing from the value map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// `?name?`
    Mark,
    /// Nothing.
    Blank,
}

#[derive(Debug, Clone, Copy)]
pub struct Lookup<'v> {
    pub values: &'v Values,
    pub miss: MissPolicy,
}

#[derive(Debug, Clone, Copy)]
pub struct ArgSpec<'v> {
    pub separators: &'static [u8],
    pub stops: &'static [u8],
    pub lookup: Option<Lookup<'v>>,
}

/// Inner list of `$(...)` and `%(...)`.
const CALL_SPEC: ArgSpec<'static> = ArgSpec {
    separators: b",",
    stops: b")",
    lookup: None,
};

/// Nested `(...)` field.
const GROUP_SPEC: ArgSpec<'static> = ArgSpec {
    separators: b"",
    stops: b")",
    lookup: None,
};

/// Scans argument lists for one directive.
///
/// While `active` is false the scanner moves exactly as it would otherwise
/// but runs nothing, reads nothing, and reports nothing.
pub struct ArgScanner<'a> {
    pub hooks: &'a Hooks,
    pub active: bool,
    /// Start of the directive in the source, for diagnostics.
    pub origin: usize,
    too_deep: Cell<bool>,
}

impl<'a> ArgScanner<'a> {
    pub fn new(hooks: &'a Hooks, active: bool, origin: usize) -> Self {
        Self {
            hooks,
            active,
            origin,
            too_deep: Cell::new(false),
        }
    }

    /// Scan fields from `start`. Returns the fields and the cursor, which
    /// sits on the stop byte or at the end of `src`.
    pub fn scan(
        &self,
        ctx: &mut EvalContext,
        src: &[u8],
        start: usize,
        spec: &ArgSpec<'_>,
    ) -> (Vec<Field>, usize) {
        self.scan_at(ctx, src, start, spec, 0)
    }

    fn scan_at(
        &self,
        ctx: &mut EvalContext,
        src: &[u8],
        start: usize,
        spec: &ArgSpec<'_>,
        depth: usize,
    ) -> (Vec<Field>, usize) {
        let end = src.len();
        let mut fields = Vec::new();
        let mut current = Field::new();
        // Cleared when the field received literal content.
        let mut convert = true;
        let mut pos = start;

        while pos < end {
            let c = src[pos];
            if spec.stops.contains(&c) {
                self.finish_field(ctx, &mut current, convert, spec, pos);
                fields.push(current);
                return (fields, pos);
            }
            if spec.separators.contains(&c) {
                self.finish_field(ctx, &mut current, convert, spec, pos);
                fields.push(std::mem::take(&mut current));
                convert = true;
                pos += 1;
                continue;
            }
            let opens_group = match c {
                b'(' => !spec.separators.is_empty() && current.is_empty() && convert,
                b'$' | b'%' => src.get(pos + 1) == Some(&b'('),
                _ => false,
            };
            if opens_group && depth >= MAX_NESTING {
                self.report_too_deep(ctx, pos);
                current.push(c);
                pos += 1;
                continue;
            }
            match c {
                b'(' if !spec.separators.is_empty() && current.is_empty() && convert => {
                    let (group, next) = self.scan_at(ctx, src, pos + 1, &GROUP_SPEC, depth + 1);
                    pos = skip_closer(src, next);
                    current.extend(group.concat());
                    convert = false;
                }
                b'"' | b'\'' | b'`' | b'<' | b'[' => {
                    let close = match c {
                        b'<' => b'>',
                        b'[' => b']',
                        other => other,
                    };
                    if c == b'[' && self.active {
                        let span = ctx.span(self.origin, pos + 1);
                        ctx.warn_or_error_with_code(
                            "K-3-5",
                            "Square brackets are reserved and read as a plain quote",
                            span,
                        );
                    }
                    let (text, next) = scan_literal(src, pos + 1, end, close);
                    pos = skip_closer(src, next);
                    current = match c {
                        b'`' => self.run_command(ctx, &lossy(&text), pos),
                        b'<' => self.include_raw(ctx, &lossy(&text), pos),
                        _ => text,
                    };
                    convert = false;
                }
                b'$' | b'%' if src.get(pos + 1) == Some(&b'(') => {
                    let (list, next) = self.scan_at(ctx, src, pos + 2, &CALL_SPEC, depth + 1);
                    pos = skip_closer(src, next);
                    if c == b'$' {
                        let name = lossy(trimmed(&list.concat()));
                        self.read_env(ctx, &name, pos, &mut current);
                    } else {
                        let args: Vec<String> = list.iter().map(|f| lossy(f)).collect();
                        if let Some((fmt, rest)) = args.split_first() {
                            current.extend(sprintf(fmt, rest).as_bytes());
                        }
                    }
                    convert = false;
                }
                _ => {
                    // Leading whitespace of a field is dropped.
                    if !(c.is_ascii_whitespace() && current.is_empty()) {
                        current.push(c);
                    }
                    pos += 1;
                }
            }
        }

        self.finish_field(ctx, &mut current, convert, spec, end);
        fields.push(current);
        (fields, end)
    }

    fn report_too_deep(&self, ctx: &mut EvalContext, pos: usize) {
        if !self.active || self.too_deep.replace(true) {
            return;
        }
        let span = ctx.span(self.origin, pos + 1);
        ctx.warn_or_error_with_code(
            "K-3-8",
            format!(
                "Arguments nest deeper than {} levels; the rest is plain text",
                MAX_NESTING
            ),
            span,
        );
    }

    fn finish_field(
        &self,
        ctx: &mut EvalContext,
        field: &mut Field,
        convert: bool,
        spec: &ArgSpec<'_>,
        pos: usize,
    ) {
        let Some(lookup) = spec.lookup.filter(|_| convert) else {
            return;
        };
        let name = trimmed(field).to_vec();
        if !name.first().is_some_and(|&c| is_symbol_start(c)) {
            *field = name;
            return;
        }
        let name = lossy(&name);
        match lookup.values.get(&name) {
            Some(value) => *field = value.as_bytes().to_vec(),
            None => {
                if self.active {
                    let span = ctx.span(self.origin, pos);
                    ctx.warn_or_error_with_code(
                        "K-1-1",
                        format!("Symbol `{}` is not in the value map", name),
                        span,
                    );
                }
                *field = match lookup.miss {
                    MissPolicy::Mark => format!("?{}?", name).into_bytes(),
                    MissPolicy::Blank => Field::new(),
                };
            }
        }
    }

    fn run_command(&self, ctx: &mut EvalContext, command: &str, pos: usize) -> Field {
        if !self.active {
            return Field::new();
        }
        tracing::debug!(command, "running command");
        match self.hooks.runner.run(command) {
            Some(stdout) => trimmed(stdout.as_bytes()).to_vec(),
            None => {
                let span = ctx.span(self.origin, pos);
                ctx.error_with_code("K-2-1", format!("Command `{}` failed", command), span);
                Field::new()
            }
        }
    }

    fn include_raw(&self, ctx: &mut EvalContext, name: &str, pos: usize) -> Field {
        if !self.active {
            return Field::new();
        }
        tracing::debug!(name, "substituting include");
        match self.hooks.includer.include(name) {
            Some(content) => trimmed(content.as_bytes()).to_vec(),
            None => {
                let span = ctx.span(self.origin, pos);
                ctx.error_with_code(
                    "K-2-2",
                    format!("Include file `{}` not found", name),
                    span,
                );
                Field::new()
            }
        }
    }

    fn read_env(&self, ctx: &mut EvalContext, name: &str, pos: usize, field: &mut Field) {
        if !self.active {
            return;
        }
        match self.hooks.environment.var(name) {
            Some(value) => field.extend(value.as_bytes()),
            None => {
                let span = ctx.span(self.origin, pos);
                ctx.warn_or_error_with_code(
                    "K-1-3",
                    format!("Environment variable `{}` is not set", name),
                    span,
                );
            }
        }
    }
}

fn skip_closer(src: &[u8], pos: usize) -> usize {
    if pos < src.len() { pos + 1 } else { pos }
}

/// Capture raw text up to a single `}`, keeping nested `{{...}}` verbatim.
///
/// Leading whitespace is dropped at every level. A nested opener with no
/// matching `}}` is discarded. Returns the text and the cursor (on the `}`
/// or at the end).
pub fn scan_raw(src: &[u8], start: usize) -> (Vec<u8>, usize) {
    let mut out = Vec::new();
    // Offset in `out` of each open `{{`, innermost last.
    let mut open: Vec<usize> = Vec::new();
    let mut pos = start;
    while pos < src.len() {
        let c = src[pos];
        if c == b'}' {
            let Some(mark) = open.pop() else {
                return (out, pos);
            };
            if src[pos..].starts_with(b"}}") {
                pos += 2;
                out.extend_from_slice(b"}}");
            } else {
                out.truncate(mark);
            }
            continue;
        }
        if src[pos..].starts_with(b"{{") {
            open.push(out.len());
            out.extend_from_slice(b"{{");
            pos += 2;
            continue;
        }
        let level_start = open.last().map_or(0, |&mark| mark + 2);
        if !(c.is_ascii_whitespace() && out.len() == level_start) {
            out.push(c);
        }
        pos += 1;
    }
    if let Some(&mark) = open.first() {
        out.truncate(mark);
    }
    (out, src.len())
}
