/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The expansion loop.
//!
//! A single pass over the source bytes. Plain text is copied to the output
//! while emission is on; `{{`-led directives are parsed and applied in
//! place; `&` escapes emit directive-like text literally. `include`, `jsx`
//! and `put` re-enter the loop on the text they resolve, each in a fresh
//! macro frame.

use crate::args::{ArgScanner, ArgSpec, Lookup, MissPolicy, scan_raw};
use crate::condition::{ConditionError, ConditionStack};
use crate::error::{TemplateError, TemplateResult};
use crate::escape::{html_encode, url_encode};
use crate::eval_context::EvalContext;
use crate::hooks::{CommandRunner, Environment, Hooks, Includer, MacroEvaluator};
use crate::literal::scan_literal;
use crate::output::OutputBuffer;
use crate::text::{
    is_symbol_char, is_symbol_start, line_terminator_len, lossy, parse_int_prefix, trim,
};
use crate::values::Values;
use kakiage_error_reporting::{DiagnosticKind, DiagnosticMessage, SourceSpan};
use std::path::Path;

/// Generated text plus everything that went wrong producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub text: String,
    pub diagnostics: Vec<DiagnosticMessage>,
}

impl Expansion {
    /// Check if any error diagnostics were produced (warnings don't count).
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }
}

/// The template expander.
///
/// ```
/// use kakiage::{Kakiage, Values};
///
/// let values: Values = [("name", "Taro")].into_iter().collect();
/// let engine = Kakiage::new();
/// assert_eq!(engine.generate("Hello, {{.name}}!", &values), "Hello, Taro!");
/// ```
#[derive(Debug)]
pub struct Kakiage {
    hooks: Hooks,
    html_mode: bool,
    strict_mode: bool,
    max_include_depth: usize,
    max_macro_depth: usize,
}

impl Default for Kakiage {
    fn default() -> Self {
        Self::new()
    }
}

impl Kakiage {
    /// An engine with no includer or evaluator, shell commands and the
    /// process environment.
    pub fn new() -> Self {
        Self {
            hooks: Hooks::default(),
            html_mode: false,
            strict_mode: false,
            max_include_depth: 10,
            max_macro_depth: 64,
        }
    }

    /// HTML-escape the values substituted by `{{.name}}`.
    pub fn with_html_mode(mut self, html_mode: bool) -> Self {
        self.html_mode = html_mode;
        self
    }

    pub fn with_includer(mut self, includer: impl Includer + 'static) -> Self {
        self.hooks.includer = Box::new(includer);
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl MacroEvaluator + 'static) -> Self {
        self.hooks.evaluator = Box::new(evaluator);
        self
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.hooks.runner = Box::new(runner);
        self
    }

    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.hooks.environment = Box::new(environment);
        self
    }

    /// Report warnings as errors.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Deepest include chain allowed before includes are refused.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Deepest `put` nesting allowed before macro calls are refused.
    pub fn with_max_macro_depth(mut self, depth: usize) -> Self {
        self.max_macro_depth = depth;
        self
    }

    pub fn html_mode(&self) -> bool {
        self.html_mode
    }

    /// Expand `source`, discarding diagnostics.
    pub fn generate(&self, source: &str, values: &Values) -> String {
        self.generate_at_depth(source, values, 0)
    }

    /// Expand `source` as if it were included `include_depth` levels deep.
    pub fn generate_at_depth(&self, source: &str, values: &Values, include_depth: usize) -> String {
        self.expand_at_depth(source, values, include_depth).text
    }

    /// Expand `source`, keeping diagnostics.
    pub fn expand(&self, source: &str, values: &Values) -> Expansion {
        self.expand_at_depth(source, values, 0)
    }

    pub fn expand_at_depth(&self, source: &str, values: &Values, include_depth: usize) -> Expansion {
        let mut ctx = EvalContext::new()
            .with_strict_mode(self.strict_mode)
            .with_max_include_depth(self.max_include_depth)
            .with_max_macro_depth(self.max_macro_depth);
        let text = self.expand_in(&mut ctx, source.as_bytes(), values, include_depth);
        Expansion {
            text,
            diagnostics: ctx.into_diagnostics(),
        }
    }

    /// Read and expand a template file.
    pub fn expand_file(&self, path: &Path, values: &Values) -> TemplateResult<Expansion> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.expand(&source, values))
    }

    fn expand_in(
        &self,
        ctx: &mut EvalContext,
        src: &[u8],
        values: &Values,
        include_depth: usize,
    ) -> String {
        let mut frame = ctx.enter_frame();
        Expander::new(self, values, src, include_depth).run(&mut frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Raw,
    Html,
    Url,
    Put,
    Define,
    Include,
    Jsx,
    If,
    Ifn,
    Elif,
    Elifn,
    Else,
    End,
}

impl Keyword {
    fn parse(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"raw" => Keyword::Raw,
            b"html" => Keyword::Html,
            b"url" => Keyword::Url,
            b"put" => Keyword::Put,
            b"define" => Keyword::Define,
            b"include" => Keyword::Include,
            b"jsx" => Keyword::Jsx,
            b"if" => Keyword::If,
            b"ifn" => Keyword::Ifn,
            b"elif" => Keyword::Elif,
            b"elifn" => Keyword::Elifn,
            b"else" => Keyword::Else,
            b"end" => Keyword::End,
            _ => return None,
        })
    }

    /// `define` and `put` accept a `.name` key before their arguments.
    fn takes_key(self) -> bool {
        matches!(self, Keyword::Define | Keyword::Put)
    }
}

/// What follows `{{`. Offsets are relative to the directive start.
#[derive(Debug, Clone, Copy)]
enum Lead {
    /// `{{.}}`
    EndShorthand,
    /// `{{.;` or `{{;`
    Comment(usize),
    /// `{{.#name` or `{{#name`, offset of `name`
    Keyword(usize),
    /// `{{.`, offset of the body
    Bare(usize),
}

#[derive(Debug, Default)]
struct Body {
    key: Option<String>,
    fields: Vec<String>,
    /// `define` text captured verbatim after `=` or whitespace.
    raw: bool,
}

/// State of one expansion call.
struct Expander<'a> {
    engine: &'a Kakiage,
    values: &'a Values,
    src: &'a [u8],
    pos: usize,
    out: OutputBuffer,
    conditions: ConditionStack,
    open_ifs: Vec<SourceSpan>,
    comment_depth: usize,
    comment_start: usize,
    include_depth: usize,
}

impl<'a> Expander<'a> {
    fn new(engine: &'a Kakiage, values: &'a Values, src: &'a [u8], include_depth: usize) -> Self {
        Self {
            engine,
            values,
            src,
            pos: 0,
            out: OutputBuffer::new(),
            conditions: ConditionStack::new(),
            open_ifs: Vec::new(),
            comment_depth: 0,
            comment_start: 0,
            include_depth,
        }
    }

    fn run(mut self, ctx: &mut EvalContext) -> String {
        let src = self.src;
        while self.pos < src.len() {
            if self.comment_depth > 0 {
                self.skip_comment_byte();
                continue;
            }
            let c = src[self.pos];
            if c == b'{' {
                if let Some(lead) = self.lead() {
                    self.directive(ctx, lead);
                    continue;
                }
            }
            if c == b'&' && matches!(src.get(self.pos + 1), Some(b'&' | b'.' | b'{' | b'}')) {
                self.escape();
                continue;
            }
            self.emit(&src[self.pos..=self.pos]);
            self.pos += 1;
        }

        if self.comment_depth > 0 {
            let span = ctx.span(self.comment_start, src.len());
            ctx.warn_or_error_with_code("K-3-6", "Comment is never closed with `}}`", span);
        }
        for span in self.open_ifs.drain(..) {
            ctx.warn_or_error_with_code(
                "K-3-3",
                "Conditional block is never closed with `{{.#end}}` or `{{.}}`",
                span,
            );
        }
        self.out.into_string()
    }

    fn lead(&self) -> Option<Lead> {
        let rest = &self.src[self.pos..];
        if !rest.starts_with(b"{{") {
            return None;
        }
        match rest.get(2) {
            Some(b'.') => Some(match rest.get(3) {
                Some(b'}') if rest.get(4) == Some(&b'}') => Lead::EndShorthand,
                Some(b';') => Lead::Comment(4),
                Some(b'#') => Lead::Keyword(4),
                _ => Lead::Bare(3),
            }),
            Some(b'#') if rest.get(3).is_some_and(|&c| is_symbol_start(c)) => {
                Some(Lead::Keyword(3))
            }
            Some(b';') => Some(Lead::Comment(3)),
            _ => None,
        }
    }

    fn directive(&mut self, ctx: &mut EvalContext, lead: Lead) {
        let start = self.pos;
        match lead {
            Lead::EndShorthand => {
                self.pos += 5;
                self.eat_newline();
                let span = ctx.span(start, self.pos);
                self.end_block(ctx, span);
            }
            Lead::Comment(offset) => {
                self.pos += offset;
                self.comment_depth = 1;
                self.comment_start = start;
            }
            Lead::Keyword(offset) => self.keyword_directive(ctx, start, start + offset),
            Lead::Bare(offset) => self.bare_directive(ctx, start, start + offset),
        }
    }

    fn keyword_directive(&mut self, ctx: &mut EvalContext, start: usize, name_start: usize) {
        let src = self.src;
        let name_len = src[name_start..]
            .iter()
            .take_while(|&&c| is_symbol_char(c))
            .count();
        let name = &src[name_start..name_start + name_len];
        let keyword = Keyword::parse(name);
        self.pos = name_start + name_len;
        tracing::trace!(keyword = %lossy(name), at = start, "directive");

        let active = match keyword {
            Some(Keyword::Elif | Keyword::Elifn) => self.conditions.elif_would_evaluate(),
            Some(Keyword::Else | Keyword::End) | None => false,
            Some(_) => self.conditions.is_active(),
        };
        let body = self.parse_body(ctx, start, keyword, active);
        self.close_directive(ctx, start);
        let span = ctx.span(start, self.pos);

        match keyword {
            Some(keyword) => self.apply(ctx, keyword, body, active, span),
            None => ctx.warn_or_error_with_code(
                "K-3-1",
                format!("Directive `#{}` is not recognized", lossy(name)),
                span,
            ),
        }
    }

    fn parse_body(
        &mut self,
        ctx: &mut EvalContext,
        start: usize,
        keyword: Option<Keyword>,
        active: bool,
    ) -> Body {
        let src = self.src;
        let engine = self.engine;
        let scanner = ArgScanner::new(&engine.hooks, active, start);
        let lookup = Some(Lookup {
            values: self.values,
            miss: MissPolicy::Mark,
        });
        let mut body = Body::default();

        if keyword.is_some_and(Keyword::takes_key) && src.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            let len = src[self.pos..]
                .iter()
                .enumerate()
                .take_while(|&(i, &c)| {
                    if i == 0 {
                        is_symbol_start(c)
                    } else {
                        is_symbol_char(c)
                    }
                })
                .count();
            body.key = Some(lossy(&src[self.pos..self.pos + len]));
            self.pos += len;
        }

        match src.get(self.pos) {
            Some(b'(') => {
                let spec = ArgSpec {
                    separators: b",",
                    stops: b")}",
                    lookup,
                };
                let (fields, next) = scanner.scan(ctx, src, self.pos + 1, &spec);
                self.pos = next;
                if src.get(self.pos) == Some(&b')') {
                    self.pos += 1;
                }
                body.fields = fields.iter().map(|f| lossy(f)).collect();
            }
            Some(&c) if keyword == Some(Keyword::Define) && (c == b'=' || c.is_ascii_whitespace()) => {
                let (raw, next) = scan_raw(src, self.pos + 1);
                self.pos = next;
                body.fields = vec![lossy(&raw)];
                body.raw = true;
            }
            Some(b'.') => {
                let spec = ArgSpec {
                    separators: b"",
                    stops: b"}",
                    lookup,
                };
                let (fields, next) = scanner.scan(ctx, src, self.pos + 1, &spec);
                self.pos = next;
                body.fields = fields.iter().map(|f| lossy(f)).collect();
            }
            _ => {}
        }
        body
    }

    /// Consume the closing `}}`, skipping anything left before it.
    fn close_directive(&mut self, ctx: &mut EvalContext, start: usize) {
        let src = self.src;
        let rest = &src[self.pos..];
        if rest.starts_with(b"}}") {
            self.pos += 2;
            return;
        }
        match rest.windows(2).position(|w| w == b"}}") {
            Some(offset) => {
                let junk = lossy(&rest[..offset]);
                self.pos += offset + 2;
                let span = ctx.span(start, self.pos);
                ctx.warn_or_error_with_code(
                    "K-3-7",
                    format!("Unexpected text `{}` before `}}}}`", junk),
                    span,
                );
            }
            None => {
                self.pos = src.len();
                let span = ctx.span(start, self.pos);
                ctx.warn_or_error_with_code("K-3-6", "Directive is never closed with `}}`", span);
            }
        }
    }

    fn apply(
        &mut self,
        ctx: &mut EvalContext,
        keyword: Keyword,
        body: Body,
        active: bool,
        span: SourceSpan,
    ) {
        let value = body.fields.first().cloned().unwrap_or_default();
        match keyword {
            Keyword::Raw => self.emit_str(&value),
            Keyword::Html => self.emit_str(&html_encode(&value, true)),
            Keyword::Url => self.emit_str(&url_encode(&value, true)),
            Keyword::Define => {
                self.eat_newline();
                if active {
                    self.define(ctx, body, span);
                }
            }
            Keyword::Put => {
                if active {
                    self.put(ctx, body, span);
                }
            }
            Keyword::Include => {
                if active {
                    if let Some(text) = self.include(ctx, &value, span) {
                        self.emit_str(&text);
                    }
                }
            }
            Keyword::Jsx => {
                if active {
                    self.jsx(ctx, &body.fields, span);
                }
            }
            Keyword::If | Keyword::Ifn => {
                let predicate = (parse_int_prefix(&value) != 0) == (keyword == Keyword::If);
                self.conditions.push_if(predicate);
                self.open_ifs.push(span);
            }
            Keyword::Elif | Keyword::Elifn => {
                let predicate = (parse_int_prefix(&value) != 0) == (keyword == Keyword::Elif);
                if let Err(err) = self.conditions.elif(predicate) {
                    report_condition(ctx, err, span);
                }
            }
            Keyword::Else => {
                if let Err(err) = self.conditions.else_branch() {
                    report_condition(ctx, err, span);
                }
            }
            Keyword::End => {
                self.eat_newline();
                self.end_block(ctx, span);
            }
        }
    }

    fn define(&mut self, ctx: &mut EvalContext, body: Body, span: SourceSpan) {
        let Body { key, fields, raw } = body;
        let mut fields = fields.into_iter();
        let (name, value) = match key {
            Some(key) => (key, fields.next().unwrap_or_default()),
            None if raw => split_definition(&fields.next().unwrap_or_default()),
            None => (
                fields.next().unwrap_or_default(),
                fields.next().unwrap_or_default(),
            ),
        };
        let name = trim(&name).to_string();
        if name.is_empty() {
            ctx.warn_or_error_with_code("K-3-4", "`define` needs a macro name", span);
            return;
        }

        let command = if raw {
            command_text(&value).map(str::to_string)
        } else {
            None
        };
        let value = match command.as_deref() {
            Some(command) => {
                tracing::debug!(command, "running command for definition");
                match self.engine.hooks.runner.run(command) {
                    Some(stdout) => trim(&stdout).to_string(),
                    None => {
                        ctx.error_with_code(
                            "K-2-1",
                            format!("Command `{}` for macro `{}` failed", command, name),
                            span,
                        );
                        return;
                    }
                }
            }
            None => value,
        };

        tracing::debug!(name = %name, "define");
        if value.is_empty() {
            ctx.scopes.undefine(&name);
        } else {
            ctx.scopes.define(name, value);
        }
    }

    fn put(&mut self, ctx: &mut EvalContext, body: Body, span: SourceSpan) {
        let Body { key, fields, .. } = body;
        let (name, args) = match key {
            Some(key) => (key, fields),
            None => {
                let mut fields = fields.into_iter();
                (fields.next().unwrap_or_default(), fields.collect())
            }
        };
        if name.is_empty() {
            ctx.warn_or_error_with_code("K-3-4", "`put` needs a macro name", span);
            return;
        }

        let resolved = match ctx.scopes.find(&name) {
            Some(text) => Some(text.to_string()),
            None => {
                tracing::debug!(name = %name, args = ?args, "evaluating");
                self.engine.hooks.evaluator.evaluate(&name, &args)
            }
        };
        let Some(text) = resolved else {
            ctx.warn_or_error_with_code(
                "K-1-2",
                format!("Macro `{}` is neither defined nor known to the evaluator", name),
                span,
            );
            self.emit_str(&name);
            return;
        };
        if ctx.macro_depth >= ctx.max_macro_depth {
            let max = ctx.max_macro_depth;
            ctx.error_with_code(
                "K-2-4",
                format!("Expanding `{}` would nest macros more than {} deep", name, max),
                span,
            );
            return;
        }

        ctx.macro_depth += 1;
        let previous = ctx.enter_nested(span);
        let expanded = self
            .engine
            .expand_in(ctx, text.as_bytes(), self.values, self.include_depth);
        ctx.leave_nested(previous);
        ctx.macro_depth -= 1;
        self.emit_str(&expanded);
    }

    /// Resolve, expand and trim an include. `None` after reporting a failure.
    fn include(&mut self, ctx: &mut EvalContext, name: &str, span: SourceSpan) -> Option<String> {
        if self.include_depth >= ctx.max_include_depth {
            let max = ctx.max_include_depth;
            ctx.error_with_code(
                "K-2-3",
                format!("Including `{}` would nest includes more than {} deep", name, max),
                span,
            );
            return None;
        }
        tracing::debug!(name, depth = self.include_depth, "including");
        let Some(text) = self.engine.hooks.includer.include(name) else {
            ctx.error_with_code("K-2-2", format!("Include file `{}` not found", name), span);
            return None;
        };

        let previous = ctx.enter_nested(span);
        let expanded =
            self.engine
                .expand_in(ctx, text.as_bytes(), self.values, self.include_depth + 1);
        ctx.leave_nested(previous);
        Some(trim(&expanded).to_string())
    }

    fn jsx(&mut self, ctx: &mut EvalContext, fields: &[String], span: SourceSpan) {
        let path = fields.first().map_or("", String::as_str);
        let Some(var) = fields.get(1).map(|s| trim(s)).filter(|s| !s.is_empty()) else {
            ctx.warn_or_error_with_code("K-3-4", "`jsx` needs a variable name", span);
            return;
        };
        if let Some(text) = self.include(ctx, path, span) {
            self.emit_str(&format!("let {} = ({})", var, text));
        }
    }

    fn bare_directive(&mut self, ctx: &mut EvalContext, start: usize, body_start: usize) {
        let src = self.src;
        let engine = self.engine;
        let active = self.conditions.is_active();
        tracing::trace!(at = start, "value directive");

        // `{{.<name>}}` is a full include.
        if src.get(body_start) == Some(&b'<') {
            let (name, next) = scan_literal(src, body_start + 1, src.len(), b'>');
            if src[next..].starts_with(b">}}") {
                self.pos = next + 3;
                if active {
                    let span = ctx.span(start, self.pos);
                    if let Some(text) = self.include(ctx, &lossy(&name), span) {
                        self.emit_str(&text);
                    }
                }
                return;
            }
        }

        let scanner = ArgScanner::new(&engine.hooks, active, start);
        let spec = ArgSpec {
            separators: b"",
            stops: b"}",
            lookup: Some(Lookup {
                values: self.values,
                miss: MissPolicy::Blank,
            }),
        };
        let (fields, next) = scanner.scan(ctx, src, body_start, &spec);
        self.pos = next;
        self.close_directive(ctx, start);

        let value = fields.first().map(|f| lossy(f)).unwrap_or_default();
        if engine.html_mode {
            self.emit_str(&html_encode(&value, true));
        } else {
            self.emit_str(&value);
        }
    }

    fn end_block(&mut self, ctx: &mut EvalContext, span: SourceSpan) {
        match self.conditions.end() {
            Ok(()) => {
                self.open_ifs.pop();
            }
            Err(err) => report_condition(ctx, err, span),
        }
    }

    /// `&x...;` emits `x...` verbatim. Without a `;` on the same line the
    /// `&` and the byte after it are emitted as they are.
    fn escape(&mut self) {
        let src = self.src;
        let body = self.pos + 1;
        let rest = &src[body..];
        match rest.iter().position(|&b| b == b';' || b == b'\n') {
            Some(i) if rest[i] == b';' => {
                self.emit(&rest[..i]);
                self.pos = body + i + 1;
            }
            _ => {
                self.emit(&src[self.pos..=body]);
                self.pos = body + 1;
            }
        }
    }

    fn skip_comment_byte(&mut self) {
        let rest = &self.src[self.pos..];
        if rest.starts_with(b"{{") {
            self.comment_depth += 1;
            self.pos += 2;
        } else if rest.starts_with(b"}}") {
            self.comment_depth -= 1;
            self.pos += 2;
        } else {
            self.pos += 1;
        }
    }

    fn eat_newline(&mut self) {
        self.pos += line_terminator_len(self.src, self.pos);
    }

    fn emit(&mut self, bytes: &[u8]) {
        if self.conditions.is_active() {
            self.out.extend(bytes);
        }
    }

    fn emit_str(&mut self, text: &str) {
        self.emit(text.as_bytes());
    }
}

fn report_condition(ctx: &mut EvalContext, err: ConditionError, span: SourceSpan) {
    ctx.warn_or_error_with_code("K-3-2", err.to_string(), span);
}

/// Split `name=value` or `name value` captured without a `.name` key.
fn split_definition(raw: &str) -> (String, String) {
    let raw = trim(raw);
    match raw.find(|c: char| c == '=' || c.is_ascii_whitespace()) {
        Some(i) => {
            let rest = raw[i..].trim_start();
            let rest = rest.strip_prefix('=').unwrap_or(rest);
            (raw[..i].to_string(), rest.trim_start().to_string())
        }
        None => (raw.to_string(), String::new()),
    }
}

/// The command inside a back-tick wrapped definition value.
fn command_text(value: &str) -> Option<&str> {
    trim(value)
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
}
