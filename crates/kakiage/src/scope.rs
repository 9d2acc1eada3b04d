/*
 * scope.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Macro scopes.
//!
//! Every expansion call owns one frame. Lookups walk the frames from the
//! innermost outward, so a macro defined by a caller is visible to the
//! includes and macro bodies it expands, but never to a sibling call made
//! after it returns.

use std::collections::HashMap;

/// One expansion call's macro definitions.
pub type MacroFrame = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<MacroFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self) {
        self.frames.push(MacroFrame::new());
    }

    pub fn pop_frame(&mut self) -> Option<MacroFrame> {
        self.frames.pop()
    }

    /// Number of live frames, equal to the current expansion nesting.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Look a macro up, innermost frame first.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .map(String::as_str)
    }

    /// Define `name` in the innermost frame. Without a frame this is a no-op.
    pub fn define(&mut self, name: impl Into<String>, body: impl Into<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), body.into());
        }
    }

    /// Remove `name` from the innermost frame only.
    pub fn undefine(&mut self, name: &str) -> Option<String> {
        self.frames.last_mut().and_then(|frame| frame.remove(name))
    }
}
