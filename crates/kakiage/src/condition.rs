/*
 * condition.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional block state.
//!
//! One [`Branch`] per open `if`/`ifn`. Output is emitted only while every
//! open branch is [`BranchState::Active`]; an empty stack emits.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    /// The current arm is selected.
    Active,
    /// No arm of this chain has been selected yet.
    Pending,
    /// An earlier arm was selected; the rest of the chain is skipped.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub state: BranchState,
    pub seen_else: bool,
}

/// Misplaced `elif`/`else`/`end`. The stack is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("`else` without a matching `if`")]
    ElseWithoutIf,
    #[error("`else` after `else` in the same conditional")]
    ElseAfterElse,
    #[error("`elif` without a matching `if`")]
    ElifWithoutIf,
    #[error("`elif` after `else` in the same conditional")]
    ElifAfterElse,
    #[error("`end` without a matching `if`")]
    EndWithoutIf,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionStack {
    branches: Vec<Branch>,
}

impl ConditionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a conditional block.
    pub fn push_if(&mut self, predicate: bool) {
        let state = if predicate {
            BranchState::Active
        } else {
            BranchState::Pending
        };
        self.branches.push(Branch {
            state,
            seen_else: false,
        });
    }

    /// Move to the next arm, selecting it when `predicate` holds and no
    /// earlier arm was selected.
    pub fn elif(&mut self, predicate: bool) -> Result<(), ConditionError> {
        let top = self
            .branches
            .last_mut()
            .ok_or(ConditionError::ElifWithoutIf)?;
        if top.seen_else {
            return Err(ConditionError::ElifAfterElse);
        }
        top.state = match top.state {
            BranchState::Active | BranchState::Done => BranchState::Done,
            BranchState::Pending if predicate => BranchState::Active,
            BranchState::Pending => BranchState::Pending,
        };
        Ok(())
    }

    /// Move to the `else` arm.
    pub fn else_branch(&mut self) -> Result<(), ConditionError> {
        let top = self
            .branches
            .last_mut()
            .ok_or(ConditionError::ElseWithoutIf)?;
        if top.seen_else {
            return Err(ConditionError::ElseAfterElse);
        }
        top.seen_else = true;
        top.state = match top.state {
            BranchState::Pending => BranchState::Active,
            BranchState::Active | BranchState::Done => BranchState::Done,
        };
        Ok(())
    }

    /// Close the innermost conditional block.
    pub fn end(&mut self) -> Result<(), ConditionError> {
        self.branches
            .pop()
            .map(|_| ())
            .ok_or(ConditionError::EndWithoutIf)
    }

    /// Whether output is currently emitted.
    pub fn is_active(&self) -> bool {
        self.branches.iter().all(|b| b.state == BranchState::Active)
    }

    /// Whether an `elif` at this point would evaluate its predicate: the
    /// enclosing blocks emit and no arm of the innermost chain was selected.
    pub fn elif_would_evaluate(&self) -> bool {
        match self.branches.split_last() {
            Some((top, outer)) => {
                top.state == BranchState::Pending
                    && !top.seen_else
                    && outer.iter().all(|b| b.state == BranchState::Active)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_stack_emits() {
        let mut stack = ConditionStack::new();
        assert!(stack.is_active());
        assert_eq!(stack.end(), Err(ConditionError::EndWithoutIf));
    }

    #[test]
    fn test_if_else_end() {
        let mut stack = ConditionStack::new();
        stack.push_if(false);
        assert!(!stack.is_active());
        stack.else_branch().unwrap();
        assert!(stack.is_active());
        stack.end().unwrap();
        assert!(stack.is_active());
        assert_eq!(stack.end(), Err(ConditionError::EndWithoutIf));
    }

    #[test]
    fn test_first_true_wins() {
        let mut stack = ConditionStack::new();
        stack.push_if(false);
        stack.elif(true).unwrap();
        assert!(stack.is_active());
        stack.elif(true).unwrap();
        assert!(!stack.is_active());
        stack.else_branch().unwrap();
        assert!(!stack.is_active());
    }

    #[test]
    fn test_true_if_suppresses_else() {
        let mut stack = ConditionStack::new();
        stack.push_if(true);
        stack.else_branch().unwrap();
        assert!(!stack.is_active());
    }

    #[test]
    fn test_nested_blocks_and_together() {
        let mut stack = ConditionStack::new();
        stack.push_if(false);
        stack.push_if(true);
        assert!(!stack.is_active());
        assert!(!stack.elif_would_evaluate());
        stack.end().unwrap();
        stack.else_branch().unwrap();
        stack.push_if(true);
        assert!(stack.is_active());
    }

    #[test]
    fn test_elif_would_evaluate() {
        let mut stack = ConditionStack::new();
        assert!(!stack.elif_would_evaluate());
        stack.push_if(false);
        assert!(stack.elif_would_evaluate());
        stack.elif(true).unwrap();
        assert!(!stack.elif_would_evaluate());
    }

    #[test]
    fn test_mismatches_leave_stack_unchanged() {
        let mut stack = ConditionStack::new();
        assert_eq!(stack.else_branch(), Err(ConditionError::ElseWithoutIf));
        assert_eq!(stack.elif(true), Err(ConditionError::ElifWithoutIf));
        assert_eq!(stack.end(), Err(ConditionError::EndWithoutIf));

        stack.push_if(false);
        stack.else_branch().unwrap();
        assert_eq!(stack.else_branch(), Err(ConditionError::ElseAfterElse));
        assert_eq!(stack.elif(true), Err(ConditionError::ElifAfterElse));
        assert!(stack.is_active());
        stack.end().unwrap();
        assert_eq!(stack.end(), Err(ConditionError::EndWithoutIf));
    }
}
