//! Scheduled functions and their equation bodies.

use crate::gridfn::Centering;
use briar_expr::Expr;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One statement in a scheduled function body.
#[derive(Clone, Debug)]
pub enum Stmt {
    /// Assign the right hand side to a grid-function component.
    Assign { lhs: Expr, rhs: Expr },
    /// End the current tile loop. Statements after the split see the
    /// completed values of temporaries written before it.
    SplitLoop,
}

impl Stmt {
    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Stmt::Assign { lhs, rhs }
    }
}

/// Where a scheduled function iterates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationDomain {
    Everywhere,
    Interior,
}

/// Placement of a function in the host scheduler: a bin, plus the
/// phases it must run after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleBin {
    pub bin: String,
    pub after: Vec<String>,
}

impl ScheduleBin {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            after: Vec::new(),
        }
    }

    pub fn after(mut self, phase: impl Into<String>) -> Self {
        self.after.push(phase.into());
        self
    }
}

impl fmt::Display for ScheduleBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bin)?;

        for phase in &self.after {
            write!(f, " AFTER {}", phase)?;
        }

        Ok(())
    }
}

/// A function registered with the host scheduler.
#[derive(Clone, Debug)]
pub struct ThornFunction {
    pub name: String,
    pub body: Vec<Stmt>,
    pub domain: IterationDomain,
    pub schedule: ScheduleBin,
    pub doc: String,
    pub centering: Centering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_bin_renders_ordering_deps() {
        let bin = ScheduleBin::new("initial").after("ADMBase_PostInitial");
        assert_eq!(bin.to_string(), "initial AFTER ADMBase_PostInitial");

        let chained = ScheduleBin::new("initial").after("A").after("B");
        assert_eq!(chained.to_string(), "initial AFTER A AFTER B");
    }
}
