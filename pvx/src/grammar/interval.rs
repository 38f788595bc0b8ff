//! Interval clauses: `ALL`, `AFTER`, `BEFORE`, `NOT AFTER`, `NOT BEFORE`.

use super::cursor::TokenCursor;
use super::datetime::{parse_clause, ParseContext};
use crate::error::GrammarError;
use crate::interval::TimeInterval;

/// Accumulates interval clauses for one command.
///
/// Starts absent; becomes "everything" on `ALL`, or gains up to one lower and
/// one upper bound. `ALL` and explicit bounds exclude each other.
#[derive(Debug, Default)]
pub struct IntervalGrammar {
    interval: Option<TimeInterval>,
}

impl IntervalGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to consume an interval clause starting with `word` (already uppercased).
    ///
    /// Returns `Ok(false)` without consuming anything when `word` does not
    /// start an interval clause.
    pub fn accept(
        &mut self,
        word: &str,
        cursor: &mut TokenCursor,
        ctx: &ParseContext,
    ) -> Result<bool, GrammarError> {
        match word {
            "ALL" => {
                if self.interval.is_some() {
                    return Err(GrammarError::Duplicate("ALL".to_string()));
                }
                self.interval = Some(TimeInterval::everything());
            }
            "NOT" => {
                let next = cursor.next("NOT")?.to_uppercase();
                match next.as_str() {
                    "AFTER" => self.bound(Clause::NotAfter, cursor, ctx)?,
                    "BEFORE" => self.bound(Clause::NotBefore, cursor, ctx)?,
                    _ => {
                        return Err(GrammarError::Syntax(format!(
                            "NOT must be followed by AFTER or BEFORE, found '{}'",
                            next
                        )))
                    }
                }
            }
            "AFTER" => self.bound(Clause::After, cursor, ctx)?,
            "BEFORE" => self.bound(Clause::Before, cursor, ctx)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn bound(
        &mut self,
        clause: Clause,
        cursor: &mut TokenCursor,
        ctx: &ParseContext,
    ) -> Result<(), GrammarError> {
        let current = self.interval.unwrap_or_default();
        let taken = if current.all {
            true
        } else if clause.is_lower() {
            current.lower.is_some()
        } else {
            current.upper.is_some()
        };
        if taken {
            return Err(GrammarError::Duplicate(clause.slot().to_string()));
        }

        let at = parse_clause(cursor, clause.keyword(), ctx)?;
        self.interval = Some(match clause {
            Clause::After => current.after(at),
            Clause::NotBefore => current.not_before(at),
            Clause::Before => current.before(at),
            Clause::NotAfter => current.not_after(at),
        });
        Ok(())
    }

    /// The resolved interval; None when no interval clause was given.
    pub fn finish(self) -> Option<TimeInterval> {
        self.interval
    }
}

#[derive(Debug, Clone, Copy)]
enum Clause {
    After,
    NotBefore,
    Before,
    NotAfter,
}

impl Clause {
    fn is_lower(self) -> bool {
        matches!(self, Clause::After | Clause::NotBefore)
    }

    fn keyword(self) -> &'static str {
        match self {
            Clause::After => "AFTER",
            Clause::NotBefore => "NOT BEFORE",
            Clause::Before => "BEFORE",
            Clause::NotAfter => "NOT AFTER",
        }
    }

    fn slot(self) -> &'static str {
        if self.is_lower() {
            "interval start (AFTER / NOT BEFORE)"
        } else {
            "interval stop (BEFORE / NOT AFTER)"
        }
    }
}
