//! Time intervals selected by `ALL`, `AFTER`, `BEFORE`, `NOT AFTER` and `NOT BEFORE`.

use std::fmt;

use chrono::{DateTime, Utc};

/// One end of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub at: DateTime<Utc>,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(at: DateTime<Utc>) -> Self {
        Self { at, inclusive: true }
    }

    pub fn exclusive(at: DateTime<Utc>) -> Self {
        Self { at, inclusive: false }
    }
}

/// A resolved time interval.
///
/// A missing bound is unbounded on that side. `all` records that the
/// interval was requested with `ALL`; such an interval never has bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeInterval {
    /// Lower bound (None = unbounded past).
    pub lower: Option<Bound>,
    /// Upper bound (None = unbounded future).
    pub upper: Option<Bound>,
    /// Set by `ALL`.
    pub all: bool,
}

impl TimeInterval {
    /// The interval matching every timestamp, as selected by `ALL`.
    pub fn everything() -> Self {
        Self {
            lower: None,
            upper: None,
            all: true,
        }
    }

    /// `AFTER t`
    pub fn after(mut self, at: DateTime<Utc>) -> Self {
        self.lower = Some(Bound::exclusive(at));
        self
    }

    /// `NOT BEFORE t`
    pub fn not_before(mut self, at: DateTime<Utc>) -> Self {
        self.lower = Some(Bound::inclusive(at));
        self
    }

    /// `BEFORE t`
    pub fn before(mut self, at: DateTime<Utc>) -> Self {
        self.upper = Some(Bound::exclusive(at));
        self
    }

    /// `NOT AFTER t`
    pub fn not_after(mut self, at: DateTime<Utc>) -> Self {
        self.upper = Some(Bound::inclusive(at));
        self
    }

    /// Check if this interval has no bound on either side.
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Check if a timestamp falls inside the interval.
    pub fn contains(&self, stamp: DateTime<Utc>) -> bool {
        let above = match self.lower {
            None => true,
            Some(Bound { at, inclusive: true }) => stamp >= at,
            Some(Bound { at, inclusive: false }) => stamp > at,
        };
        let below = match self.upper {
            None => true,
            Some(Bound { at, inclusive: true }) => stamp <= at,
            Some(Bound { at, inclusive: false }) => stamp < at,
        };
        above && below
    }

    /// Check if no timestamp can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => {
                lower.at > upper.at
                    || (lower.at == upper.at && !(lower.inclusive && upper.inclusive))
            }
            _ => false,
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            return write!(f, "(all)");
        }
        match self.lower {
            Some(b) if b.inclusive => write!(f, "[{}", b.at.to_rfc3339())?,
            Some(b) => write!(f, "({}", b.at.to_rfc3339())?,
            None => write!(f, "(")?,
        }
        write!(f, ", ")?;
        match self.upper {
            Some(b) if b.inclusive => write!(f, "{}]", b.at.to_rfc3339()),
            Some(b) => write!(f, "{})", b.at.to_rfc3339()),
            None => write!(f, ")"),
        }
    }
}
