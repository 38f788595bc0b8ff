//! Store sessions - the seam between the pipeline and a point-value store.
//!
//! The pipeline only talks to [`SessionProvider`] and [`StoreSession`].
//! [`LocalStore`] implements them over a DuckDB database file.

mod local;

use std::fmt;

use uuid::Uuid;

use crate::interval::TimeInterval;
use crate::schema::{PointRef, PointSelector, PointValue, Version};
use crate::Result;

pub use local::{hash_password, initialize, LocalSession, LocalStore};

/// Optional login credentials.
///
/// "Not supplied" (None) and "supplied empty" (Some("")) are distinct.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(user: Option<String>, password: Option<String>) -> Self {
        Self { user, password }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A range query over stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesQuery {
    /// None selects every point.
    pub point: Option<PointRef>,
    /// Applies to value stamps, or to versions in pull mode.
    pub interval: TimeInterval,
    /// Return values by version order, filtering the interval on versions.
    pub pull: bool,
    /// Keep only values of points marked as synced.
    pub synced: bool,
}

/// Lazily fetched query results.
pub type ValuesIter<'a> = Box<dyn Iterator<Item = Result<PointValue>> + 'a>;

/// Opens store sessions.
pub trait SessionProvider {
    type Session: StoreSession;

    /// Connect to the named store. Failures are `Error::Connect`.
    fn connect(&self, target: &str, credentials: &Credentials) -> Result<Self::Session>;
}

/// An authenticated session on a store.
pub trait StoreSession {
    /// Resolve a point by name; `Error::PointNotFound` when unknown.
    fn resolve_by_name(&self, name: &str) -> Result<PointRef>;

    /// Resolve a point by UUID; `Error::PointNotFound` when unknown.
    fn resolve_by_uuid(&self, uuid: Uuid) -> Result<PointRef>;

    /// Every point known to the store.
    fn resolve_all(&self) -> Result<Vec<PointRef>>;

    /// Run a range query.
    fn query(&self, query: &ValuesQuery) -> Result<ValuesIter<'_>>;

    /// Store one value, returning the version assigned to it.
    fn submit(&mut self, value: &PointValue) -> Result<Version>;

    /// End the session.
    fn logout(self) -> Result<()>
    where
        Self: Sized;

    /// Resolve a selector; None for all points.
    fn resolve(&self, selector: &PointSelector) -> Result<Option<PointRef>> {
        match selector {
            PointSelector::Name(name) => self.resolve_by_name(name).map(Some),
            PointSelector::Uuid(uuid) => self.resolve_by_uuid(*uuid).map(Some),
            PointSelector::All => Ok(None),
        }
    }
}
