//! Local point-value store kept in a DuckDB database file.
//!
//! Tables:
//! - `points(uuid, name, synced)` - the point catalog; names are unique per store
//! - `point_values(point, stamp, version, value)` - one row per (point, stamp);
//!   stamps and versions are microseconds since the epoch, values are JSON text
//! - `users(name, password_hash)` - optional login accounts

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use duckdb::{params, params_from_iter, types::Value, Connection};
use uuid::Uuid;

use super::{Credentials, SessionProvider, StoreSession, ValuesIter, ValuesQuery};
use crate::interval::Bound;
use crate::schema::{PointRef, PointValue, Version};
use crate::{Config, Error, Result};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS points (
    uuid VARCHAR PRIMARY KEY,
    name VARCHAR,
    synced BOOLEAN NOT NULL DEFAULT FALSE
);
CREATE TABLE IF NOT EXISTS point_values (
    point VARCHAR NOT NULL,
    stamp BIGINT NOT NULL,
    version BIGINT NOT NULL,
    value VARCHAR NOT NULL,
    PRIMARY KEY (point, stamp)
);
CREATE TABLE IF NOT EXISTS users (
    name VARCHAR PRIMARY KEY,
    password_hash VARCHAR
);
"#;

/// Create an empty store database at `path`.
pub fn initialize(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::AlreadyInitialized(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA_SQL)?;
    tracing::debug!("Initialized store at {}", path.display());
    Ok(())
}

/// Digest stored for a user's password.
pub fn hash_password(user: &str, password: &str) -> String {
    blake3::hash(format!("{}:{}", user, password).as_bytes())
        .to_hex()
        .to_string()
}

/// Opens sessions on local stores named through a [`Config`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    config: Config,
}

impl LocalStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Database path for a store name.
    pub fn path(&self, target: &str) -> PathBuf {
        self.config.store_path(target)
    }

    /// Create an empty store.
    pub fn create(&self, target: &str) -> Result<PathBuf> {
        let path = self.path(target);
        initialize(&path)?;
        Ok(path)
    }

    /// Open a store without checking credentials, for administration.
    pub fn open_admin(&self, target: &str) -> Result<LocalSession> {
        let path = self.path(target);
        if !path.exists() {
            return Err(Error::Connect(format!(
                "store '{}' not found at {}",
                target,
                path.display()
            )));
        }
        let conn = Connection::open(&path).map_err(|e| {
            Error::Connect(format!("cannot open store '{}': {}", target, e))
        })?;
        Ok(LocalSession::new(conn, target, &self.config))
    }
}

impl SessionProvider for LocalStore {
    type Session = LocalSession;

    fn connect(&self, target: &str, credentials: &Credentials) -> Result<LocalSession> {
        let session = self.open_admin(target)?;
        session.authenticate(credentials)?;
        tracing::info!(
            store = target,
            client = %self.config.client_id,
            user = credentials.user.as_deref().unwrap_or("-"),
            "Connected"
        );
        Ok(session)
    }
}

/// A session on a local store.
pub struct LocalSession {
    conn: Connection,
    name: String,
    batch_size: usize,
    known_points: HashSet<Uuid>,
    last_version: Option<i64>,
}

impl LocalSession {
    fn new(conn: Connection, name: &str, config: &Config) -> Self {
        Self {
            conn,
            name: name.to_string(),
            batch_size: config.batch_size.max(1),
            known_points: HashSet::new(),
            last_version: None,
        }
    }

    fn authenticate(&self, credentials: &Credentials) -> Result<()> {
        let users: i64 = self
            .conn
            .query_row("SELECT count(*) FROM users", [], |row| row.get(0))?;
        if users == 0 {
            return Ok(());
        }

        let user = credentials
            .user
            .as_deref()
            .ok_or_else(|| Error::Connect(format!("store '{}' requires a USER", self.name)))?;

        let mut stmt = self
            .conn
            .prepare("SELECT password_hash FROM users WHERE name = ?")?;
        let hashes: Vec<Option<String>> = stmt
            .query_map(params![user], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        let accepted = match (hashes.first(), credentials.password.as_deref()) {
            (None, _) => false,
            (Some(None), password) => password.is_none(),
            (Some(Some(_)), None) => false,
            (Some(Some(hash)), Some(password)) => *hash == hash_password(user, password),
        };
        if !accepted {
            return Err(Error::Connect(format!(
                "authentication failed for user '{}'",
                user
            )));
        }
        Ok(())
    }

    /// Add or replace a login account. A None password allows login without one.
    pub fn set_user(&self, user: &str, password: Option<&str>) -> Result<()> {
        let hash = password.map(|p| hash_password(user, p));
        self.conn.execute(
            "INSERT OR REPLACE INTO users (name, password_hash) VALUES (?, ?)",
            params![user, hash],
        )?;
        Ok(())
    }

    /// Register a point in the catalog.
    pub fn register_point(&mut self, point: &PointRef, synced: bool) -> Result<()> {
        if let Some(name) = &point.name {
            if let Ok(existing) = self.resolve_by_name(name) {
                if existing.uuid != point.uuid {
                    return Err(Error::Storage(format!(
                        "point name '{}' already belongs to {}",
                        name, existing.uuid
                    )));
                }
            }
        }
        self.conn.execute(
            "INSERT INTO points (uuid, name, synced) VALUES (?, ?, ?) \
             ON CONFLICT (uuid) DO UPDATE SET name = excluded.name, synced = excluded.synced",
            params![point.uuid.to_string(), point.name, synced],
        )?;
        self.known_points.insert(point.uuid);
        Ok(())
    }

    /// Make sure a submitted value's point exists, registering it unsynced if not.
    fn ensure_point(&mut self, point: &PointRef) -> Result<()> {
        if self.known_points.contains(&point.uuid) {
            return Ok(());
        }
        if self.resolve_by_uuid(point.uuid).is_err() {
            let name_free = match &point.name {
                Some(name) => self.resolve_by_name(name).is_err(),
                None => true,
            };
            let registered = if name_free {
                point.clone()
            } else {
                tracing::warn!(
                    "Point name {:?} is taken; registering {} without a name",
                    point.name,
                    point.uuid
                );
                PointRef::new(point.uuid, None)
            };
            self.register_point(&registered, false)?;
        }
        self.known_points.insert(point.uuid);
        Ok(())
    }

    /// Next version: the current time, but always past the last one handed out.
    fn next_version(&mut self) -> Result<i64> {
        let last = match self.last_version {
            Some(last) => last,
            None => self.conn.query_row(
                "SELECT coalesce(max(version), 0) FROM point_values",
                [],
                |row| row.get(0),
            )?,
        };
        let version = Utc::now().timestamp_micros().max(last + 1);
        self.last_version = Some(version);
        Ok(version)
    }

    fn points_where(&self, clause: &str, param: String) -> Result<Vec<PointRef>> {
        let sql = format!("SELECT uuid, name FROM points {} ORDER BY name, uuid", clause);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if clause.is_empty() {
            stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![param], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
        };

        rows.into_iter()
            .map(|(uuid, name)| Ok(PointRef::new(parse_uuid(&uuid)?, name)))
            .collect()
    }
}

impl StoreSession for LocalSession {
    fn resolve_by_name(&self, name: &str) -> Result<PointRef> {
        self.points_where("WHERE name = ?", name.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| Error::PointNotFound(name.to_string()))
    }

    fn resolve_by_uuid(&self, uuid: Uuid) -> Result<PointRef> {
        self.points_where("WHERE uuid = ?", uuid.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| Error::PointNotFound(uuid.to_string()))
    }

    fn resolve_all(&self) -> Result<Vec<PointRef>> {
        self.points_where("", String::new())
    }

    fn query(&self, query: &ValuesQuery) -> Result<ValuesIter<'_>> {
        Ok(Box::new(ValuesCursor::new(
            &self.conn,
            query.clone(),
            self.batch_size,
        )))
    }

    fn submit(&mut self, value: &PointValue) -> Result<Version> {
        self.ensure_point(&value.point)?;
        let version = self.next_version()?;
        let payload = serde_json::to_string(&value.value)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO point_values (point, stamp, version, value) VALUES (?, ?, ?, ?)",
            params![
                value.point.uuid.to_string(),
                value.stamp.timestamp_micros(),
                version,
                payload
            ],
        )?;
        from_micros(version)
    }

    fn logout(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Store(e))?;
        tracing::debug!(store = %self.name, "Logged out");
        Ok(())
    }
}

/// Pages through query results, `batch_size` rows per round trip.
struct ValuesCursor<'a> {
    conn: &'a Connection,
    query: ValuesQuery,
    batch_size: usize,
    pending: VecDeque<PointValue>,
    /// Ordering key and point of the last row fetched.
    after: Option<(i64, String)>,
    exhausted: bool,
}

impl<'a> ValuesCursor<'a> {
    fn new(conn: &'a Connection, query: ValuesQuery, batch_size: usize) -> Self {
        Self {
            conn,
            query,
            batch_size,
            pending: VecDeque::new(),
            after: None,
            exhausted: false,
        }
    }

    fn fetch(&mut self) -> Result<()> {
        let key = if self.query.pull { "v.version" } else { "v.stamp" };
        let mut sql = String::from(
            "SELECT v.point, p.name, v.stamp, v.version, v.value \
             FROM point_values v JOIN points p ON p.uuid = v.point WHERE TRUE",
        );
        let mut args: Vec<Value> = Vec::new();

        if let Some(point) = &self.query.point {
            sql.push_str(" AND v.point = ?");
            args.push(Value::Text(point.uuid.to_string()));
        }
        if self.query.synced {
            sql.push_str(" AND p.synced");
        }
        if let Some(Bound { at, inclusive }) = self.query.interval.lower {
            sql.push_str(&format!(" AND {} {} ?", key, if inclusive { ">=" } else { ">" }));
            args.push(Value::BigInt(at.timestamp_micros()));
        }
        if let Some(Bound { at, inclusive }) = self.query.interval.upper {
            sql.push_str(&format!(" AND {} {} ?", key, if inclusive { "<=" } else { "<" }));
            args.push(Value::BigInt(at.timestamp_micros()));
        }
        if let Some((last_key, last_point)) = &self.after {
            sql.push_str(&format!(
                " AND ({key} > ? OR ({key} = ? AND v.point > ?))",
                key = key
            ));
            args.push(Value::BigInt(*last_key));
            args.push(Value::BigInt(*last_key));
            args.push(Value::Text(last_point.clone()));
        }
        sql.push_str(&format!(" ORDER BY {}, v.point LIMIT {}", key, self.batch_size));

        let conn = self.conn;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if rows.len() < self.batch_size {
            self.exhausted = true;
        }

        for (point, name, stamp, version, payload) in rows {
            let order_key = if self.query.pull { version } else { stamp };
            self.after = Some((order_key, point.clone()));
            self.pending.push_back(PointValue {
                point: PointRef::new(parse_uuid(&point)?, name),
                stamp: from_micros(stamp)?,
                value: serde_json::from_str(&payload)?,
                version: Some(from_micros(version)?),
            });
        }
        Ok(())
    }
}

impl Iterator for ValuesCursor<'_> {
    type Item = Result<PointValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.pending.pop_front().map(Ok)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Storage(format!("invalid point UUID '{}': {}", s, e)))
}

fn from_micros(micros: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| Error::Storage(format!("invalid timestamp {}", micros)))
}
