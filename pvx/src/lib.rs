//! PVX: Point Value eXchange
//!
//! Keyword grammar, time intervals and streaming dump/load of point values
//! between a store session and files.

pub mod codec;
pub mod config;
pub mod error;
pub mod grammar;
pub mod interval;
pub mod pipeline;
pub mod schema;
pub mod store;

pub use codec::{TransferSummary, ValuesReader, ValuesWriter};
pub use config::Config;
pub use error::{Error, GrammarError, Result};
pub use grammar::{is_help, parse_command, Command, Keyword, ParseContext, Tool, Zone};
pub use interval::{Bound, TimeInterval};
pub use pipeline::{export, import};
pub use schema::{PointRef, PointSelector, PointValue, Version};
pub use store::{Credentials, LocalSession, LocalStore, SessionProvider, StoreSession, ValuesQuery};
