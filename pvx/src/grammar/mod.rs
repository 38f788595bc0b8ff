//! Keyword grammar shared by the dump and load tools.
//!
//! # Syntax Overview
//!
//! Tokens are keywords (matched case-insensitively) and their arguments, in
//! any order, each keyword at most once:
//!
//! - **Settings**: `WITH <resource>`, `FROM <x>`, `INTO <x>`, `USER <id>`, `PASSWORD <pw>`
//! - **Point**: `POINT <name|uuid>`, with optional `PULL` and `SYNCED` flags
//! - **Interval**: `ALL`, or `[AFTER|NOT BEFORE <t>] [BEFORE|NOT AFTER <t>]`
//! - **Date-time**: an absolute literal, or `-<elapsed>` meaning "now minus elapsed"

mod command;
mod cursor;
mod datetime;
mod interval;

pub use command::{is_help, parse_command, Command, Keyword, Tool};
pub use cursor::TokenCursor;
pub use datetime::{parse_clause, parse_date_time, parse_elapsed, ParseContext, Zone};
pub use interval::IntervalGrammar;

#[cfg(test)]
mod tests;
