//! Tests for the command and interval grammars.

use super::*;
use crate::error::GrammarError;
use crate::interval::{Bound, TimeInterval};
use crate::schema::PointSelector;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::PathBuf;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

fn ctx() -> ParseContext {
    ParseContext::utc(now())
}

fn dump(tokens: &[&str]) -> Result<Command, GrammarError> {
    parse_command(Tool::Export, tokens.iter().copied(), &ctx())
}

fn load(tokens: &[&str]) -> Result<Command, GrammarError> {
    parse_command(Tool::Import, tokens.iter().copied(), &ctx())
}

fn interval(tokens: &[&str]) -> TimeInterval {
    dump(tokens).unwrap().interval.unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, h, m, 0).unwrap()
}

// Scenarios

#[test]
fn test_point_after_relative() {
    let cmd = dump(&["POINT", "Tank1.Level", "AFTER", "-1:00:00"]).unwrap();
    assert_eq!(cmd.point, PointSelector::Name("Tank1.Level".to_string()));
    assert!(!cmd.pull);
    assert!(!cmd.synced);
    let interval = cmd.interval.unwrap();
    assert_eq!(interval.lower, Some(Bound::exclusive(at(11, 0))));
    assert_eq!(interval.upper, None);
}

#[test]
fn test_load_gzip_source() {
    let cmd = load(&["FROM", "snapshot.xml.gz"]).unwrap();
    assert_eq!(cmd.tool, Tool::Import);
    assert_eq!(cmd.path, Some(PathBuf::from("snapshot.xml.gz")));
    assert_eq!(cmd.store, None);
    assert!(crate::pipeline::is_gzip(cmd.path.as_deref().unwrap()));
}

#[test]
fn test_load_requires_from() {
    assert!(matches!(load(&[]), Err(GrammarError::Syntax(_))));
    assert!(matches!(load(&["INTO", "Store"]), Err(GrammarError::Syntax(_))));
}

#[test]
fn test_empty_dump_selects_everything() {
    let cmd = dump(&[]).unwrap();
    assert_eq!(cmd.point, PointSelector::All);
    assert!(cmd.pull);
    assert!(!cmd.synced);
    assert_eq!(cmd.interval, None);
    assert!(cmd.effective_interval().is_unbounded());
    assert_eq!(cmd.path, None);
    assert_eq!(cmd.store, None);
}

// Bounds

#[test]
fn test_after_is_exclusive_lower() {
    let i = interval(&["AFTER", "2024-01-01T10:00Z"]);
    assert_eq!(i.lower, Some(Bound::exclusive(at(10, 0))));
    assert!(!i.contains(at(10, 0)));
    assert!(i.contains(at(10, 1)));
}

#[test]
fn test_not_before_is_inclusive_lower() {
    let i = interval(&["NOT", "BEFORE", "2024-01-01T10:00Z"]);
    assert_eq!(i.lower, Some(Bound::inclusive(at(10, 0))));
    assert!(i.contains(at(10, 0)));
}

#[test]
fn test_upper_bounds() {
    let i = interval(&["BEFORE", "2024-01-01T10:00Z"]);
    assert_eq!(i.upper, Some(Bound::exclusive(at(10, 0))));

    let i = interval(&["not", "after", "2024-01-01T10:00Z"]);
    assert_eq!(i.upper, Some(Bound::inclusive(at(10, 0))));
}

#[test]
fn test_both_bounds_any_order() {
    let a = interval(&["BEFORE", "2024-01-01T11:00Z", "AFTER", "2024-01-01T10:00Z"]);
    let b = interval(&["AFTER", "2024-01-01T10:00Z", "BEFORE", "2024-01-01T11:00Z"]);
    assert_eq!(a, b);
    assert!(a.contains(at(10, 30)));
    assert!(!a.contains(at(11, 0)));
}

#[test]
fn test_relative_bound_subtracts_from_now() {
    let d = Duration::minutes(90);
    let i = interval(&["AFTER", "-PT90M"]);
    assert_eq!(i.lower, Some(Bound::exclusive(now() - d)));

    let i = interval(&["NOT", "AFTER", "-1:30"]);
    assert_eq!(i.upper, Some(Bound::inclusive(now() - d)));
}

#[test]
fn test_two_token_date_time() {
    let i = interval(&["AFTER", "2024-01-01", "10:00Z", "POINT", "X"]);
    assert_eq!(i.lower, Some(Bound::exclusive(at(10, 0))));
}

#[test]
fn test_two_token_date_with_hour() {
    let i = interval(&["AFTER", "2024-01-01", "10"]);
    assert_eq!(i.lower, Some(Bound::exclusive(at(10, 0))));
}

#[test]
fn test_duplicate_bounds() {
    let cases: &[&[&str]] = &[
        &["AFTER", "-1:00", "AFTER", "-2:00"],
        &["AFTER", "-1:00", "NOT", "BEFORE", "-2:00"],
        &["BEFORE", "-1:00", "NOT", "AFTER", "-2:00"],
        &["NOT", "AFTER", "-1:00", "BEFORE", "-2:00"],
    ];
    for tokens in cases {
        assert!(
            matches!(dump(tokens), Err(GrammarError::Duplicate(_))),
            "{:?}",
            tokens
        );
    }
}

#[test]
fn test_all_matches_everything() {
    let i = interval(&["ALL"]);
    assert!(i.all);
    assert!(i.is_unbounded());
    assert!(i.contains(DateTime::<Utc>::MIN_UTC));
    assert!(i.contains(DateTime::<Utc>::MAX_UTC));
}

#[test]
fn test_all_conflicts_with_bounds() {
    for tokens in [
        &["ALL", "AFTER", "-1:00"][..],
        &["AFTER", "-1:00", "ALL"][..],
        &["NOT", "AFTER", "-1:00", "ALL"][..],
        &["ALL", "ALL"][..],
    ] {
        assert!(
            matches!(dump(tokens), Err(GrammarError::Duplicate(_))),
            "{:?}",
            tokens
        );
    }
}

#[test]
fn test_same_now_same_interval() {
    let tokens = ["AFTER", "-2 12:00", "BEFORE", "-1:00:00"];
    assert_eq!(interval(&tokens), interval(&tokens));
    assert_eq!(interval(&tokens).lower, Some(Bound::exclusive(at(12, 0) - Duration::hours(60))));
}

// Keywords

#[test]
fn test_keywords_case_insensitive() {
    let cmd = dump(&["point", "Tank1.Level", "Pull", "synced", "from", "Plant", "into", "out"]).unwrap();
    assert_eq!(cmd.point, PointSelector::Name("Tank1.Level".to_string()));
    assert!(cmd.pull);
    assert!(cmd.synced);
    assert_eq!(cmd.store, Some("Plant".to_string()));
    assert_eq!(cmd.path, Some(PathBuf::from("out")));
}

#[test]
fn test_point_uuid() {
    let cmd = dump(&["POINT", "67e55044-10b1-426f-9247-bb680e5fe0c8"]).unwrap();
    assert!(matches!(cmd.point, PointSelector::Uuid(_)));
}

#[test]
fn test_credentials_absent_vs_empty() {
    let cmd = dump(&["USER", "alice"]).unwrap();
    assert_eq!(cmd.credentials.user, Some("alice".to_string()));
    assert_eq!(cmd.credentials.password, None);

    let cmd = dump(&["USER", "alice", "PASSWORD", ""]).unwrap();
    assert_eq!(cmd.credentials.password, Some(String::new()));
}

#[test]
fn test_with_resource() {
    let cmd = load(&["WITH", "plant", "FROM", "values.jsonl", "INTO", "Archive"]).unwrap();
    assert_eq!(cmd.with, Some("plant".to_string()));
    assert_eq!(cmd.store, Some("Archive".to_string()));
}

#[test]
fn test_no_point_forces_pull() {
    let cmd = dump(&["SYNCED"]).unwrap();
    assert!(cmd.pull);
    assert!(!cmd.synced);
}

#[test]
fn test_flags_take_no_argument() {
    let cmd = dump(&["PULL", "POINT", "X", "SYNCED"]).unwrap();
    assert_eq!(cmd.point, PointSelector::Name("X".to_string()));
    assert!(cmd.pull);
    assert!(cmd.synced);

    let cmd = dump(&["POINT", "SYNCED"]).unwrap();
    assert_eq!(cmd.point, PointSelector::Name("SYNCED".to_string()));
    assert!(!cmd.synced);
}

#[test]
fn test_duplicate_keyword() {
    assert_eq!(
        dump(&["FROM", "a", "FROM", "b"]).unwrap_err(),
        GrammarError::Duplicate("FROM".to_string())
    );
    assert!(matches!(dump(&["PULL", "PULL"]), Err(GrammarError::Duplicate(_))));
}

#[test]
fn test_missing_argument() {
    assert_eq!(
        dump(&["POINT"]).unwrap_err(),
        GrammarError::Exhausted("POINT".to_string())
    );
    assert_eq!(
        dump(&["AFTER"]).unwrap_err(),
        GrammarError::Exhausted("AFTER".to_string())
    );
    assert!(matches!(dump(&["NOT"]), Err(GrammarError::Exhausted(_))));
}

#[test]
fn test_not_requires_direction() {
    assert!(matches!(
        dump(&["NOT", "NOW", "-1:00"]),
        Err(GrammarError::Syntax(_))
    ));
}

#[test]
fn test_bad_date_time() {
    assert!(matches!(dump(&["AFTER", "yesterday"]), Err(GrammarError::Syntax(_))));
    assert!(matches!(dump(&["AFTER", "-soon"]), Err(GrammarError::Syntax(_))));
}

#[test]
fn test_unexpected_token() {
    assert_eq!(
        dump(&["BOGUS"]).unwrap_err(),
        GrammarError::Syntax("unexpected 'BOGUS'".to_string())
    );
}

#[test]
fn test_load_rejects_export_keywords() {
    for tokens in [
        &["FROM", "f", "POINT", "X"][..],
        &["FROM", "f", "PULL"][..],
        &["FROM", "f", "ALL"][..],
        &["FROM", "f", "AFTER", "-1:00"][..],
    ] {
        assert!(
            matches!(load(tokens), Err(GrammarError::Syntax(_))),
            "{:?}",
            tokens
        );
    }
}

#[test]
fn test_is_help() {
    assert!(is_help(&["HELP"]));
    assert!(is_help(&["help"]));
    assert!(!is_help(&["HELP", "ALL"]));
    assert!(!is_help::<&str>(&[]));
}
