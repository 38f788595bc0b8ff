//! Front-consuming cursor over command tokens.

use std::collections::VecDeque;

use crate::error::GrammarError;

/// The remaining tokens of one command invocation.
#[derive(Debug, Clone, Default)]
pub struct TokenCursor {
    tokens: VecDeque<String>,
}

impl TokenCursor {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Take the next token.
    ///
    /// `after` names what is being parsed, for the exhaustion message.
    pub fn next(&mut self, after: &str) -> Result<String, GrammarError> {
        self.tokens
            .pop_front()
            .ok_or_else(|| GrammarError::Exhausted(after.to_string()))
    }

    /// Whether the next token exists and starts like a keyword.
    pub fn peek_is_word(&self) -> bool {
        self.tokens
            .front()
            .and_then(|t| t.chars().next())
            .is_some_and(char::is_alphabetic)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_consumes_in_order() {
        let mut cursor = TokenCursor::new(["POINT", "Tank1.Level"]);
        assert_eq!(cursor.next("start").unwrap(), "POINT");
        assert_eq!(cursor.len(), 1);
        assert_eq!(cursor.next("POINT").unwrap(), "Tank1.Level");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_next_on_empty_is_exhausted() {
        let mut cursor = TokenCursor::new(Vec::<String>::new());
        assert_eq!(
            cursor.next("INTO"),
            Err(GrammarError::Exhausted("INTO".to_string()))
        );
        // Still exhausted, never a silent no-op.
        assert!(cursor.next("INTO").is_err());
    }

    #[test]
    fn test_peek_is_word() {
        assert!(TokenCursor::new(["BEFORE"]).peek_is_word());
        assert!(TokenCursor::new(["before"]).peek_is_word());
        assert!(!TokenCursor::new(["10:00"]).peek_is_word());
        assert!(!TokenCursor::new(["-1:00:00"]).peek_is_word());
        assert!(!TokenCursor::new(Vec::<String>::new()).peek_is_word());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let cursor = TokenCursor::new(["ALL"]);
        assert!(cursor.peek_is_word());
        assert_eq!(cursor.len(), 1);
    }
}
