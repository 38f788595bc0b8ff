//! Command keywords and the per-tool command descriptor.

use std::collections::HashSet;
use std::path::PathBuf;

use super::cursor::TokenCursor;
use super::datetime::ParseContext;
use super::interval::IntervalGrammar;
use crate::error::GrammarError;
use crate::interval::TimeInterval;
use crate::schema::PointSelector;
use crate::store::Credentials;

/// The tools sharing the command grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Dump point values from a store into a file or stdout.
    Export,
    /// Load point values from a file into a store.
    Import,
}

impl Tool {
    /// Subcommand name.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Export => "dump",
            Tool::Import => "load",
        }
    }

    /// Keywords this tool recognizes, besides interval clauses.
    pub fn accepts(self, keyword: Keyword) -> bool {
        match self {
            Tool::Export => true,
            Tool::Import => !matches!(keyword, Keyword::Point | Keyword::Pull | Keyword::Synced),
        }
    }

    /// Whether `ALL` / `AFTER` / `BEFORE` / `NOT` clauses are recognized.
    pub fn takes_interval(self) -> bool {
        matches!(self, Tool::Export)
    }

    /// Usage text, printed for `HELP` and on grammar errors.
    pub fn usage(self, program: &str) -> String {
        match self {
            Tool::Export => format!(
                "Usage: {} dump [<properties>] [<point>] [<source>] [<user>] [<password>] [<destination>] [<interval>]\n\
                 \t<properties>: WITH <resource-file>\n\
                 \t<point>: [PULL|SYNCED] POINT (<name>|<uuid>)\n\
                 \t<source>: FROM <store>\n\
                 \t<user>: USER <user-id>\n\
                 \t<password>: PASSWORD <user-password>\n\
                 \t<destination>: INTO <file-path>\n\
                 \t<interval>: ALL|([<start>] [<stop>])\n\
                 \t<start>: (AFTER|(NOT BEFORE)) <date-time>\n\
                 \t<stop>: (BEFORE|(NOT AFTER)) <date-time>\n\
                 \t<date-time>: <literal>|-<elapsed>",
                program
            ),
            Tool::Import => format!(
                "Usage: {} load [<properties>] <source> [<destination>] [<user>] [<password>]\n\
                 \t<properties>: WITH <resource-file>\n\
                 \t<source>: FROM <file-path>\n\
                 \t<destination>: INTO <store>\n\
                 \t<user>: USER <user-id>\n\
                 \t<password>: PASSWORD <user-password>",
                program
            ),
        }
    }
}

/// Command keywords outside the interval clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    With,
    From,
    Into,
    User,
    Password,
    Point,
    Pull,
    Synced,
}

impl Keyword {
    /// Look up an uppercased word.
    pub fn lookup(word: &str) -> Option<Self> {
        Some(match word {
            "WITH" => Keyword::With,
            "FROM" => Keyword::From,
            "INTO" => Keyword::Into,
            "USER" => Keyword::User,
            "PASSWORD" => Keyword::Password,
            "POINT" => Keyword::Point,
            "PULL" => Keyword::Pull,
            "SYNCED" => Keyword::Synced,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::With => "WITH",
            Keyword::From => "FROM",
            Keyword::Into => "INTO",
            Keyword::User => "USER",
            Keyword::Password => "PASSWORD",
            Keyword::Point => "POINT",
            Keyword::Pull => "PULL",
            Keyword::Synced => "SYNCED",
        }
    }
}

/// A fully parsed tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub tool: Tool,
    /// Configuration resource (`WITH`).
    pub with: Option<String>,
    /// Store name: `FROM` for export, `INTO` for import.
    pub store: Option<String>,
    /// File path: `INTO` for export (None = stdout), `FROM` for import.
    pub path: Option<PathBuf>,
    pub credentials: Credentials,
    pub point: PointSelector,
    pub pull: bool,
    pub synced: bool,
    /// None when no interval clause was given, which selects everything.
    pub interval: Option<TimeInterval>,
}

impl Command {
    /// The interval to query; unbounded when none was given.
    pub fn effective_interval(&self) -> TimeInterval {
        self.interval.unwrap_or_default()
    }
}

/// Whether the arguments are a lone `HELP` request.
pub fn is_help<S: AsRef<str>>(tokens: &[S]) -> bool {
    tokens.len() == 1 && tokens[0].as_ref().eq_ignore_ascii_case("HELP")
}

/// Parse a tool's argument tokens into a command.
pub fn parse_command<I, S>(tool: Tool, tokens: I, ctx: &ParseContext) -> Result<Command, GrammarError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cursor = TokenCursor::new(tokens);
    let mut used: HashSet<Keyword> = HashSet::new();
    let mut values = Values::default();
    let mut intervals = IntervalGrammar::new();

    while !cursor.is_empty() {
        let token = cursor.next("command")?;
        let word = token.to_uppercase();

        match Keyword::lookup(&word).filter(|k| tool.accepts(*k)) {
            Some(keyword) => {
                if !used.insert(keyword) {
                    return Err(GrammarError::Duplicate(keyword.as_str().to_string()));
                }
                values.accept(keyword, &mut cursor)?;
            }
            None => {
                let consumed = tool.takes_interval() && intervals.accept(&word, &mut cursor, ctx)?;
                if !consumed {
                    return Err(GrammarError::Syntax(format!("unexpected '{}'", token)));
                }
            }
        }
    }

    values.into_command(tool, intervals.finish())
}

/// Raw keyword values collected while parsing.
#[derive(Debug, Default)]
struct Values {
    with: Option<String>,
    from: Option<String>,
    into: Option<String>,
    user: Option<String>,
    password: Option<String>,
    point: Option<String>,
    pull: bool,
    synced: bool,
}

impl Values {
    /// Record `keyword`, taking its argument from the cursor unless it is a flag.
    fn accept(&mut self, keyword: Keyword, cursor: &mut TokenCursor) -> Result<(), GrammarError> {
        let slot = match keyword {
            Keyword::Pull => {
                self.pull = true;
                return Ok(());
            }
            Keyword::Synced => {
                self.synced = true;
                return Ok(());
            }
            Keyword::With => &mut self.with,
            Keyword::From => &mut self.from,
            Keyword::Into => &mut self.into,
            Keyword::User => &mut self.user,
            Keyword::Password => &mut self.password,
            Keyword::Point => &mut self.point,
        };
        *slot = Some(cursor.next(keyword.as_str())?);
        Ok(())
    }

    fn into_command(
        self,
        tool: Tool,
        interval: Option<TimeInterval>,
    ) -> Result<Command, GrammarError> {
        let credentials = Credentials {
            user: self.user,
            password: self.password,
        };

        match tool {
            Tool::Export => {
                let (point, pull, synced) = match self.point {
                    Some(point) => (PointSelector::parse(&point), self.pull, self.synced),
                    None => {
                        if self.synced {
                            tracing::warn!("SYNCED ignored: dumping all points forces PULL mode");
                        }
                        (PointSelector::All, true, false)
                    }
                };
                Ok(Command {
                    tool,
                    with: self.with,
                    store: self.from,
                    path: self.into.map(PathBuf::from),
                    credentials,
                    point,
                    pull,
                    synced,
                    interval,
                })
            }
            Tool::Import => {
                let path = self
                    .from
                    .ok_or_else(|| GrammarError::Syntax("FROM <file-path> is required".to_string()))?;
                Ok(Command {
                    tool,
                    with: self.with,
                    store: self.into,
                    path: Some(PathBuf::from(path)),
                    credentials,
                    point: PointSelector::All,
                    pull: false,
                    synced: false,
                    interval: None,
                })
            }
        }
    }
}
