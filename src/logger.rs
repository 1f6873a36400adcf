//! Data-quality diagnostics. Problems found while building or resolving a corpus (malformed
//! fragments, unresolved references, duplicate identifiers, ...) never abort the processing: they
//! are collected into a `CheckLogger` and it is up to the caller to decide if the highest severity
//! seen should stop the evaluation. Every message is also emitted as a `tracing` event.
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Severity of a diagnostic. Levels are ordered by increasing severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum CheckLevel {
    /// Nothing wrong, for information only.
    Information,
    /// Minor issue, the data can be used as is.
    Tolerable,
    /// The data is probably not what the author meant.
    Suspicious,
    /// The data had to be altered or discarded.
    Serious,
}

impl CheckLevel {
    /// Numeric severity of the level.
    pub fn severity(self) -> u32 {
        match self {
            Self::Information => 1,
            Self::Tolerable => 10,
            Self::Suspicious => 100,
            Self::Serious => 1000,
        }
    }
}

impl Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Information => "INFORMATION",
            Self::Tolerable => "TOLERABLE",
            Self::Suspicious => "SUSPICIOUS",
            Self::Serious => "SERIOUS",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckLevelParsingError(String);

impl Display for CheckLevelParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Impossible to parse the string ({}) into a CheckLevel", self.0)
    }
}
impl Error for CheckLevelParsingError {}

impl FromStr for CheckLevel {
    type Err = CheckLevelParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "information" | "info" => Ok(Self::Information),
            "tolerable" => Ok(Self::Tolerable),
            "suspicious" => Ok(Self::Suspicious),
            "serious" => Ok(Self::Serious),
            _ => Err(CheckLevelParsingError(String::from(s))),
        }
    }
}

/// Position in a source: a file name, an URL, an archive entry... A line number lower than 1
/// means the line is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub source: String,
    pub lineno: i64,
}

impl Location {
    pub fn new<S: Into<String>>(source: S, lineno: i64) -> Self {
        Self {
            source: source.into(),
            lineno,
        }
    }

    /// Location in `source` without line information.
    pub fn unknown_line<S: Into<String>>(source: S) -> Self {
        Self::new(source, -1)
    }

    pub fn has_line(&self) -> bool {
        self.lineno >= 1
    }

    /// Formats `body` prefixed with this location and an optional header.
    ///
    /// * `header`: Optional header, usually the severity of a message.
    /// * `body`: The message itself.
    pub fn message(&self, header: Option<&str>, body: &str) -> String {
        match (header, self.has_line()) {
            (None, false) => format!("{}: {}", self.source, body),
            (Some(h), false) => format!("{} {} {}", h, self.source, body),
            (None, true) => format!("{}:{} {}", self.source, self.lineno, body),
            (Some(h), true) => format!("{} {}:{} {}", h, self.source, self.lineno, body),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_line() {
            write!(f, "{}:{}", self.source, self.lineno)
        } else {
            write!(f, "{}", self.source)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMessage {
    pub level: CheckLevel,
    pub location: Location,
    pub body: String,
}

impl CheckMessage {
    pub fn new<S: Into<String>>(level: CheckLevel, location: Location, body: S) -> Self {
        Self {
            level,
            location,
            body: body.into(),
        }
    }

    /// The message body with its location and severity.
    pub fn complete_message(&self) -> String {
        self.location
            .message(Some(&self.level.to_string()), &self.body)
    }
}

impl Display for CheckMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.complete_message())
    }
}

/// Append-only collection of diagnostics. Keeps track of the highest severity seen so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckLogger {
    messages: Vec<CheckMessage>,
    highest_level: Option<CheckLevel>,
}

impl CheckLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: CheckMessage) {
        emit(&message);
        self.highest_level = match self.highest_level {
            Some(level) if level >= message.level => Some(level),
            _ => Some(message.level),
        };
        self.messages.push(message);
    }

    pub fn add<S: Into<String>>(&mut self, level: CheckLevel, location: &Location, body: S) {
        self.add_message(CheckMessage::new(level, location.clone(), body))
    }

    pub fn information<S: Into<String>>(&mut self, location: &Location, body: S) {
        self.add(CheckLevel::Information, location, body)
    }

    pub fn tolerable<S: Into<String>>(&mut self, location: &Location, body: S) {
        self.add(CheckLevel::Tolerable, location, body)
    }

    pub fn suspicious<S: Into<String>>(&mut self, location: &Location, body: S) {
        self.add(CheckLevel::Suspicious, location, body)
    }

    pub fn serious<S: Into<String>>(&mut self, location: &Location, body: S) {
        self.add(CheckLevel::Serious, location, body)
    }

    /// Messages in the order they were recorded.
    pub fn messages(&self) -> &[CheckMessage] {
        &self.messages
    }

    /// Highest severity recorded, `None` if the logger is empty.
    pub fn highest_level(&self) -> Option<CheckLevel> {
        self.highest_level
    }

    /// Number of messages at exactly `level`.
    pub fn count(&self, level: CheckLevel) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.highest_level = None;
    }
}

impl Extend<CheckMessage> for CheckLogger {
    fn extend<I: IntoIterator<Item = CheckMessage>>(&mut self, iter: I) {
        for message in iter {
            self.add_message(message)
        }
    }
}

fn emit(message: &CheckMessage) {
    let source = message.location.source.as_str();
    let lineno = message.location.lineno;
    match message.level {
        CheckLevel::Information | CheckLevel::Tolerable => {
            tracing::info!(source, lineno, level = %message.level, "{}", message.body)
        }
        CheckLevel::Suspicious => {
            tracing::warn!(source, lineno, level = %message.level, "{}", message.body)
        }
        CheckLevel::Serious => {
            tracing::error!(source, lineno, level = %message.level, "{}", message.body)
        }
    }
}
