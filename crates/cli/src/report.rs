use argtree::{ParseError, ParseOutcome, ParseResult};
use serde::Serialize;

/// JSON written by `argtree parse`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ParseReport {
    Parsed { result: ParseResult },
    Help { path: Vec<String> },
    Version { path: Vec<String> },
    Error { error: ErrorReport },
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub path: Vec<String>,
    pub names: Vec<String>,
    pub message: String,
}

impl ParseReport {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<Result<ParseOutcome, ParseError>> for ParseReport {
    fn from(outcome: Result<ParseOutcome, ParseError>) -> Self {
        match outcome {
            Ok(ParseOutcome::Parsed(result)) => Self::Parsed { result },
            Ok(ParseOutcome::Help { path }) => Self::Help { path },
            Ok(ParseOutcome::Version { path }) => Self::Version { path },
            Err(err) => Self::Error {
                error: ErrorReport {
                    code: err.kind().code(),
                    path: err.path().to_vec(),
                    names: err.names().into_iter().map(str::to_string).collect(),
                    message: err.to_string(),
                },
            },
        }
    }
}

/// Summary written by `argtree check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub schema: String,
    pub commands: usize,
    pub args: usize,
}
