use std::fmt;

/// What went wrong while resolving tokens against a command.
///
/// Names carried by the variants are descriptor names (the stable result
/// keys), except for [`ErrorKind::UnknownOption`] which carries the token as
/// typed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option '--{prefix}' is ambiguous; candidates: {}", .candidates.join(", "))]
    AmbiguousPrefix {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("missing value for '{0}'")]
    MissingValue(String),

    #[error("'{name}' expects {expected} values, got {got}")]
    InsufficientValues {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid value '{value}' for '{name}'. possible values: {}", .allowed.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("value '{value}' for '{name}' is out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: String,
        min: f64,
        max: f64,
    },

    #[error("value '{value}' for '{name}' is not a number")]
    InvalidNumber { name: String, value: String },

    #[error("'{name}' does not take a value (got '{value}')")]
    UnexpectedValue { name: String, value: String },

    #[error("missing required argument: {0}")]
    MissingRequired(String),

    #[error("too many positional arguments: expected at most {expected}, got {got}")]
    TooManyPositionals { expected: usize, got: usize },

    #[error("arguments cannot be used together: {}", .0.join(", "))]
    MutuallyExclusiveViolation(Vec<String>),

    #[error("one of these arguments is required: {}", .0.join(", "))]
    OneRequiredViolation(Vec<String>),

    #[error("arguments must be used together; missing: {}", .0.join(", "))]
    RequiredTogetherViolation(Vec<String>),

    #[error("'{target}' is required when '{condition}' is present")]
    ConditionalRequirementViolation { target: String, condition: String },

    #[error("unknown subcommand '{name}'. available: {}", .available.join(", "))]
    UnknownSubcommand {
        name: String,
        available: Vec<String>,
    },

    #[error("a subcommand is required. available: {}", .available.join(", "))]
    MissingSubcommand { available: Vec<String> },
}

impl ErrorKind {
    /// Stable kebab-case identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownOption(_) => "unknown-option",
            Self::AmbiguousPrefix { .. } => "ambiguous-prefix",
            Self::MissingValue(_) => "missing-value",
            Self::InsufficientValues { .. } => "insufficient-values",
            Self::InvalidChoice { .. } => "invalid-choice",
            Self::OutOfRange { .. } => "out-of-range",
            Self::InvalidNumber { .. } => "invalid-number",
            Self::UnexpectedValue { .. } => "unexpected-value",
            Self::MissingRequired(_) => "missing-required",
            Self::TooManyPositionals { .. } => "too-many-positionals",
            Self::MutuallyExclusiveViolation(_) => "mutually-exclusive",
            Self::OneRequiredViolation(_) => "one-required",
            Self::RequiredTogetherViolation(_) => "required-together",
            Self::ConditionalRequirementViolation { .. } => "conditional-requirement",
            Self::UnknownSubcommand { .. } => "unknown-subcommand",
            Self::MissingSubcommand { .. } => "missing-subcommand",
        }
    }

    /// Names affected by the error.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::UnknownOption(name)
            | Self::MissingValue(name)
            | Self::MissingRequired(name)
            | Self::InsufficientValues { name, .. }
            | Self::InvalidChoice { name, .. }
            | Self::OutOfRange { name, .. }
            | Self::InvalidNumber { name, .. }
            | Self::UnexpectedValue { name, .. }
            | Self::UnknownSubcommand { name, .. } => vec![name.as_str()],
            Self::AmbiguousPrefix { candidates, .. } => {
                candidates.iter().map(String::as_str).collect()
            }
            Self::MutuallyExclusiveViolation(names)
            | Self::OneRequiredViolation(names)
            | Self::RequiredTogetherViolation(names) => names.iter().map(String::as_str).collect(),
            Self::ConditionalRequirementViolation { target, condition } => {
                vec![target.as_str(), condition.as_str()]
            }
            Self::TooManyPositionals { .. } | Self::MissingSubcommand { .. } => Vec::new(),
        }
    }
}

/// A parse failure, tagged with the command path it was raised at.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    path: Vec<String>,
    kind: ErrorKind,
}

impl ParseError {
    pub(crate) fn new(path: &[String], kind: ErrorKind) -> Self {
        Self {
            path: path.to_vec(),
            kind,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Command names from the root down to the command that raised the error.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn names(&self) -> Vec<&str> {
        self.kind.names()
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.len() > 1 {
            write!(f, "{}: {}", self.path.join(" "), self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// A defect in the command definition, reported by [`crate::CommandBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("arg definition conflict in '{command}': {reason} ({})", .names.join(", "))]
    RegistrationConflict {
        command: String,
        names: Vec<String>,
        reason: String,
    },

    #[error("invalid argument '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("schema error in '{command}': {rule} references unknown arg '{name}'")]
    UnknownReference {
        command: String,
        rule: &'static str,
        name: String,
    },

    #[error("invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },
}

impl BuildError {
    pub(crate) fn conflict(
        command: &str,
        names: impl IntoIterator<Item = impl Into<String>>,
        reason: impl Into<String>,
    ) -> Self {
        Self::RegistrationConflict {
            command: command.to_string(),
            names: names.into_iter().map(Into::into).collect(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_arg(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_command(command: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}
