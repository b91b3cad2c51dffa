use crate::error::{BuildError, ErrorKind};

/// How an argument consumes tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgKind {
    /// Boolean; `true` when present.
    #[default]
    Flag,
    /// Incremented once per occurrence.
    Count,
    /// A single value; the last occurrence wins.
    Value,
    /// Values accumulate across occurrences in input order.
    Append,
    /// Exactly `n` consecutive values per occurrence.
    Nargs(usize),
    /// `KEY=VALUE` pairs.
    Map,
}

impl ArgKind {
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Flag | Self::Count)
    }
}

/// One argument definition.
///
/// Built by value: every setter consumes the record and returns the updated
/// one. Nothing is checked until the owning command is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub(crate) name: String,
    pub(crate) long: Option<String>,
    pub(crate) short: Option<char>,
    pub(crate) aliases: Vec<String>,
    pub(crate) kind: ArgKind,
    pub(crate) positional: bool,
    pub(crate) index: Option<usize>,
    pub(crate) required: bool,
    pub(crate) default_value: Option<String>,
    pub(crate) choices: Vec<String>,
    pub(crate) range: Option<(f64, f64)>,
    pub(crate) delimiter: Option<String>,
    pub(crate) negatable: bool,
    pub(crate) persistent: bool,
    pub(crate) hidden: bool,
    pub(crate) metavar: Option<String>,
    pub(crate) help: String,
    pub(crate) deprecated: Option<String>,
}

fn normalize_long(raw: &str) -> String {
    raw.trim().trim_start_matches('-').to_string()
}

impl Arg {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            long: None,
            short: None,
            aliases: Vec::new(),
            kind: ArgKind::Flag,
            positional: false,
            index: None,
            required: false,
            default_value: None,
            choices: Vec::new(),
            range: None,
            delimiter: None,
            negatable: false,
            persistent: false,
            hidden: false,
            metavar: None,
            help: String::new(),
            deprecated: None,
        }
    }

    /// Long name, with or without the leading `--`.
    pub fn long(mut self, long: impl AsRef<str>) -> Self {
        self.long = Some(normalize_long(long.as_ref()));
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Additional long name resolving to the same argument.
    pub fn alias(mut self, alias: impl AsRef<str>) -> Self {
        self.aliases.push(normalize_long(alias.as_ref()));
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|a| normalize_long(a.as_ref())));
        self
    }

    pub fn kind(mut self, kind: ArgKind) -> Self {
        self.kind = kind;
        self
    }

    /// Match by position instead of by option name.
    ///
    /// Positional arguments default to [`ArgKind::Value`].
    pub fn positional(mut self) -> Self {
        self.positional = true;
        if self.kind == ArgKind::Flag {
            self.kind = ArgKind::Value;
        }
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Inclusive numeric bounds checked for every collected value.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Split each raw value on `delimiter` and collect the pieces.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Also accept `--no-<long>`, which sets the flag to `false`.
    pub fn negatable(mut self, negatable: bool) -> Self {
        self.negatable = negatable;
        self
    }

    /// Make the argument visible to every descendant subcommand.
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }
}

// Read-only view used by help renderers and the metadata snapshot.
impl Arg {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn get_short(&self) -> Option<char> {
        self.short
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get_kind(&self) -> ArgKind {
        self.kind
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Ordinal among the command's positional arguments, assigned at build time.
    pub fn get_index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn get_default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn get_choices(&self) -> &[String] {
        &self.choices
    }

    pub fn get_range(&self) -> Option<(f64, f64)> {
        self.range
    }

    pub fn get_delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    pub fn is_negatable(&self) -> bool {
        self.negatable
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn get_metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    pub fn get_help(&self) -> &str {
        &self.help
    }

    pub fn get_deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// The implicit `no-<long>` spelling of a negatable flag.
    pub fn negated_long(&self) -> Option<String> {
        if !self.negatable {
            return None;
        }
        self.long.as_ref().map(|l| format!("no-{l}"))
    }

    /// Whether values are collected into a list rather than stored as a scalar.
    pub(crate) fn collects(&self) -> bool {
        match self.kind {
            ArgKind::Append | ArgKind::Nargs(_) => true,
            ArgKind::Value => self.delimiter.is_some(),
            ArgKind::Flag | ArgKind::Count | ArgKind::Map => false,
        }
    }

    /// Check one collected value against choices and range.
    pub(crate) fn check_value(&self, value: &str) -> Result<(), ErrorKind> {
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == value) {
            return Err(ErrorKind::InvalidChoice {
                name: self.name.clone(),
                value: value.to_string(),
                allowed: self.choices.clone(),
            });
        }
        if let Some((min, max)) = self.range {
            let number = match value.parse::<f64>() {
                Ok(number) if !number.is_nan() => number,
                _ => {
                    return Err(ErrorKind::InvalidNumber {
                        name: self.name.clone(),
                        value: value.to_string(),
                    });
                }
            };
            if number < min || number > max {
                return Err(ErrorKind::OutOfRange {
                    name: self.name.clone(),
                    value: value.to_string(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Split a raw value on the configured delimiter, dropping one trailing
    /// empty segment.
    pub(crate) fn split_raw<'v>(&self, raw: &'v str) -> Vec<&'v str> {
        let Some(delimiter) = self.delimiter.as_deref() else {
            return vec![raw];
        };
        let mut pieces: Vec<&str> = raw.split(delimiter).collect();
        if pieces.last() == Some(&"") {
            pieces.pop();
        }
        pieces
    }

    /// Descriptor-local checks; cross-argument checks live in the command builder.
    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        let name = self.name.as_str();
        if name.trim().is_empty() {
            return Err(BuildError::invalid_arg(name, "name must not be empty"));
        }
        if let Some(short) = self.short {
            if short == '-' || short.is_whitespace() {
                return Err(BuildError::invalid_arg(
                    name,
                    format!("'{short}' cannot be a short name"),
                ));
            }
        }
        for long in self.long.iter().chain(self.aliases.iter()) {
            if long.is_empty() || long.contains('=') || long.chars().any(char::is_whitespace) {
                return Err(BuildError::invalid_arg(
                    name,
                    format!("'{long}' cannot be a long name"),
                ));
            }
        }

        if self.positional {
            if self.long.is_some() || self.short.is_some() || !self.aliases.is_empty() {
                return Err(BuildError::invalid_arg(
                    name,
                    "positional arguments cannot have option names",
                ));
            }
            if !matches!(self.kind, ArgKind::Value | ArgKind::Append | ArgKind::Nargs(_)) {
                return Err(BuildError::invalid_arg(
                    name,
                    "positional arguments must take values",
                ));
            }
            if self.persistent {
                return Err(BuildError::invalid_arg(
                    name,
                    "positional arguments cannot be persistent",
                ));
            }
        } else if self.long.is_none() && self.short.is_none() {
            return Err(BuildError::invalid_arg(
                name,
                "options need a long or short name",
            ));
        }

        if self.negatable {
            if self.kind != ArgKind::Flag {
                return Err(BuildError::invalid_arg(name, "only flags can be negatable"));
            }
            if self.long.is_none() {
                return Err(BuildError::invalid_arg(
                    name,
                    "negatable flags need a long name",
                ));
            }
        }

        if self.kind == ArgKind::Nargs(0) {
            return Err(BuildError::invalid_arg(name, "nargs must be at least 1"));
        }

        if let Some(delimiter) = &self.delimiter {
            if delimiter.is_empty() {
                return Err(BuildError::invalid_arg(name, "delimiter must not be empty"));
            }
            if !matches!(self.kind, ArgKind::Value | ArgKind::Append | ArgKind::Map) {
                return Err(BuildError::invalid_arg(
                    name,
                    "delimiter requires a value, append or map argument",
                ));
            }
        }

        if !self.kind.takes_value() && (!self.choices.is_empty() || self.range.is_some()) {
            return Err(BuildError::invalid_arg(
                name,
                "choices and range require a value-taking argument",
            ));
        }
        if let Some((min, max)) = self.range {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(BuildError::invalid_arg(
                    name,
                    format!("invalid range [{min}, {max}]"),
                ));
            }
        }

        if let Some(default_value) = &self.default_value {
            self.validate_default(default_value)?;
        }
        Ok(())
    }

    fn validate_default(&self, default_value: &str) -> Result<(), BuildError> {
        let reject = |reason: String| BuildError::invalid_arg(&self.name, reason);
        match self.kind {
            ArgKind::Flag => {
                default_value
                    .parse::<bool>()
                    .map_err(|_| reject(format!("flag default '{default_value}' is not a bool")))?;
            }
            ArgKind::Count => {
                default_value.parse::<u64>().map_err(|_| {
                    reject(format!("count default '{default_value}' is not an integer"))
                })?;
            }
            ArgKind::Map => {
                for piece in self.split_raw(default_value) {
                    let (_, value) = piece.split_once('=').ok_or_else(|| {
                        reject(format!("map default '{piece}' is not KEY=VALUE"))
                    })?;
                    self.check_value(value).map_err(|e| reject(e.to_string()))?;
                }
            }
            ArgKind::Value | ArgKind::Append | ArgKind::Nargs(_) => {
                for piece in self.split_raw(default_value) {
                    self.check_value(piece).map_err(|e| reject(e.to_string()))?;
                }
            }
        }
        Ok(())
    }
}
