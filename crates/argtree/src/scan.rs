//! Single left-to-right pass over the tokens of one command level.

use crate::arg::{Arg, ArgKind};
use crate::command::{Command, HELP_SUBCOMMAND, LongTarget};
use crate::error::ErrorKind;
use crate::result::ParseResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    /// Entered on a bare `--`; never left.
    PositionalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Help,
    Version,
}

/// Why the scan of a level stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stop {
    /// Every token was consumed.
    Done,
    /// A help or version token was found.
    Trigger(Trigger),
    /// `tokens[next - 1]` named the child at `child`.
    Subcommand { child: usize, next: usize },
    /// `tokens[next - 1]` was the `help` pseudo-subcommand.
    HelpSubcommand { next: usize },
}

/// Which positional argument the next bare token is assigned to.
#[derive(Debug, Clone, Copy, Default)]
struct PositionalCursor {
    ordinal: usize,
    filled: usize,
}

pub(crate) struct Scanner<'a> {
    cmd: &'a Command,
    tokens: &'a [String],
    cursor: usize,
    state: State,
    positional: PositionalCursor,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(cmd: &'a Command, tokens: &'a [String]) -> Self {
        Self {
            cmd,
            tokens,
            cursor: 0,
            state: State::Scanning,
            positional: PositionalCursor::default(),
        }
    }

    /// Fill `result` from the tokens of this level.
    ///
    /// `result` may already hold persistent values copied from the parent;
    /// the first explicit occurrence of such an argument replaces them.
    pub(crate) fn scan(mut self, result: &mut ParseResult) -> Result<Stop, ErrorKind> {
        let tokens = self.tokens;
        while let Some(token) = tokens.get(self.cursor) {
            let token = token.as_str();

            if self.state == State::PositionalOnly {
                tracing::trace!(token, "positional after separator");
                self.cursor += 1;
                self.positional(token, result)?;
                continue;
            }

            if token == "--" {
                tracing::trace!("entering positional-only mode");
                self.state = State::PositionalOnly;
                self.cursor += 1;
                continue;
            }

            if let Some(trigger) = self.trigger(token) {
                tracing::trace!(token, ?trigger, "trigger token");
                return Ok(Stop::Trigger(trigger));
            }

            if let Some(body) = token.strip_prefix("--") {
                self.cursor += 1;
                self.long(body, result)?;
                continue;
            }

            if let Some(body) = token.strip_prefix('-').filter(|b| !b.is_empty()) {
                self.cursor += 1;
                if self.is_negative_number(body) {
                    tracing::trace!(token, "negative number as positional");
                    self.positional(token, result)?;
                } else {
                    self.short(body, result)?;
                }
                continue;
            }

            self.cursor += 1;
            if let Some(child) = self
                .cmd
                .subcommands()
                .iter()
                .position(|c| c.name() == token || c.aliases().iter().any(|a| a == token))
            {
                self.finish_positionals()?;
                return Ok(Stop::Subcommand {
                    child,
                    next: self.cursor,
                });
            }
            if self.cmd.has_help_subcommand() && token == HELP_SUBCOMMAND {
                self.finish_positionals()?;
                return Ok(Stop::HelpSubcommand { next: self.cursor });
            }
            if self.cmd.has_exclusive_subcommands() && !self.cmd.subcommands().is_empty() {
                return Err(ErrorKind::UnknownSubcommand {
                    name: token.to_string(),
                    available: self.cmd.subcommand_names(),
                });
            }
            self.positional(token, result)?;
        }

        self.finish_positionals()?;
        Ok(Stop::Done)
    }

    fn trigger(&self, token: &str) -> Option<Trigger> {
        let triggers = &self.cmd.triggers;
        match token {
            "--help" if triggers.long_help => Some(Trigger::Help),
            "-h" if triggers.short_help => Some(Trigger::Help),
            "--version" if triggers.long_version => Some(Trigger::Version),
            "-V" if triggers.short_version => Some(Trigger::Version),
            _ => None,
        }
    }

    fn is_negative_number(&self, body: &str) -> bool {
        looks_like_number(body)
            && (self.cmd.allows_negative_numbers() || !self.cmd.index.digit_short)
    }

    fn long(&mut self, body: &str, result: &mut ParseResult) -> Result<(), ErrorKind> {
        let (name, attached) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let cmd = self.cmd;
        let target = self.resolve_long(name)?;
        let arg = cmd.arg_at(target.slot);

        if target.negated {
            if let Some(value) = attached {
                return Err(ErrorKind::UnexpectedValue {
                    name: arg.get_name().to_string(),
                    value: value.to_string(),
                });
            }
            result.begin(arg.get_name());
            result.set_flag(arg.get_name(), false);
            return Ok(());
        }
        self.consume(arg, attached, result)
    }

    /// Exact long names and aliases win; otherwise a unique strict prefix.
    fn resolve_long(&self, name: &str) -> Result<LongTarget, ErrorKind> {
        let longs = &self.cmd.index.longs;
        if let Some(target) = longs.get(name) {
            return Ok(*target);
        }

        let mut matches: Vec<(&str, LongTarget)> = Vec::new();
        if !name.is_empty() {
            for (spelling, target) in longs {
                if spelling.starts_with(name) && !matches.iter().any(|(_, t)| t == target) {
                    matches.push((spelling.as_str(), *target));
                }
            }
        }

        match matches.as_slice() {
            [] => Err(ErrorKind::UnknownOption(format!("--{name}"))),
            [(spelling, target)] => {
                tracing::trace!(prefix = name, resolved = *spelling, "prefix match");
                Ok(*target)
            }
            _ => {
                let mut candidates: Vec<String> =
                    matches.iter().map(|(s, _)| s.to_string()).collect();
                candidates.sort();
                Err(ErrorKind::AmbiguousPrefix {
                    prefix: name.to_string(),
                    candidates,
                })
            }
        }
    }

    /// Merged short options: flags and counters continue within the token,
    /// the first value-taking option ends it.
    fn short(&mut self, body: &str, result: &mut ParseResult) -> Result<(), ErrorKind> {
        let cmd = self.cmd;
        for (offset, ch) in body.char_indices() {
            let Some(&slot) = cmd.index.shorts.get(&ch) else {
                return Err(ErrorKind::UnknownOption(format!("-{ch}")));
            };
            let arg = cmd.arg_at(slot);
            if arg.get_kind().takes_value() {
                let rest = &body[offset + ch.len_utf8()..];
                let attached = (!rest.is_empty()).then_some(rest);
                return self.consume(arg, attached, result);
            }
            self.consume(arg, None, result)?;
        }
        Ok(())
    }

    fn consume(
        &mut self,
        arg: &Arg,
        attached: Option<&str>,
        result: &mut ParseResult,
    ) -> Result<(), ErrorKind> {
        let name = arg.get_name();
        match arg.get_kind() {
            ArgKind::Flag | ArgKind::Count => {
                if let Some(value) = attached {
                    return Err(ErrorKind::UnexpectedValue {
                        name: name.to_string(),
                        value: value.to_string(),
                    });
                }
                result.begin(name);
                if arg.get_kind() == ArgKind::Flag {
                    result.set_flag(name, true);
                } else {
                    result.increment(name);
                }
                Ok(())
            }
            ArgKind::Value | ArgKind::Append | ArgKind::Map => {
                let raw = match attached {
                    Some(value) => value,
                    None => self.next_token(arg)?,
                };
                store(arg, raw, result)
            }
            ArgKind::Nargs(n) => {
                let tokens = self.tokens;
                let mut taken: Vec<&str> = attached.into_iter().collect();
                while taken.len() < n {
                    let Some(token) = tokens.get(self.cursor) else {
                        return Err(ErrorKind::InsufficientValues {
                            name: name.to_string(),
                            expected: n,
                            got: taken.len(),
                        });
                    };
                    self.cursor += 1;
                    taken.push(token.as_str());
                }
                result.begin(name);
                for value in taken {
                    arg.check_value(value)?;
                    result.push_value(name, value);
                }
                Ok(())
            }
        }
    }

    fn next_token(&mut self, arg: &Arg) -> Result<&'a str, ErrorKind> {
        let tokens: &'a [String] = self.tokens;
        let Some(token) = tokens.get(self.cursor) else {
            return Err(ErrorKind::MissingValue(arg.get_name().to_string()));
        };
        self.cursor += 1;
        Ok(token.as_str())
    }

    /// Record a bare token and assign it to the next positional argument.
    fn positional(&mut self, token: &str, result: &mut ParseResult) -> Result<(), ErrorKind> {
        result.push_positional(token);

        let cmd = self.cmd;
        let Some(&slot) = cmd.index.positionals.get(self.positional.ordinal) else {
            // Validation reports the surplus.
            return Ok(());
        };
        let arg = cmd.arg_at(slot);
        match arg.get_kind() {
            ArgKind::Nargs(n) => {
                if self.positional.filled == 0 {
                    result.begin(arg.get_name());
                }
                arg.check_value(token)?;
                result.push_value(arg.get_name(), token);
                self.positional.filled += 1;
                if self.positional.filled == n {
                    self.positional = PositionalCursor {
                        ordinal: self.positional.ordinal + 1,
                        filled: 0,
                    };
                }
            }
            ArgKind::Append => store(arg, token, result)?,
            _ => {
                store(arg, token, result)?;
                self.positional.ordinal += 1;
            }
        }
        Ok(())
    }

    fn finish_positionals(&self) -> Result<(), ErrorKind> {
        let cursor = self.positional;
        if cursor.filled == 0 {
            return Ok(());
        }
        let Some(&slot) = self.cmd.index.positionals.get(cursor.ordinal) else {
            return Ok(());
        };
        let arg = self.cmd.arg_at(slot);
        match arg.get_kind() {
            ArgKind::Nargs(n) => Err(ErrorKind::InsufficientValues {
                name: arg.get_name().to_string(),
                expected: n,
                got: cursor.filled,
            }),
            _ => Ok(()),
        }
    }
}

/// Store one raw value, splitting on the delimiter and checking each piece.
fn store(arg: &Arg, raw: &str, result: &mut ParseResult) -> Result<(), ErrorKind> {
    let name = arg.get_name();
    result.begin(name);
    match arg.get_kind() {
        ArgKind::Map => {
            for piece in arg.split_raw(raw) {
                let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
                arg.check_value(value)?;
                result.insert_pair(name, key, value);
            }
        }
        _ if arg.collects() => {
            result.touch_list(name);
            for piece in arg.split_raw(raw) {
                arg.check_value(piece)?;
                result.push_value(name, piece);
            }
        }
        _ => {
            arg.check_value(raw)?;
            result.set_value(name, raw);
        }
    }
    Ok(())
}

/// Signed-number grammar without the sign: `N`, `N.N`, `.N`, each optionally
/// followed by `e[+-]X`.
pub(crate) fn looks_like_number(body: &str) -> bool {
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (mantissa, None),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) {
        return false;
    }
    match frac_part {
        Some(frac) if frac.is_empty() || !all_digits(frac) => return false,
        None if int_part.is_empty() => return false,
        _ => {}
    }

    match exponent {
        None => true,
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
    }
}
