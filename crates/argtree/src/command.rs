use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::arg::{Arg, ArgKind};
use crate::dispatch::{self, NoHook, ParseOutcome, TriggerHook};
use crate::error::{BuildError, ParseError};

pub(crate) const HELP_SUBCOMMAND: &str = "help";

/// A conditional requirement: `target` must be present whenever `condition` is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredIf {
    pub target: String,
    pub condition: String,
}

/// Cross-argument rules declared on one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    pub mutually_exclusive: Vec<Vec<String>>,
    pub one_required: Vec<Vec<String>>,
    pub required_together: Vec<Vec<String>>,
    pub required_if: Vec<RequiredIf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Settings {
    allow_negative_numbers: bool,
    subcommand_required: bool,
    exclusive_subcommands: bool,
    help_subcommand: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_negative_numbers: false,
            subcommand_required: false,
            exclusive_subcommands: false,
            help_subcommand: true,
        }
    }
}

/// Mutable description of a command, turned into a [`Command`] by [`CommandBuilder::build`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    name: String,
    about: String,
    version: Option<String>,
    aliases: Vec<String>,
    hidden: bool,
    args: Vec<Arg>,
    subcommands: Vec<CommandBuilder>,
    groups: Groups,
    settings: Settings,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            version: None,
            aliases: Vec::new(),
            hidden: false,
            args: Vec::new(),
            subcommands: Vec::new(),
            groups: Groups::default(),
            settings: Settings::default(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    /// Declaring a version enables the `-V`/`--version` trigger.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn subcommand(mut self, subcommand: CommandBuilder) -> Self {
        self.subcommands.push(subcommand);
        self
    }

    /// At most one of `names` may be present.
    pub fn mutually_exclusive<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .mutually_exclusive
            .push(names.into_iter().map(Into::into).collect());
        self
    }

    /// At least one of `names` must be present.
    pub fn one_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .one_required
            .push(names.into_iter().map(Into::into).collect());
        self
    }

    /// If any of `names` is present, all of them must be.
    pub fn required_together<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .required_together
            .push(names.into_iter().map(Into::into).collect());
        self
    }

    /// `target` is required whenever `condition` is present.
    pub fn required_if(mut self, target: impl Into<String>, condition: impl Into<String>) -> Self {
        self.groups.required_if.push(RequiredIf {
            target: target.into(),
            condition: condition.into(),
        });
        self
    }

    /// Treat `-5`, `-1.5e3` and friends as positionals even when a digit is
    /// registered as a short name.
    pub fn allow_negative_numbers(mut self, allow: bool) -> Self {
        self.settings.allow_negative_numbers = allow;
        self
    }

    pub fn subcommand_required(mut self, required: bool) -> Self {
        self.settings.subcommand_required = required;
        self
    }

    /// Reject bare tokens that do not name a subcommand instead of treating
    /// them as positionals. Such a command cannot declare positionals.
    pub fn exclusive_subcommands(mut self, exclusive: bool) -> Self {
        self.settings.exclusive_subcommands = exclusive;
        self
    }

    /// Register the `help <subcommand>` pseudo-subcommand (on by default).
    pub fn help_subcommand(mut self, enabled: bool) -> Self {
        self.settings.help_subcommand = enabled;
        self
    }

    /// Check the whole tree and freeze it.
    pub fn build(self) -> Result<Command, BuildError> {
        self.build_with(&[])
    }

    fn build_with(self, inherited: &[Arg]) -> Result<Command, BuildError> {
        let command = self.name.clone();
        if command.trim().is_empty() || command.starts_with('-') {
            return Err(BuildError::invalid_command(
                &command,
                "command names must be non-empty and not start with '-'",
            ));
        }

        let mut args = self.args;
        for arg in &args {
            arg.validate()?;
        }

        let mut names: HashSet<&str> = HashSet::new();
        for arg in args.iter().chain(inherited) {
            if !names.insert(arg.get_name()) {
                return Err(BuildError::conflict(
                    &command,
                    [arg.get_name()],
                    "argument name is declared twice",
                ));
            }
        }

        let mut next_index = 0;
        let mut open_ended = false;
        for arg in args.iter_mut().filter(|a| a.is_positional()) {
            if open_ended {
                return Err(BuildError::invalid_arg(
                    arg.get_name(),
                    "no positional argument may follow an append positional",
                ));
            }
            arg.index = Some(next_index);
            next_index += 1;
            open_ended = arg.get_kind() == ArgKind::Append;
        }

        let index = ArgIndex::build(&command, &args, inherited)?;
        check_groups(&command, &self.groups, args.iter().chain(inherited))?;

        if self.settings.exclusive_subcommands
            && !self.subcommands.is_empty()
            && !index.positionals.is_empty()
        {
            return Err(BuildError::invalid_command(
                &command,
                "exclusive subcommands cannot be mixed with positional arguments",
            ));
        }
        if self.settings.subcommand_required && self.subcommands.is_empty() {
            return Err(BuildError::invalid_command(
                &command,
                "a subcommand is required but none are registered",
            ));
        }

        let mut child_names: HashMap<String, String> = HashMap::new();
        for sub in &self.subcommands {
            for alias in std::iter::once(&sub.name).chain(sub.aliases.iter()) {
                if let Some(prev) = child_names.insert(alias.clone(), sub.name.clone()) {
                    return Err(BuildError::conflict(
                        &command,
                        [prev, sub.name.clone()],
                        format!("subcommand name '{alias}' is registered twice"),
                    ));
                }
            }
        }
        let help_subcommand = self.settings.help_subcommand
            && !self.subcommands.is_empty()
            && !child_names.contains_key(HELP_SUBCOMMAND);

        let mut child_inherited: Vec<Arg> = inherited.to_vec();
        child_inherited.extend(args.iter().filter(|a| a.is_persistent()).cloned());

        let subcommands = self
            .subcommands
            .into_iter()
            .map(|sub| sub.build_with(&child_inherited))
            .collect::<Result<Vec<_>, _>>()?;

        let help_claimed = index.longs.contains_key("help");
        let short_help_claimed = index.shorts.contains_key(&'h');
        let has_version = self.version.is_some();
        let triggers = Triggers {
            long_help: !help_claimed,
            short_help: !short_help_claimed,
            long_version: has_version && !index.longs.contains_key("version"),
            short_version: has_version && !index.shorts.contains_key(&'V'),
        };

        Ok(Command {
            name: self.name,
            about: self.about,
            version: self.version,
            aliases: self.aliases,
            hidden: self.hidden,
            args,
            inherited: inherited.to_vec(),
            subcommands,
            groups: self.groups,
            allow_negative_numbers: self.settings.allow_negative_numbers,
            subcommand_required: self.settings.subcommand_required,
            exclusive_subcommands: self.settings.exclusive_subcommands,
            help_subcommand,
            triggers,
            index,
        })
    }
}

/// Group members may name local or inherited arguments.
fn check_groups<'a>(
    command: &str,
    groups: &Groups,
    args: impl Iterator<Item = &'a Arg>,
) -> Result<(), BuildError> {
    let known: HashSet<&str> = args.map(Arg::get_name).collect();
    let sets = [
        ("mutually-exclusive", &groups.mutually_exclusive),
        ("one-required", &groups.one_required),
        ("required-together", &groups.required_together),
    ];
    for (rule, sets) in sets {
        for set in sets {
            if set.is_empty() {
                return Err(BuildError::invalid_command(
                    command,
                    format!("empty {rule} group"),
                ));
            }
            for name in set {
                if !known.contains(name.as_str()) {
                    return Err(BuildError::UnknownReference {
                        command: command.to_string(),
                        rule,
                        name: name.clone(),
                    });
                }
            }
        }
    }
    for pair in &groups.required_if {
        for name in [&pair.target, &pair.condition] {
            if !known.contains(name.as_str()) {
                return Err(BuildError::UnknownReference {
                    command: command.to_string(),
                    rule: "required-if",
                    name: name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Where a long spelling resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LongTarget {
    pub(crate) slot: usize,
    pub(crate) negated: bool,
}

/// Lookup tables over the effective arguments (local first, then inherited).
#[derive(Debug, Clone, Default)]
pub(crate) struct ArgIndex {
    pub(crate) longs: IndexMap<String, LongTarget>,
    pub(crate) shorts: HashMap<char, usize>,
    pub(crate) positionals: Vec<usize>,
    pub(crate) digit_short: bool,
}

impl ArgIndex {
    fn build(command: &str, args: &[Arg], inherited: &[Arg]) -> Result<Self, BuildError> {
        let mut index = ArgIndex::default();
        let effective: Vec<(&Arg, bool)> = args
            .iter()
            .map(|a| (a, false))
            .chain(inherited.iter().map(|a| (a, true)))
            .collect();

        for (slot, &(arg, is_inherited)) in effective.iter().enumerate() {
            if arg.is_positional() {
                index.positionals.push(slot);
                continue;
            }

            let mut spellings: Vec<(String, bool)> = Vec::new();
            if let Some(long) = arg.get_long() {
                spellings.push((long.to_string(), false));
            }
            for alias in arg.get_aliases() {
                spellings.push((alias.clone(), false));
            }
            if let Some(negated) = arg.negated_long() {
                spellings.push((negated, true));
            }

            for (spelling, negated) in spellings {
                let target = LongTarget { slot, negated };
                if let Some(prev) = index.longs.insert(spelling.clone(), target) {
                    let (prev_arg, prev_inherited) = effective[prev.slot];
                    return Err(BuildError::conflict(
                        command,
                        [prev_arg.get_name(), arg.get_name()],
                        conflict_reason(&format!("--{spelling}"), prev_inherited || is_inherited),
                    ));
                }
            }

            if let Some(short) = arg.get_short() {
                if let Some(prev) = index.shorts.insert(short, slot) {
                    let (prev_arg, prev_inherited) = effective[prev];
                    return Err(BuildError::conflict(
                        command,
                        [prev_arg.get_name(), arg.get_name()],
                        conflict_reason(&format!("-{short}"), prev_inherited || is_inherited),
                    ));
                }
                index.digit_short |= short.is_ascii_digit();
            }
        }
        Ok(index)
    }
}

fn conflict_reason(spelling: &str, persistent: bool) -> String {
    if persistent {
        format!("{spelling} collides with a persistent argument of an ancestor")
    } else {
        format!("{spelling} maps to more than one argument")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Triggers {
    pub(crate) long_help: bool,
    pub(crate) short_help: bool,
    pub(crate) long_version: bool,
    pub(crate) short_version: bool,
}

/// An immutable, checked command tree.
///
/// Parsing never mutates it, so one `Command` can serve any number of
/// parses, including from several threads at once.
#[derive(Debug, Clone)]
pub struct Command {
    name: String,
    about: String,
    version: Option<String>,
    aliases: Vec<String>,
    hidden: bool,
    args: Vec<Arg>,
    inherited: Vec<Arg>,
    subcommands: Vec<Command>,
    groups: Groups,
    allow_negative_numbers: bool,
    subcommand_required: bool,
    exclusive_subcommands: bool,
    help_subcommand: bool,
    pub(crate) triggers: Triggers,
    pub(crate) index: ArgIndex,
}

impl Command {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Parse `tokens` (without the program name).
    pub fn parse<I, T>(&self, tokens: I) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.parse_with_hook(tokens, &mut NoHook)
    }

    /// Parse a full argument vector whose first element is the program name.
    pub fn parse_argv<I, T>(&self, argv: I) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.parse(argv.into_iter().skip(1))
    }

    /// Parse `tokens`, calling `hook` when a help or version trigger is found.
    pub fn parse_with_hook<I, T>(
        &self,
        tokens: I,
        hook: &mut dyn TriggerHook,
    ) -> Result<ParseOutcome, ParseError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(|t| t.as_ref().to_string()).collect();
        dispatch::parse(self, &tokens, hook)
    }
}

// Read-only view for help renderers.
impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn about(&self) -> &str {
        &self.about
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Arguments registered on this command, in registration order.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Persistent arguments copied in from ancestors.
    pub fn inherited_args(&self) -> &[Arg] {
        &self.inherited
    }

    /// Local arguments followed by inherited ones.
    pub fn effective_args(&self) -> impl Iterator<Item = &Arg> {
        self.args.iter().chain(self.inherited.iter())
    }

    pub fn positionals(&self) -> impl Iterator<Item = &Arg> {
        self.index.positionals.iter().map(|&slot| self.arg_at(slot))
    }

    pub fn get_arg(&self, name: &str) -> Option<&Arg> {
        self.effective_args().find(|a| a.get_name() == name)
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    /// Find a child by name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommands
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                self.subcommands
                    .iter()
                    .find(|c| c.aliases.iter().any(|a| a == name))
            })
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn allows_negative_numbers(&self) -> bool {
        self.allow_negative_numbers
    }

    pub fn is_subcommand_required(&self) -> bool {
        self.subcommand_required
    }

    pub fn has_exclusive_subcommands(&self) -> bool {
        self.exclusive_subcommands
    }

    /// Whether `help <subcommand>` is recognized on this command.
    pub fn has_help_subcommand(&self) -> bool {
        self.help_subcommand
    }

    /// Names accepted as subcommands, including the help pseudo-subcommand.
    pub fn subcommand_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.subcommands.iter().map(|c| c.name.clone()).collect();
        if self.help_subcommand {
            names.push(HELP_SUBCOMMAND.to_string());
        }
        names
    }
}

impl Command {
    pub(crate) fn arg_at(&self, slot: usize) -> &Arg {
        if slot < self.args.len() {
            &self.args[slot]
        } else {
            &self.inherited[slot - self.args.len()]
        }
    }

    /// Maximum number of positional tokens, or `None` when the last
    /// positional collects the rest.
    pub(crate) fn positional_capacity(&self) -> Option<usize> {
        let mut capacity = 0;
        for arg in self.positionals() {
            match arg.get_kind() {
                ArgKind::Append => return None,
                ArgKind::Nargs(n) => capacity += n,
                _ => capacity += 1,
            }
        }
        Some(capacity)
    }

    /// The token that triggers help on this command, if any is free.
    pub(crate) fn help_token(&self) -> Option<&'static str> {
        if self.triggers.long_help {
            Some("--help")
        } else if self.triggers.short_help {
            Some("-h")
        } else {
            None
        }
    }
}
