//! Serializable command-tree definitions.
//!
//! The types here mirror the engine's builder values so a whole tree can be
//! kept in a JSON file and turned into an [`argtree::Command`]. They are
//! also used the other way round: [`CommandSchema::from_command`] snapshots
//! a built tree for help renderers and other read-only consumers.

use argtree::{Arg, ArgKind, BuildError, Command, CommandBuilder, RequiredIf};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum KindSchema {
    #[default]
    Flag,
    Count,
    Value,
    Append,
    /// Written as `{"nargs": 2}`.
    Nargs(usize),
    Map,
}

impl From<KindSchema> for ArgKind {
    fn from(kind: KindSchema) -> Self {
        match kind {
            KindSchema::Flag => ArgKind::Flag,
            KindSchema::Count => ArgKind::Count,
            KindSchema::Value => ArgKind::Value,
            KindSchema::Append => ArgKind::Append,
            KindSchema::Nargs(n) => ArgKind::Nargs(n),
            KindSchema::Map => ArgKind::Map,
        }
    }
}

impl From<ArgKind> for KindSchema {
    fn from(kind: ArgKind) -> Self {
        match kind {
            ArgKind::Flag => KindSchema::Flag,
            ArgKind::Count => KindSchema::Count,
            ArgKind::Value => KindSchema::Value,
            ArgKind::Append => KindSchema::Append,
            ArgKind::Nargs(n) => KindSchema::Nargs(n),
            ArgKind::Map => KindSchema::Map,
        }
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSchema {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RequiredIfSchema {
    pub target: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ArgSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub kind: KindSchema,
    #[serde(default)]
    pub positional: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub negatable: bool,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl ArgSchema {
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .aliases(self.aliases.iter())
            .kind(self.kind.into())
            .required(self.required)
            .choices(self.choices.iter())
            .negatable(self.negatable)
            .persistent(self.persistent)
            .hidden(self.hidden)
            .help(self.help.clone());
        if let Some(long) = &self.long {
            arg = arg.long(long);
        }
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if self.positional {
            arg = arg.positional();
        }
        if let Some(value) = &self.default_value {
            arg = arg.default_value(value.clone());
        }
        if let Some(range) = self.range {
            arg = arg.range(range.min, range.max);
        }
        if let Some(delimiter) = &self.delimiter {
            arg = arg.delimiter(delimiter.clone());
        }
        if let Some(metavar) = &self.metavar {
            arg = arg.metavar(metavar.clone());
        }
        if let Some(message) = &self.deprecated {
            arg = arg.deprecated(message.clone());
        }
        arg
    }

    pub fn from_arg(arg: &Arg) -> Self {
        Self {
            name: arg.get_name().to_string(),
            long: arg.get_long().map(str::to_string),
            short: arg.get_short(),
            aliases: arg.get_aliases().to_vec(),
            kind: arg.get_kind().into(),
            positional: arg.is_positional(),
            required: arg.is_required(),
            default_value: arg.get_default_value().map(str::to_string),
            choices: arg.get_choices().to_vec(),
            range: arg.get_range().map(|(min, max)| RangeSchema { min, max }),
            delimiter: arg.get_delimiter().map(str::to_string),
            negatable: arg.is_negatable(),
            persistent: arg.is_persistent(),
            hidden: arg.is_hidden(),
            metavar: arg.get_metavar().map(str::to_string),
            help: arg.get_help().to_string(),
            deprecated: arg.get_deprecated().map(str::to_string),
        }
    }
}

/// One node of a command tree.
///
/// `inherited-args` is filled by [`CommandSchema::from_command`] only and is
/// ignored when building: inherited arguments are derived from the
/// `persistent` flags of ancestors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherited_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutually_exclusive: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_required: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_together: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_if: Vec<RequiredIfSchema>,
    #[serde(default)]
    pub allow_negative_numbers: bool,
    #[serde(default)]
    pub subcommand_required: bool,
    #[serde(default)]
    pub exclusive_subcommands: bool,
    #[serde(default = "default_true")]
    pub help_subcommand: bool,
}

fn default_true() -> bool {
    true
}

impl CommandSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            version: None,
            aliases: Vec::new(),
            hidden: false,
            args: Vec::new(),
            inherited_args: Vec::new(),
            subcommands: Vec::new(),
            mutually_exclusive: Vec::new(),
            one_required: Vec::new(),
            required_together: Vec::new(),
            required_if: Vec::new(),
            allow_negative_numbers: false,
            subcommand_required: false,
            exclusive_subcommands: false,
            help_subcommand: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_builder(&self) -> CommandBuilder {
        let mut builder = Command::builder(self.name.clone())
            .about(self.about.clone())
            .hidden(self.hidden)
            .args(self.args.iter().map(ArgSchema::to_arg))
            .allow_negative_numbers(self.allow_negative_numbers)
            .subcommand_required(self.subcommand_required)
            .exclusive_subcommands(self.exclusive_subcommands)
            .help_subcommand(self.help_subcommand);
        if let Some(version) = &self.version {
            builder = builder.version(version.clone());
        }
        for alias in &self.aliases {
            builder = builder.alias(alias.clone());
        }
        for set in &self.mutually_exclusive {
            builder = builder.mutually_exclusive(set.iter());
        }
        for set in &self.one_required {
            builder = builder.one_required(set.iter());
        }
        for set in &self.required_together {
            builder = builder.required_together(set.iter());
        }
        for rule in &self.required_if {
            builder = builder.required_if(rule.target.clone(), rule.condition.clone());
        }
        for child in &self.subcommands {
            builder = builder.subcommand(child.to_builder());
        }
        builder
    }

    /// Build the engine command, running every registration check.
    pub fn build(&self) -> Result<Command, BuildError> {
        self.to_builder().build()
    }

    /// Snapshot a built command tree.
    pub fn from_command(cmd: &Command) -> Self {
        let groups = cmd.groups();
        Self {
            name: cmd.name().to_string(),
            about: cmd.about().to_string(),
            version: cmd.version().map(str::to_string),
            aliases: cmd.aliases().to_vec(),
            hidden: cmd.is_hidden(),
            args: cmd.args().iter().map(ArgSchema::from_arg).collect(),
            inherited_args: cmd
                .inherited_args()
                .iter()
                .map(|a| a.get_name().to_string())
                .collect(),
            subcommands: cmd.subcommands().iter().map(Self::from_command).collect(),
            mutually_exclusive: groups.mutually_exclusive.clone(),
            one_required: groups.one_required.clone(),
            required_together: groups.required_together.clone(),
            required_if: groups
                .required_if
                .iter()
                .map(|RequiredIf { target, condition }| RequiredIfSchema {
                    target: target.clone(),
                    condition: condition.clone(),
                })
                .collect(),
            allow_negative_numbers: cmd.allows_negative_numbers(),
            subcommand_required: cmd.is_subcommand_required(),
            exclusive_subcommands: cmd.has_exclusive_subcommands(),
            help_subcommand: cmd.has_help_subcommand(),
        }
    }
}
