use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::arg::{Arg, ArgKind};

/// Values resolved for one command level.
///
/// Every accessor returns exactly what was typed (or split out of it); no
/// trimming or case folding is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    values: IndexMap<String, String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    flags: IndexMap<String, bool>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    counts: IndexMap<String, u64>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    lists: IndexMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    maps: IndexMap<String, IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    positionals: Vec<String>,
    #[serde(skip)]
    explicit: IndexSet<String>,
    #[serde(skip)]
    propagated: IndexSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subcommand: Option<Box<SubcommandMatch>>,
}

/// The subcommand matched below a command level, with its own result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubcommandMatch {
    pub name: String,
    pub result: ParseResult,
}

/// One stored value, whatever its shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Value(String),
    Flag(bool),
    Count(u64),
    List(Vec<String>),
    Map(IndexMap<String, String>),
}

impl ParseResult {
    /// Scalar value of a `Value` argument (or a value positional).
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Collected values of an `Append`, `Nargs` or delimited argument.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    /// State of a flag; `false` when it was never set.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Occurrences of a `Count` argument; `0` when it was never set.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn map(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.maps.get(name)
    }

    /// All positional tokens in input order, including ones past the last
    /// positional argument.
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// Whether the argument was provided on the command line at this level
    /// or carried over from a persistent ancestor or descendant.
    ///
    /// Defaults do not count.
    pub fn is_present(&self, name: &str) -> bool {
        self.explicit.contains(name) || self.propagated.contains(name)
    }

    /// Whether the argument was provided by tokens scanned at this level.
    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit.contains(name)
    }

    /// Whether any value (including a default) is stored for the argument.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.flags.contains_key(name)
            || self.counts.contains_key(name)
            || self.lists.contains_key(name)
            || self.maps.contains_key(name)
    }

    pub fn subcommand_name(&self) -> Option<&str> {
        self.subcommand.as_ref().map(|s| s.name.as_str())
    }

    pub fn subcommand(&self) -> Option<(&str, &ParseResult)> {
        self.subcommand
            .as_ref()
            .map(|s| (s.name.as_str(), &s.result))
    }

    pub fn into_subcommand(self) -> Option<(String, ParseResult)> {
        self.subcommand.map(|s| (s.name, s.result))
    }
}

impl ParseResult {
    /// Record an occurrence of `name` at this level.
    ///
    /// The first occurrence discards anything stored before it (a default
    /// or a value copied from another level).
    pub(crate) fn begin(&mut self, name: &str) {
        if self.explicit.contains(name) {
            return;
        }
        self.remove_entry(name);
        self.propagated.shift_remove(name);
        self.explicit.insert(name.to_string());
    }

    pub(crate) fn set_value(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn set_flag(&mut self, name: &str, on: bool) {
        self.flags.insert(name.to_string(), on);
    }

    pub(crate) fn increment(&mut self, name: &str) {
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
    }

    pub(crate) fn touch_list(&mut self, name: &str) {
        self.lists.entry(name.to_string()).or_default();
    }

    pub(crate) fn push_value(&mut self, name: &str, value: &str) {
        self.lists
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub(crate) fn insert_pair(&mut self, name: &str, key: &str, value: &str) {
        self.maps
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub(crate) fn push_positional(&mut self, token: &str) {
        self.positionals.push(token.to_string());
    }

    pub(crate) fn set_subcommand(&mut self, name: &str, result: ParseResult) {
        self.subcommand = Some(Box::new(SubcommandMatch {
            name: name.to_string(),
            result,
        }));
    }

    pub(crate) fn entry(&self, name: &str) -> Option<Entry> {
        if let Some(v) = self.values.get(name) {
            return Some(Entry::Value(v.clone()));
        }
        if let Some(v) = self.flags.get(name) {
            return Some(Entry::Flag(*v));
        }
        if let Some(v) = self.counts.get(name) {
            return Some(Entry::Count(*v));
        }
        if let Some(v) = self.lists.get(name) {
            return Some(Entry::List(v.clone()));
        }
        self.maps.get(name).map(|v| Entry::Map(v.clone()))
    }

    fn put_entry(&mut self, name: &str, entry: Entry) {
        let key = name.to_string();
        match entry {
            Entry::Value(v) => {
                self.values.insert(key, v);
            }
            Entry::Flag(v) => {
                self.flags.insert(key, v);
            }
            Entry::Count(v) => {
                self.counts.insert(key, v);
            }
            Entry::List(v) => {
                self.lists.insert(key, v);
            }
            Entry::Map(v) => {
                self.maps.insert(key, v);
            }
        }
    }

    fn remove_entry(&mut self, name: &str) {
        self.values.shift_remove(name);
        self.flags.shift_remove(name);
        self.counts.shift_remove(name);
        self.lists.shift_remove(name);
        self.maps.shift_remove(name);
    }

    /// Copy the value of a persistent argument from another level.
    ///
    /// The copy is owned by this result; later changes on either side are
    /// not shared.
    pub(crate) fn copy_from(&mut self, other: &ParseResult, name: &str) {
        let Some(entry) = other.entry(name) else {
            return;
        };
        self.remove_entry(name);
        self.put_entry(name, entry);
        self.propagated.insert(name.to_string());
    }

    /// Store the declared default (or the kind's empty value) when nothing
    /// else is stored for the argument.
    pub(crate) fn apply_default(&mut self, arg: &Arg) {
        let name = arg.get_name();
        if self.contains(name) {
            return;
        }
        let Some(raw) = arg.get_default_value() else {
            match arg.get_kind() {
                ArgKind::Flag => self.set_flag(name, false),
                ArgKind::Count => {
                    self.counts.insert(name.to_string(), 0);
                }
                _ => {}
            }
            return;
        };

        // Defaults were checked against the kind when the command was built.
        match arg.get_kind() {
            ArgKind::Flag => self.set_flag(name, raw.parse().unwrap_or(false)),
            ArgKind::Count => {
                self.counts.insert(name.to_string(), raw.parse().unwrap_or(0));
            }
            ArgKind::Map => {
                for piece in arg.split_raw(raw) {
                    let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
                    self.insert_pair(name, key, value);
                }
            }
            _ if arg.collects() => {
                self.touch_list(name);
                for piece in arg.split_raw(raw) {
                    self.push_value(name, piece);
                }
            }
            _ => self.set_value(name, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_discards_values_from_other_levels_once() {
        let mut parent = ParseResult::default();
        parent.begin("tag");
        parent.push_value("tag", "a");

        let mut child = ParseResult::default();
        child.copy_from(&parent, "tag");
        assert!(child.is_present("tag"));
        assert!(!child.is_explicit("tag"));

        child.begin("tag");
        child.push_value("tag", "b");
        child.begin("tag");
        child.push_value("tag", "c");
        assert_eq!(child.values("tag"), Some(&["b".to_string(), "c".to_string()][..]));
        assert_eq!(parent.values("tag"), Some(&["a".to_string()][..]));
    }

    #[test]
    fn defaults_fill_only_missing_entries() {
        let format = Arg::new("format")
            .long("format")
            .kind(ArgKind::Value)
            .default_value("text");
        let verbose = Arg::new("verbose").long("verbose").kind(ArgKind::Count);

        let mut result = ParseResult::default();
        result.begin("format");
        result.set_value("format", "json");
        result.apply_default(&format);
        result.apply_default(&verbose);

        assert_eq!(result.value("format"), Some("json"));
        assert_eq!(result.count("verbose"), 0);
        assert!(!result.is_present("verbose"));
    }

    #[test]
    fn delimited_defaults_are_split() {
        let arg = Arg::new("tags")
            .long("tags")
            .kind(ArgKind::Append)
            .delimiter(",")
            .default_value("a,b");
        let mut result = ParseResult::default();
        result.apply_default(&arg);
        assert_eq!(
            result.values("tags"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert!(!result.is_present("tags"));
    }

    #[test]
    fn serializes_only_populated_fields() {
        let mut result = ParseResult::default();
        result.begin("json");
        result.set_flag("json", true);
        result.push_positional("x");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "flags": { "json": true }, "positionals": ["x"] })
        );
    }
}
