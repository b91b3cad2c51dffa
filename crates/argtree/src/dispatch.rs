use crate::command::Command;
use crate::error::{ErrorKind, ParseError};
use crate::result::ParseResult;
use crate::scan::{Scanner, Stop, Trigger};
use crate::validate::validate;

/// Result of a successful parse call.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Tokens resolved and validated; the root of the result tree.
    Parsed(ParseResult),
    /// A help trigger was found on the command at `path`.
    Help { path: Vec<String> },
    /// A version trigger was found on the command at `path`.
    Version { path: Vec<String> },
}

/// Called when a help or version trigger is recognized, before the parse
/// returns. Rendering and deciding whether to exit are left to the
/// implementor; the engine only reports.
pub trait TriggerHook {
    fn help(&mut self, command: &Command, path: &[String]) {
        let _ = (command, path);
    }

    fn version(&mut self, command: &Command, path: &[String]) {
        let _ = (command, path);
    }
}

pub(crate) struct NoHook;

impl TriggerHook for NoHook {}

enum Level {
    Parsed(ParseResult),
    Triggered(Trigger, Vec<String>),
}

pub(crate) fn parse(
    cmd: &Command,
    tokens: &[String],
    hook: &mut dyn TriggerHook,
) -> Result<ParseOutcome, ParseError> {
    let mut path = vec![cmd.name().to_string()];
    match dispatch(cmd, tokens, ParseResult::default(), &mut path, hook)? {
        Level::Parsed(result) => Ok(ParseOutcome::Parsed(result)),
        Level::Triggered(Trigger::Help, path) => Ok(ParseOutcome::Help { path }),
        Level::Triggered(Trigger::Version, path) => Ok(ParseOutcome::Version { path }),
    }
}

/// Scan, descend and validate one level of the command tree.
///
/// `seed` holds the persistent values the parent already had; the child
/// owns its copies.
fn dispatch(
    cmd: &Command,
    tokens: &[String],
    seed: ParseResult,
    path: &mut Vec<String>,
    hook: &mut dyn TriggerHook,
) -> Result<Level, ParseError> {
    tracing::debug!(command = %path.join(" "), tokens = tokens.len(), "dispatching");
    let mut result = seed;
    let stop = Scanner::new(cmd, tokens)
        .scan(&mut result)
        .map_err(|kind| ParseError::new(path.as_slice(), kind))?;

    match stop {
        Stop::Done => {}
        Stop::Trigger(trigger) => return Ok(fire(cmd, trigger, path, hook)),
        Stop::Subcommand { child, next } => {
            let child = &cmd.subcommands()[child];
            if let Some(level) = descend(cmd, child, &tokens[next..], &mut result, path, hook)? {
                return Ok(level);
            }
        }
        Stop::HelpSubcommand { next } => {
            let Some(name) = tokens.get(next) else {
                return Ok(fire(cmd, Trigger::Help, path, hook));
            };
            let Some(child) = cmd.find_subcommand(name) else {
                return Err(ParseError::new(
                    path.as_slice(),
                    ErrorKind::UnknownSubcommand {
                        name: name.clone(),
                        available: cmd.subcommand_names(),
                    },
                ));
            };
            tracing::debug!(target_command = child.name(), "help pseudo-subcommand");
            let Some(help_token) = child.help_token() else {
                path.push(child.name().to_string());
                return Ok(fire(child, Trigger::Help, path, hook));
            };
            let mut forwarded: Vec<String> = tokens[next + 1..].to_vec();
            forwarded.push(help_token.to_string());
            if let Some(level) = descend(cmd, child, &forwarded, &mut result, path, hook)? {
                return Ok(level);
            }
        }
    }

    for arg in cmd.effective_args() {
        result.apply_default(arg);
    }
    if cmd.is_subcommand_required() && result.subcommand_name().is_none() {
        return Err(ParseError::new(
            path.as_slice(),
            ErrorKind::MissingSubcommand {
                available: cmd.subcommand_names(),
            },
        ));
    }
    validate(cmd, &result).map_err(|kind| ParseError::new(path.as_slice(), kind))?;
    Ok(Level::Parsed(result))
}

/// Dispatch into `child` and merge its result back.
///
/// Returns `Some` when the child stopped on a trigger and the parse should
/// end there.
fn descend(
    parent: &Command,
    child: &Command,
    tokens: &[String],
    result: &mut ParseResult,
    path: &mut Vec<String>,
    hook: &mut dyn TriggerHook,
) -> Result<Option<Level>, ParseError> {
    let mut seed = ParseResult::default();
    for arg in parent.effective_args().filter(|a| a.is_persistent()) {
        if result.is_present(arg.get_name()) {
            seed.copy_from(result, arg.get_name());
        }
    }

    path.push(child.name().to_string());
    let level = dispatch(child, tokens, seed, path, hook)?;
    path.pop();

    let child_result = match level {
        Level::Parsed(child_result) => child_result,
        triggered @ Level::Triggered(..) => return Ok(Some(triggered)),
    };

    for arg in parent.effective_args().filter(|a| a.is_persistent()) {
        let name = arg.get_name();
        if !result.is_present(name) && child_result.is_present(name) {
            tracing::trace!(arg = name, "persistent value synced upward");
            result.copy_from(&child_result, name);
        }
    }
    result.set_subcommand(child.name(), child_result);
    Ok(None)
}

fn fire(cmd: &Command, trigger: Trigger, path: &[String], hook: &mut dyn TriggerHook) -> Level {
    tracing::debug!(command = %path.join(" "), ?trigger, "trigger");
    match trigger {
        Trigger::Help => hook.help(cmd, path),
        Trigger::Version => hook.version(cmd, path),
    }
    Level::Triggered(trigger, path.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::{Arg, ArgKind};

    fn parsed(outcome: ParseOutcome) -> ParseResult {
        match outcome {
            ParseOutcome::Parsed(result) => result,
            other => panic!("expected Parsed, got: {other:?}"),
        }
    }

    fn tree() -> Command {
        Command::builder("app")
            .version("1.2.3")
            .arg(
                Arg::new("output")
                    .long("output")
                    .kind(ArgKind::Value)
                    .default_value("text")
                    .persistent(true),
            )
            .arg(Arg::new("verbose").short('v').kind(ArgKind::Count).persistent(true))
            .subcommand(
                Command::builder("search")
                    .alias("s")
                    .arg(Arg::new("query").positional().required(true)),
            )
            .subcommand(
                Command::builder("remote")
                    .arg(Arg::new("dry-run").long("dry-run").persistent(true))
                    .subcommand(
                        Command::builder("add")
                            .arg(Arg::new("name").positional().required(true))
                            .arg(Arg::new("url").positional().required(true)),
                    ),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn persistent_value_is_pushed_down() {
        let m = parsed(tree().parse(["--output", "json", "search", "x"]).unwrap());
        assert_eq!(m.value("output"), Some("json"));
        let (name, child) = m.subcommand().unwrap();
        assert_eq!(name, "search");
        assert_eq!(child.value("output"), Some("json"));
        assert!(!child.is_explicit("output"));
        assert_eq!(child.value("query"), Some("x"));
    }

    #[test]
    fn persistent_value_is_pulled_up() {
        let m = parsed(tree().parse(["search", "x", "--output", "yaml", "-vv"]).unwrap());
        assert_eq!(m.value("output"), Some("yaml"));
        assert_eq!(m.count("verbose"), 2);
        assert!(m.is_present("output"));
        assert!(!m.is_explicit("output"));
    }

    #[test]
    fn child_explicit_value_wins_over_parent() {
        let m = parsed(
            tree()
                .parse(["--output", "json", "search", "--output", "csv", "x"])
                .unwrap(),
        );
        assert_eq!(m.value("output"), Some("json"));
        let (_, child) = m.subcommand().unwrap();
        assert_eq!(child.value("output"), Some("csv"));
    }

    #[test]
    fn defaults_apply_at_every_level() {
        let m = parsed(tree().parse(["s", "x"]).unwrap());
        assert_eq!(m.value("output"), Some("text"));
        assert_eq!(m.subcommand_name(), Some("search"));
        let (_, child) = m.subcommand().unwrap();
        assert_eq!(child.value("output"), Some("text"));
        assert!(!child.is_present("output"));
    }

    #[test]
    fn persistent_values_cross_two_levels() {
        let m = parsed(
            tree()
                .parse(["-v", "remote", "add", "origin", "git@x", "--dry-run", "-v"])
                .unwrap(),
        );
        let (_, remote) = m.subcommand().unwrap();
        let (_, add) = remote.subcommand().unwrap();
        assert_eq!(add.count("verbose"), 1);
        assert!(add.is_explicit("verbose"));
        assert!(add.flag("dry-run"));
        assert!(remote.flag("dry-run"));
        assert_eq!(remote.count("verbose"), 1);
        assert_eq!(m.count("verbose"), 1);
        assert_eq!(add.value("url"), Some("git@x"));
    }

    #[test]
    fn errors_below_the_root_carry_the_path() {
        let err = tree().parse(["remote", "add", "origin"]).unwrap_err();
        assert_eq!(err.path(), ["app", "remote", "add"]);
        assert_eq!(err.kind(), &ErrorKind::MissingRequired("url".to_string()));
        assert_eq!(err.to_string(), "app remote add: missing required argument: url");
    }

    #[test]
    fn help_trigger_reports_the_path() {
        let outcome = tree().parse(["remote", "add", "--help"]).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Help {
                path: vec!["app".into(), "remote".into(), "add".into()]
            }
        );
        let outcome = tree().parse(["-V", "search"]).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Version {
                path: vec!["app".into()]
            }
        );
    }

    #[test]
    fn help_pseudo_subcommand_forwards_to_sibling() {
        let outcome = tree().parse(["help", "remote", "add"]).unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Help {
                path: vec!["app".into(), "remote".into(), "add".into()]
            }
        );
        assert_eq!(
            tree().parse(["help"]).unwrap(),
            ParseOutcome::Help {
                path: vec!["app".into()]
            }
        );
        let err = tree().parse(["help", "nope"]).unwrap_err();
        match err.kind() {
            ErrorKind::UnknownSubcommand { name, available } => {
                assert_eq!(name, "nope");
                assert_eq!(available, &["search", "remote", "help"]);
            }
            other => panic!("expected UnknownSubcommand, got: {other:?}"),
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(String, Vec<String>)>,
    }

    impl TriggerHook for Recorder {
        fn help(&mut self, command: &Command, path: &[String]) {
            self.seen.push((command.name().to_string(), path.to_vec()));
        }
    }

    #[test]
    fn hook_sees_the_triggering_command() {
        let mut hook = Recorder::default();
        let outcome = tree()
            .parse_with_hook(["search", "-h"], &mut hook)
            .unwrap();
        assert!(matches!(outcome, ParseOutcome::Help { .. }));
        assert_eq!(
            hook.seen,
            vec![("search".to_string(), vec!["app".to_string(), "search".to_string()])]
        );
    }

    #[test]
    fn missing_subcommand_when_required() {
        let cmd = Command::builder("git")
            .subcommand_required(true)
            .subcommand(Command::builder("status"))
            .build()
            .unwrap();
        match cmd.parse(Vec::<String>::new()).unwrap_err().into_kind() {
            ErrorKind::MissingSubcommand { available } => {
                assert_eq!(available, vec!["status".to_string(), "help".to_string()]);
            }
            other => panic!("expected MissingSubcommand, got: {other:?}"),
        }
    }

    #[test]
    fn parse_argv_skips_program_name() {
        let m = parsed(tree().parse_argv(["app", "search", "q"]).unwrap());
        assert_eq!(m.subcommand_name(), Some("search"));
    }

    #[test]
    fn repeated_parses_are_identical() {
        let cmd = tree();
        let tokens = ["-vv", "--output=json", "remote", "add", "a", "b"];
        let first = cmd.parse(tokens).unwrap();
        let second = cmd.parse(tokens).unwrap();
        assert_eq!(first, second);
    }
}
