use crate::command::Command;
use crate::error::ErrorKind;
use crate::result::ParseResult;

/// Check the cross-argument rules of one command level.
///
/// Rules run in a fixed order and the first violation is returned: required
/// arguments, positional count, then each group kind in declaration order.
pub(crate) fn validate(cmd: &Command, result: &ParseResult) -> Result<(), ErrorKind> {
    for arg in cmd.effective_args().filter(|a| a.is_required()) {
        let name = arg.get_name();
        if !result.is_present(name) && arg.get_default_value().is_none() {
            return Err(ErrorKind::MissingRequired(name.to_string()));
        }
    }

    if let Some(expected) = cmd.positional_capacity() {
        let got = result.positionals().len();
        if got > expected {
            return Err(ErrorKind::TooManyPositionals { expected, got });
        }
    }

    let groups = cmd.groups();
    for set in &groups.mutually_exclusive {
        let present = members(set, result, true);
        if present.len() > 1 {
            return Err(ErrorKind::MutuallyExclusiveViolation(present));
        }
    }

    for set in &groups.one_required {
        if members(set, result, true).is_empty() {
            return Err(ErrorKind::OneRequiredViolation(set.clone()));
        }
    }

    for set in &groups.required_together {
        let missing = members(set, result, false);
        if !missing.is_empty() && missing.len() < set.len() {
            return Err(ErrorKind::RequiredTogetherViolation(missing));
        }
    }

    for rule in &groups.required_if {
        if result.is_present(&rule.condition) && !result.is_present(&rule.target) {
            return Err(ErrorKind::ConditionalRequirementViolation {
                target: rule.target.clone(),
                condition: rule.condition.clone(),
            });
        }
    }

    Ok(())
}

/// Members of `set` whose presence equals `present`, in declaration order.
fn members(set: &[String], result: &ParseResult, present: bool) -> Vec<String> {
    set.iter()
        .filter(|name| result.is_present(name) == present)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg::{Arg, ArgKind};

    fn flags(names: &[&str]) -> Vec<Arg> {
        names
            .iter()
            .map(|name| Arg::new(*name).long(*name))
            .collect()
    }

    fn present(names: &[&str]) -> ParseResult {
        let mut result = ParseResult::default();
        for name in names {
            result.begin(name);
            result.set_flag(name, true);
        }
        result
    }

    #[test]
    fn required_accepts_declared_default() {
        let cmd = Command::builder("app")
            .arg(
                Arg::new("format")
                    .long("format")
                    .kind(ArgKind::Value)
                    .required(true)
                    .default_value("text"),
            )
            .arg(Arg::new("name").long("name").kind(ArgKind::Value).required(true))
            .build()
            .unwrap();

        let err = validate(&cmd, &ParseResult::default()).unwrap_err();
        assert_eq!(err, ErrorKind::MissingRequired("name".to_string()));
    }

    #[test]
    fn required_runs_before_groups() {
        let cmd = Command::builder("app")
            .args(flags(&["json", "yaml"]))
            .arg(Arg::new("name").long("name").kind(ArgKind::Value).required(true))
            .mutually_exclusive(["json", "yaml"])
            .build()
            .unwrap();

        let err = validate(&cmd, &present(&["json", "yaml"])).unwrap_err();
        assert_eq!(err, ErrorKind::MissingRequired("name".to_string()));
    }

    #[test]
    fn surplus_positionals_are_counted() {
        let cmd = Command::builder("app")
            .arg(Arg::new("src").positional())
            .build()
            .unwrap();
        let mut result = ParseResult::default();
        result.push_positional("a");
        result.push_positional("b");

        match validate(&cmd, &result) {
            Err(ErrorKind::TooManyPositionals { expected, got }) => {
                assert_eq!((expected, got), (1, 2));
            }
            other => panic!("expected TooManyPositionals, got: {other:?}"),
        }
    }

    #[test]
    fn mutually_exclusive_names_only_offenders() {
        let cmd = Command::builder("app")
            .args(flags(&["json", "yaml", "toml"]))
            .mutually_exclusive(["json", "yaml", "toml"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&["yaml"])).is_ok());
        let err = validate(&cmd, &present(&["toml", "json"])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::MutuallyExclusiveViolation(vec!["json".into(), "toml".into()])
        );
    }

    #[test]
    fn defaults_do_not_count_as_present() {
        let cmd = Command::builder("app")
            .arg(Arg::new("json").long("json"))
            .arg(
                Arg::new("format")
                    .long("format")
                    .kind(ArgKind::Value)
                    .default_value("text"),
            )
            .mutually_exclusive(["json", "format"])
            .build()
            .unwrap();

        let mut result = present(&["json"]);
        result.apply_default(cmd.get_arg("format").unwrap());
        assert!(validate(&cmd, &result).is_ok());
    }

    #[test]
    fn one_required_allows_several_members() {
        let cmd = Command::builder("app")
            .args(flags(&["file", "stdin"]))
            .one_required(["file", "stdin"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&["file", "stdin"])).is_ok());
        let err = validate(&cmd, &present(&[])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::OneRequiredViolation(vec!["file".into(), "stdin".into()])
        );
    }

    #[test]
    fn one_required_and_mutually_exclusive_compose_to_exactly_one() {
        let cmd = Command::builder("app")
            .args(flags(&["file", "stdin"]))
            .mutually_exclusive(["file", "stdin"])
            .one_required(["file", "stdin"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&["stdin"])).is_ok());
        assert!(matches!(
            validate(&cmd, &present(&[])),
            Err(ErrorKind::OneRequiredViolation(_))
        ));
        assert!(matches!(
            validate(&cmd, &present(&["file", "stdin"])),
            Err(ErrorKind::MutuallyExclusiveViolation(_))
        ));
    }

    #[test]
    fn sets_are_checked_independently() {
        let cmd = Command::builder("app")
            .args(flags(&["a", "b", "c", "d"]))
            .mutually_exclusive(["a", "b"])
            .mutually_exclusive(["c", "d"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&["a", "c"])).is_ok());
        let err = validate(&cmd, &present(&["a", "c", "d"])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::MutuallyExclusiveViolation(vec!["c".into(), "d".into()])
        );
    }

    #[test]
    fn one_required_sets_are_checked_independently() {
        let cmd = Command::builder("app")
            .args(flags(&["file", "stdin", "json", "yaml"]))
            .one_required(["file", "stdin"])
            .one_required(["json", "yaml"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&["stdin", "yaml"])).is_ok());
        let err = validate(&cmd, &present(&["file"])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::OneRequiredViolation(vec!["json".into(), "yaml".into()])
        );
        let err = validate(&cmd, &present(&["json"])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::OneRequiredViolation(vec!["file".into(), "stdin".into()])
        );
    }

    #[test]
    fn required_together_reports_missing_members() {
        let cmd = Command::builder("app")
            .args(flags(&["username", "password", "host"]))
            .required_together(["username", "password", "host"])
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&[])).is_ok());
        assert!(validate(&cmd, &present(&["username", "password", "host"])).is_ok());
        let err = validate(&cmd, &present(&["password"])).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::RequiredTogetherViolation(vec!["username".into(), "host".into()])
        );
    }

    #[test]
    fn conditional_requirement_follows_condition() {
        let cmd = Command::builder("app")
            .args(flags(&["tls", "cert"]))
            .required_if("cert", "tls")
            .build()
            .unwrap();

        assert!(validate(&cmd, &present(&[])).is_ok());
        assert!(validate(&cmd, &present(&["cert"])).is_ok());
        assert!(validate(&cmd, &present(&["tls", "cert"])).is_ok());
        match validate(&cmd, &present(&["tls"])) {
            Err(ErrorKind::ConditionalRequirementViolation { target, condition }) => {
                assert_eq!(target, "cert");
                assert_eq!(condition, "tls");
            }
            other => panic!("expected ConditionalRequirementViolation, got: {other:?}"),
        }
    }
}
