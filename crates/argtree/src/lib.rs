//! Declarative command-line argument resolution.
//!
//! A [`Command`] tree is described once with [`Arg`] descriptors and built
//! into an immutable value. Parsing a token list walks the tree:
//! - the scanner classifies and consumes tokens for one command level
//! - the dispatcher recurses into matched subcommands and keeps persistent
//!   arguments in sync between levels
//! - the validator checks required arguments and argument groups
//!
//! Rendering help or version text is left to the caller; the parse only
//! reports that a trigger was seen (see [`ParseOutcome`] and [`TriggerHook`]).
//!
//! ```
//! use argtree::{Arg, ArgKind, Command, ParseOutcome};
//!
//! let cmd = Command::builder("tool")
//!     .arg(Arg::new("verbose").long("verbose").short('v').kind(ArgKind::Count))
//!     .arg(Arg::new("input").positional().required(true))
//!     .build()?;
//!
//! let ParseOutcome::Parsed(m) = cmd.parse(["-vv", "notes.txt"])? else {
//!     unreachable!("no help or version token given");
//! };
//! assert_eq!(m.count("verbose"), 2);
//! assert_eq!(m.value("input"), Some("notes.txt"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod arg;
mod command;
mod dispatch;
mod error;
mod result;
mod scan;
mod validate;

pub use arg::{Arg, ArgKind};
pub use command::{Command, CommandBuilder, Groups, RequiredIf};
pub use dispatch::{ParseOutcome, TriggerHook};
pub use error::{BuildError, ErrorKind, ParseError};
pub use result::{ParseResult, SubcommandMatch};
