//! Declarative command-tree argument parser.
//!
//! A spec producer builds a tree of [`Cmd`]s and [`Arg`]s, freezes it into a
//! [`Program`], and hands the process argument vector to [`Program::parse`].
//! The result is the resolved command plus structured positional and keyword
//! values, ready to invoke a handler.
//!
//! ```
//! use cmdtree::{Arg, Cmd, Outcome, Program, Ty, Value};
//!
//! let mut root = Cmd::new("prog");
//! let mut build = Cmd::new("build");
//! let mut path = Arg::new("path", Ty::Path);
//! path.set_positional();
//! build.add_arg(path).unwrap();
//! let mut jobs = Arg::new("jobs", Ty::Int);
//! jobs.set_flag();
//! jobs.set_optional();
//! jobs.set_default(Value::Int(1));
//! build.add_arg(jobs).unwrap();
//! root.add_subcommand(build).unwrap();
//!
//! let prog = Program::new(root).unwrap();
//! let outcome = prog.parse(&["prog", "build", "--jobs=4", "src"]).unwrap();
//! let Outcome::Invoke(inv) = outcome else { panic!() };
//! assert_eq!(inv.command().name(), "build");
//! ```

use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while building a tree or parsing against it.
///
/// The first four variants are user-input errors, surfaced synchronously to
/// the parse caller. The rest indicate a bug in the spec producer and are
/// raised before any token is consumed.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to parse `{text}` as {ty}")]
    ValueParse { text: String, ty: String },
    #[error("value missing for argument `{0}`")]
    MissingValue(String),
    #[error("unknown argument `{0}`")]
    UnknownArgument(String),
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    #[error("command `{0}` already has a rest-flags argument")]
    MultipleRestFlags(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl Error {
    /// True for errors caused by the argument vector rather than by the tree.
    ///
    /// A harness is expected to report usage errors and exit non-zero;
    /// configuration errors should instead be treated as bugs.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::ValueParse { .. }
                | Error::MissingValue(_)
                | Error::UnknownArgument(_)
                | Error::UnexpectedArgument(_)
        )
    }
}

mod complement;
mod help;
mod parse;
mod tree;
mod value;

pub use crate::help::render_help;
pub use crate::parse::{Invocation, Outcome};
pub use crate::tree::{Arg, Cmd, Handler, Program, Sink, ToggleTarget};
pub use crate::value::{ChoiceDef, ChoiceValue, Ty, Value};
