//! The argument/command tree: built once by a spec producer, frozen into a
//! [`Program`], then consumed read-only by the parser.

use std::fmt;

use indexmap::IndexMap;

use crate::complement::add_complements;
use crate::value::{Ty, Value};
use crate::{Error, Result};

const FLAG: u8 = 1 << 0;
const POSITIONAL: u8 = 1 << 1;
const REST: u8 = 1 << 2;

/// How a resolved `(key, value)` pair lands in the per-parse accumulator.
///
/// A closed set, chosen at build time, so the parse hot path stays
/// allocation-free and closure-free.
#[derive(Debug, Clone)]
pub enum Sink {
    /// `acc[key] = value`.
    Assign,
    /// Push onto the list at `acc[key]`.
    Append,
    /// Insert `(key, value)` into the map stored under the owning rest-flags
    /// argument's name.
    Gather,
    /// Write the flag's boolean polarity, inverted for synthesized
    /// complements, under the unprefixed base key.
    Toggle { target: String, invert: bool },
    /// One pass over a command's recognized enable/disable flags.
    ToggleAll { targets: Vec<ToggleTarget> },
    /// Stop parsing, succeed with rendered help.
    Help,
}

/// One write performed by an `enable_all`/`disable_all` flag.
#[derive(Debug, Clone)]
pub struct ToggleTarget {
    pub name: String,
    pub invert: bool,
    pub ty: Ty,
}

/// A named leaf descriptor: flag, positional, rest slot, or a combination.
#[derive(Debug)]
pub struct Arg {
    name: String,
    kind: u8,
    ty: Ty,
    min_count: u32,
    max_count: Option<u32>,
    default: Option<Value>,
    sink: Sink,
}

impl Arg {
    /// A required, single-valued argument with no classification bits set.
    pub fn new(name: impl Into<String>, ty: Ty) -> Arg {
        Arg {
            name: name.into(),
            kind: 0,
            ty,
            min_count: 1,
            max_count: Some(1),
            default: None,
            sink: Sink::Assign,
        }
    }

    pub fn set_flag(&mut self) {
        self.kind |= FLAG;
    }

    pub fn set_positional(&mut self) {
        self.kind |= POSITIONAL;
    }

    pub fn set_rest(&mut self) {
        self.kind |= REST;
    }

    pub fn set_optional(&mut self) {
        self.min_count = 0;
    }

    pub fn set_required(&mut self) {
        if self.min_count == 0 {
            self.min_count = 1;
        }
    }

    pub fn set_default(&mut self, value: Value) {
        self.default = Some(value);
    }

    pub fn set_max_count(&mut self, max: u32) {
        self.max_count = Some(max);
    }

    pub fn set_no_max_count(&mut self) {
        self.max_count = None;
    }

    pub fn set_sink(&mut self, sink: Sink) {
        self.sink = sink;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn min_count(&self) -> u32 {
        self.min_count
    }

    /// `None` means unbounded.
    pub fn max_count(&self) -> Option<u32> {
        self.max_count
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    pub fn is_flag(&self) -> bool {
        self.kind & FLAG != 0
    }

    pub fn is_positional(&self) -> bool {
        self.kind & POSITIONAL != 0
    }

    pub fn is_rest(&self) -> bool {
        self.kind & REST != 0
    }

    pub fn is_rest_flags(&self) -> bool {
        self.kind & (FLAG | REST) == FLAG | REST
    }

    pub fn is_rest_positional(&self) -> bool {
        self.kind & (POSITIONAL | REST) == POSITIONAL | REST
    }

    pub fn is_optional(&self) -> bool {
        self.min_count == 0
    }
}

/// An arity-erased command handler: ordered positional values plus the
/// keyword mapping, returning an exit code.
pub type Handler = Box<dyn Fn(&[Value], &IndexMap<String, Value>) -> i32 + Send + Sync>;

/// A node in the command tree. The root command is the program.
///
/// Once a command has been attached to a parent, or once the tree has been
/// frozen into a [`Program`], it must not be mutated further.
pub struct Cmd {
    name: String,
    description: Option<String>,
    handler: Option<Handler>,
    args: IndexMap<String, Arg>,
    positional: Vec<String>,
    subcommands: IndexMap<String, Cmd>,
    rest_flags: Option<String>,
}

impl Cmd {
    pub fn new(name: impl Into<String>) -> Cmd {
        Cmd {
            name: name.into(),
            description: None,
            handler: None,
            args: IndexMap::new(),
            positional: Vec::new(),
            subcommands: IndexMap::new(),
            rest_flags: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = Some(handler);
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    /// Attaches an argument. The argument must not be mutated afterwards.
    pub fn add_arg(&mut self, arg: Arg) -> Result<()> {
        if self.args.contains_key(arg.name()) {
            return Err(Error::DuplicateName(arg.name().to_string()));
        }
        if arg.is_rest_flags() {
            if self.rest_flags.is_some() {
                return Err(Error::MultipleRestFlags(self.name.clone()));
            }
            self.rest_flags = Some(arg.name().to_string());
        }
        if arg.is_positional() {
            self.positional.push(arg.name().to_string());
        }
        self.args.insert(arg.name().to_string(), arg);
        Ok(())
    }

    /// Attaches a subcommand. The subcommand must not be mutated afterwards.
    pub fn add_subcommand(&mut self, cmd: Cmd) -> Result<()> {
        if self.subcommands.contains_key(cmd.name()) {
            return Err(Error::DuplicateName(cmd.name().to_string()));
        }
        self.subcommands.insert(cmd.name().to_string(), cmd);
        Ok(())
    }

    /// The conventional optional `--help` flag, wired to [`Sink::Help`].
    pub fn add_help_flag(&mut self) -> Result<()> {
        let mut help = Arg::new("help", Ty::Bool);
        help.set_flag();
        help.set_optional();
        help.set_sink(Sink::Help);
        self.add_arg(help)
    }

    pub fn get_argument(&self, name: &str) -> Option<&Arg> {
        self.args.get(name)
    }

    pub fn get_flag(&self, name: &str) -> Option<&Arg> {
        self.args.get(name).filter(|arg| arg.is_flag())
    }

    pub fn get_subcommand(&self, name: &str) -> Option<&Cmd> {
        self.subcommands.get(name)
    }

    pub fn rest_flags(&self) -> Option<&Arg> {
        self.args.get(self.rest_flags.as_deref()?)
    }

    /// The positional slot at `index`, in declaration order.
    pub fn positional_at(&self, index: usize) -> Option<&Arg> {
        self.args.get(self.positional.get(index)?.as_str())
    }

    pub fn count_arguments(&self) -> usize {
        self.args.len()
    }

    pub fn count_subcommands(&self) -> usize {
        self.subcommands.len()
    }

    pub fn args(&self) -> impl Iterator<Item = &Arg> {
        self.args.values()
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &Cmd> {
        self.subcommands.values()
    }

    pub(crate) fn arg_mut(&mut self, name: &str) -> Option<&mut Arg> {
        self.args.get_mut(name)
    }

    pub(crate) fn subcommands_mut(&mut self) -> impl Iterator<Item = &mut Cmd> {
        self.subcommands.values_mut()
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

/// A finalized, logically frozen command tree.
///
/// `Program::new` is the ownership-transferring finalize step: it validates
/// every declared type shape, runs complement generation once, and yields a
/// tree the parser only ever borrows. Multiple parses may run against the
/// same program concurrently; each owns its own accumulator and cursor state.
#[derive(Debug)]
pub struct Program {
    pub(crate) root: Cmd,
}

impl Program {
    pub fn new(mut root: Cmd) -> Result<Program> {
        validate(&root)?;
        add_complements(&mut root)?;
        Ok(Program { root })
    }

    pub fn root(&self) -> &Cmd {
        &self.root
    }
}

fn validate(cmd: &Cmd) -> Result<()> {
    for arg in cmd.args() {
        arg.ty().validate()?;
    }
    cmd.subcommands().try_for_each(validate)
}
