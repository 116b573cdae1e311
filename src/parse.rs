//! The token-consuming parser: one pass over the argument vector against a
//! frozen tree, producing the resolved command plus structured values.

use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::help::render_help;
use crate::tree::{Arg, Cmd, Program, Sink};
use crate::value::Value;
use crate::{Error, Result};

/// How a parse ended: a command ready to invoke, or an early, successful
/// help stop. Distinguishable from every [`Error`].
#[derive(Debug)]
pub enum Outcome<'p> {
    Invoke(Invocation<'p>),
    Help(String),
}

/// The resolved command with its ordered positional values and keyword
/// mapping, ready to hand to the bound handler.
pub struct Invocation<'p> {
    command: &'p Cmd,
    positional: Vec<Value>,
    keywords: IndexMap<String, Value>,
}

impl<'p> Invocation<'p> {
    pub fn command(&self) -> &'p Cmd {
        self.command
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &IndexMap<String, Value> {
        &self.keywords
    }

    /// Invokes the command's handler, if one is bound.
    pub fn run(&self) -> Option<i32> {
        let handler = self.command.handler()?;
        Some(handler(&self.positional, &self.keywords))
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command.name())
            .field("positional", &self.positional)
            .field("keywords", &self.keywords)
            .finish()
    }
}

struct Tokens {
    rargs: Vec<String>,
}

impl Tokens {
    fn new(args: impl Iterator<Item = String>) -> Tokens {
        let mut rargs: Vec<String> = args.collect();
        rargs.reverse();
        Tokens { rargs }
    }

    fn next(&mut self) -> Option<String> {
        self.rargs.pop()
    }

    fn peek(&self) -> Option<&str> {
        self.rargs.last().map(String::as_str)
    }
}

fn is_flag_shaped(token: &str) -> bool {
    token.starts_with('-')
}

/// Maps the user-facing separator to the tree's declared one.
fn normalize(name: &str) -> String {
    name.replace('-', "_")
}

enum Flow {
    Continue,
    Help,
}

fn apply(arg: &Arg, key: &str, value: Value, acc: &mut IndexMap<String, Value>) -> Flow {
    match arg.sink() {
        Sink::Assign => {
            acc.insert(key.to_string(), value);
        }
        Sink::Append => {
            let slot = acc.entry(key.to_string()).or_insert_with(|| Value::List(Vec::new()));
            match slot {
                Value::List(items) => items.push(value),
                other => *other = Value::List(vec![value]),
            }
        }
        Sink::Gather => {
            let slot =
                acc.entry(arg.name().to_string()).or_insert_with(|| Value::Map(IndexMap::new()));
            match slot {
                Value::Map(entries) => {
                    entries.insert(key.to_string(), value);
                }
                other => {
                    let mut entries = IndexMap::new();
                    entries.insert(key.to_string(), value);
                    *other = Value::Map(entries);
                }
            }
        }
        Sink::Toggle { target, invert } => {
            let truth = value.flag_truth() != *invert;
            acc.insert(target.clone(), arg.ty().from_bool(truth));
        }
        Sink::ToggleAll { targets } => {
            let truth = value.flag_truth();
            for target in targets {
                acc.insert(target.name.clone(), target.ty.from_bool(truth != target.invert));
            }
        }
        Sink::Help => return Flow::Help,
    }
    Flow::Continue
}

impl Program {
    /// Parses a full process argument vector; the leading program name is
    /// skipped. The tree is only borrowed, so parses against the same
    /// program may run concurrently.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<Outcome<'_>> {
        let mut tokens =
            Tokens::new(argv.iter().skip(1).map(|token| token.as_ref().to_string()));
        let mut cmd = &self.root;
        let mut acc: IndexMap<String, Value> = IndexMap::new();
        let mut positional_cursor = 0usize;
        let mut positional_used = 0u32;

        while let Some(token) = tokens.next() {
            trace!(token = %token, command = cmd.name(), "consuming token");

            if is_flag_shaped(&token) {
                let stripped = token.trim_start_matches('-');
                if stripped.is_empty() {
                    return Err(Error::UnknownArgument(token));
                }
                let (raw_name, inline) = match stripped.split_once('=') {
                    Some((raw_name, text)) => (raw_name, Some(text)),
                    None => (stripped, None),
                };
                let name = normalize(raw_name);

                let Some(arg) = cmd.get_flag(&name).or_else(|| cmd.rest_flags()) else {
                    return Err(Error::UnknownArgument(token));
                };

                let mut value = match inline {
                    // An inline value must coerce; failure is a hard error.
                    Some(text) => Some(arg.ty().coerce(text)?),
                    None => None,
                };

                if value.is_none() {
                    if let Some(next) = tokens.peek() {
                        if !is_flag_shaped(next) {
                            // A failed lookahead leaves the token unconsumed
                            // for reprocessing.
                            if let Ok(coerced) = arg.ty().coerce(next) {
                                value = Some(coerced);
                                tokens.next();
                            }
                        }
                    }
                }

                let value = match value {
                    Some(value) => value,
                    None => {
                        if arg.ty().contains_bool() || arg.is_rest_flags() {
                            // Bare-flag semantics.
                            Value::Bool(true)
                        } else if let Some(default) = arg.default() {
                            default.clone()
                        } else if let Some(default) = arg.ty().intrinsic_default() {
                            default
                        } else if arg.min_count() > 0 {
                            return Err(Error::MissingValue(name));
                        } else {
                            continue;
                        }
                    }
                };

                if let Flow::Help = apply(arg, &name, value, &mut acc) {
                    return Ok(Outcome::Help(render_help(cmd)));
                }
            } else {
                if let Some(sub) = cmd.get_subcommand(&token) {
                    // Subcommand resolution takes precedence over positional
                    // consumption.
                    debug!(command = sub.name(), "descending into subcommand");
                    cmd = sub;
                    positional_cursor = 0;
                    positional_used = 0;
                    continue;
                }

                loop {
                    let Some(slot) = cmd.positional_at(positional_cursor) else {
                        return Err(Error::UnexpectedArgument(token));
                    };
                    if slot.max_count().is_some_and(|max| positional_used >= max) {
                        positional_cursor += 1;
                        positional_used = 0;
                        continue;
                    }
                    let value = slot.ty().coerce(&token)?;
                    if let Flow::Help = apply(slot, slot.name(), value, &mut acc) {
                        return Ok(Outcome::Help(render_help(cmd)));
                    }
                    positional_used += 1;
                    break;
                }
            }
        }

        // Assemble positional and keyword values from the accumulator, in
        // insertion order. Keys written by toggle sinks have no owning
        // argument and pass through as keywords.
        let mut positional = Vec::new();
        let mut keywords = IndexMap::new();
        for (key, value) in acc {
            match cmd.get_argument(&key) {
                Some(arg) if arg.is_rest_positional() => match value {
                    Value::List(items) => positional.extend(items),
                    other => positional.push(other),
                },
                Some(arg) if arg.is_positional() => positional.push(value),
                Some(arg) if arg.is_rest_flags() => match value {
                    Value::Map(entries) => keywords.extend(entries),
                    other => {
                        keywords.insert(key, other);
                    }
                },
                _ => {
                    keywords.insert(key, value);
                }
            }
        }

        Ok(Outcome::Invoke(Invocation { command: cmd, positional, keywords }))
    }
}
