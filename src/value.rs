//! Typed value coercion: one raw token in, one typed value or a parse error
//! out. Pure and total given `(token, type)`.

use std::{fmt, path::PathBuf, sync::Arc};

use indexmap::IndexMap;

use crate::{Error, Result};

/// A resolved argument value.
///
/// `List` and `Map` only appear as accumulator shapes for rest arguments;
/// coercion itself never produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    Choice(ChoiceValue),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl Value {
    /// The type a value coerces under, used when matching literal sets.
    ///
    /// `None` for the aggregate shapes, which have no token form.
    pub(crate) fn ty(&self) -> Option<Ty> {
        match self {
            Value::Bool(_) => Some(Ty::Bool),
            Value::Int(_) => Some(Ty::Int),
            Value::Float(_) => Some(Ty::Float),
            Value::Str(_) => Some(Ty::Str),
            Value::Path(_) => Some(Ty::Path),
            Value::Choice(choice) => Some(Ty::Choice(Arc::clone(&choice.def))),
            Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Boolean polarity of a flag value, for toggle sinks.
    pub(crate) fn flag_truth(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Choice(choice) => choice.def.truth_of(choice.index).unwrap_or(true),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    /// Renders the canonical token: coercing it back yields an equal value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Choice(choice) => f.write_str(&choice.def.member_token(choice.index)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A member of an enumeration: string-backed (matched by name) or
/// integer-backed (matched by decimal backing value).
#[derive(Debug, Clone, PartialEq)]
struct ChoiceMember {
    name: String,
    backing: Option<i64>,
}

/// An enumeration descriptor with ordered, named members.
///
/// A member may be designated as the type-intrinsic default, and a pair of
/// members may be designated as canonical true/false, which makes the choice
/// "boolish" and eligible for complement-flag generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDef {
    name: String,
    members: Vec<ChoiceMember>,
    default_member: Option<usize>,
    true_member: Option<usize>,
    false_member: Option<usize>,
}

impl ChoiceDef {
    pub fn new(name: impl Into<String>) -> ChoiceDef {
        ChoiceDef {
            name: name.into(),
            members: Vec::new(),
            default_member: None,
            true_member: None,
            false_member: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_member(&mut self, name: impl Into<String>) {
        self.members.push(ChoiceMember { name: name.into(), backing: None });
    }

    pub fn add_int_member(&mut self, name: impl Into<String>, backing: i64) {
        self.members.push(ChoiceMember { name: name.into(), backing: Some(backing) });
    }

    /// Marks an existing member as the type-intrinsic default.
    pub fn set_default(&mut self, member: &str) -> Result<()> {
        self.default_member = Some(self.index_of(member)?);
        Ok(())
    }

    /// Marks a pair of existing members as canonical true/false.
    pub fn set_bool_members(&mut self, truthy: &str, falsy: &str) -> Result<()> {
        self.true_member = Some(self.index_of(truthy)?);
        self.false_member = Some(self.index_of(falsy)?);
        Ok(())
    }

    pub fn is_boolish(&self) -> bool {
        self.true_member.is_some() && self.false_member.is_some()
    }

    fn index_of(&self, member: &str) -> Result<usize> {
        self.members
            .iter()
            .position(|m| m.name == member)
            .ok_or_else(|| {
                Error::Configuration(format!("choice `{}` has no member `{member}`", self.name))
            })
    }

    /// The canonical token of a member: its name, or its decimal backing
    /// value for integer-backed members.
    fn member_token(&self, index: usize) -> String {
        let member = &self.members[index];
        match member.backing {
            Some(backing) => backing.to_string(),
            None => member.name.clone(),
        }
    }

    fn truth_of(&self, index: usize) -> Option<bool> {
        if self.true_member == Some(index) {
            Some(true)
        } else if self.false_member == Some(index) {
            Some(false)
        } else {
            None
        }
    }

    fn match_member(&self, text: &str) -> Option<usize> {
        let as_int = text.parse::<i64>().ok();
        self.members.iter().position(|m| match m.backing {
            Some(backing) => as_int == Some(backing),
            None => m.name == text,
        })
    }
}

/// A value of an enumeration type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceValue {
    def: Arc<ChoiceDef>,
    index: usize,
}

impl ChoiceValue {
    pub fn member(&self) -> &str {
        &self.def.members[self.index].name
    }
}

/// A declared value-type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Bool,
    Int,
    Float,
    Str,
    /// Syntactic wrapper around `Str`; no existence check is performed.
    Path,
    Choice(Arc<ChoiceDef>),
    /// Member types are tried in declared order; first success wins.
    Union(Vec<Ty>),
    /// A literal-value set: the token must coerce, under a literal's own
    /// type, to a value equal to that literal.
    OneOf(Vec<Value>),
    /// Tries bool, int, float, str, in that order.
    Any,
}

impl Ty {
    /// Coerces one raw token to a typed value.
    pub fn coerce(&self, text: &str) -> Result<Value> {
        match self {
            Ty::Bool => match text {
                "on" | "true" | "1" => Ok(Value::Bool(true)),
                "off" | "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(self.parse_err(text)),
            },
            Ty::Int => text.parse::<i64>().map(Value::Int).map_err(|_| self.parse_err(text)),
            Ty::Float => text.parse::<f64>().map(Value::Float).map_err(|_| self.parse_err(text)),
            Ty::Str => Ok(Value::Str(text.to_string())),
            Ty::Path => Ok(Value::Path(PathBuf::from(text))),
            Ty::Choice(def) => def
                .match_member(text)
                .map(|index| Value::Choice(ChoiceValue { def: Arc::clone(def), index }))
                .ok_or_else(|| self.parse_err(text)),
            Ty::Union(members) => members
                .iter()
                .find_map(|member| member.coerce(text).ok())
                .ok_or_else(|| self.parse_err(text)),
            Ty::OneOf(literals) => literals
                .iter()
                .find_map(|literal| {
                    let value = literal.ty()?.coerce(text).ok()?;
                    (value == *literal).then_some(value)
                })
                .ok_or_else(|| self.parse_err(text)),
            Ty::Any => [Ty::Bool, Ty::Int, Ty::Float, Ty::Str]
                .iter()
                .find_map(|candidate| candidate.coerce(text).ok())
                .ok_or_else(|| self.parse_err(text)),
        }
    }

    fn parse_err(&self, text: &str) -> Error {
        Error::ValueParse { text: text.to_string(), ty: self.to_string() }
    }

    /// Whether `bool` occurs anywhere in this type, unions flattened.
    ///
    /// A bare flag of such a type resolves to `true`.
    pub(crate) fn contains_bool(&self) -> bool {
        match self {
            Ty::Bool => true,
            Ty::Union(members) => members.iter().any(Ty::contains_bool),
            _ => false,
        }
    }

    /// True boolean type, or a choice exposing canonical true/false members.
    pub(crate) fn is_boolish(&self) -> bool {
        match self {
            Ty::Bool => true,
            Ty::Choice(def) => def.is_boolish(),
            _ => false,
        }
    }

    /// The canonical default a type defines on its own, if any.
    pub(crate) fn intrinsic_default(&self) -> Option<Value> {
        match self {
            Ty::Choice(def) => {
                let index = def.default_member?;
                Some(Value::Choice(ChoiceValue { def: Arc::clone(def), index }))
            }
            _ => None,
        }
    }

    /// Maps a boolean back into this type for toggle sinks.
    pub(crate) fn from_bool(&self, b: bool) -> Value {
        if let Ty::Choice(def) = self {
            let index = if b { def.true_member } else { def.false_member };
            if let Some(index) = index {
                return Value::Choice(ChoiceValue { def: Arc::clone(def), index });
            }
        }
        Value::Bool(b)
    }

    /// Rejects the residual unsupported shapes at freeze time.
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Ty::Choice(def) if def.members.is_empty() => {
                Err(Error::Configuration(format!("choice `{}` has no members", def.name)))
            }
            Ty::Union(members) => {
                if members.is_empty() {
                    return Err(Error::Configuration("empty union type".to_string()));
                }
                members.iter().try_for_each(Ty::validate)
            }
            Ty::OneOf(literals) => {
                if literals.is_empty() {
                    return Err(Error::Configuration("empty literal set".to_string()));
                }
                for literal in literals {
                    if literal.ty().is_none() {
                        return Err(Error::Configuration(format!(
                            "`{literal}` cannot be used as a literal"
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::Int => f.write_str("int"),
            Ty::Float => f.write_str("float"),
            Ty::Str => f.write_str("str"),
            Ty::Path => f.write_str("path"),
            Ty::Choice(def) => f.write_str(&def.name),
            Ty::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Ty::OneOf(literals) => {
                for (i, literal) in literals.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{literal}")?;
                }
                Ok(())
            }
            Ty::Any => f.write_str("any"),
        }
    }
}
