//! Argument tokenizing and binding.
//!
//! Raw argument text is split into tokens by [`tokenize`], then bound
//! against a command's declared parameters by [`Args::bind`]. Binding
//! failures are reported as [`CommandError::InvalidSyntax`] so the
//! dispatcher can answer with the command's syntax help instead of running
//! the handler.
//!
//! ## Quoting
//!
//! A double-quoted run is one token with its quotes removed. There is no
//! escape sequence for a quote inside a quoted token: `"say \"hi\""` does
//! not produce `say "hi"`. Callers needing literal quotes should use a
//! [`ParamKind::Rest`] parameter or read [`CommandContext::raw_args`].
//!
//! [`CommandContext::raw_args`]: super::CommandContext::raw_args

use crate::error::CommandError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""[^"]+"|\S+"#).expect("token pattern is valid"))
}

/// Split argument text into tokens, left to right.
///
/// Every `"` is stripped from each token, so `a"b` yields `ab`.
pub fn tokenize(text: &str) -> Vec<String> {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().replace('"', ""))
        .collect()
}

/// Type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Float,
    Bool,
    /// Collects every remaining token. Only meaningful as the last parameter.
    Rest,
}

impl ParamKind {
    fn parse(self, raw: &str) -> Option<Value> {
        match self {
            Self::Str => Some(Value::Str(raw.to_string())),
            Self::Int => raw.parse().ok().map(Value::Int),
            Self::Float => raw.parse().ok().map(Value::Float),
            Self::Bool => parse_bool(raw).map(Value::Bool),
            Self::Rest => Some(Value::List(vec![raw.to_string()])),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Str => "text",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Bool => "boolean",
            Self::Rest => "text...",
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// A declared command parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    /// Used when the caller leaves this (trailing) argument out.
    pub default: Option<String>,
}

impl Param {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind, default: impl ToString) -> Self {
        Self {
            name: name.into(),
            kind,
            default: Some(default.to_string()),
        }
    }

    pub fn rest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Rest,
            default: None,
        }
    }

    /// Syntax fragment: `<name>`, `[name=default]` or `[name...]`.
    pub fn syntax(&self) -> String {
        match (&self.kind, &self.default) {
            (ParamKind::Rest, _) => format!("[{}...]", self.name),
            (_, Some(default)) => format!("[{}={}]", self.name, default),
            (_, None) => format!("<{}>", self.name),
        }
    }
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<String>),
}

/// Arguments bound to a command's parameters, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<(String, Value)>,
}

impl Args {
    /// Bind tokens to parameters in order.
    ///
    /// Missing trailing arguments take their declared default. A missing
    /// required argument, an unparseable argument or a surplus token is an
    /// invalid-syntax condition.
    pub fn bind(params: &[Param], tokens: &[String]) -> Result<Self, CommandError> {
        let mut values = Vec::with_capacity(params.len());
        let mut remaining = tokens.iter();

        for param in params {
            if param.kind == ParamKind::Rest {
                let rest: Vec<String> = remaining.by_ref().cloned().collect();
                values.push((param.name.clone(), Value::List(rest)));
                continue;
            }

            let raw = match remaining.next() {
                Some(token) => token.as_str(),
                None => param.default.as_deref().ok_or_else(|| {
                    CommandError::InvalidSyntax(format!("missing argument <{}>", param.name))
                })?,
            };

            let value = param.kind.parse(raw).ok_or_else(|| {
                CommandError::InvalidSyntax(format!(
                    "{raw:?} is not a valid {} for <{}>",
                    param.kind, param.name
                ))
            })?;
            values.push((param.name.clone(), value));
        }

        if let Some(extra) = remaining.next() {
            return Err(CommandError::InvalidSyntax(format!(
                "unexpected argument {extra:?}"
            )));
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Tokens collected by a rest parameter; empty if there were none.
    pub fn rest(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(Value::List(items)) => items,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
