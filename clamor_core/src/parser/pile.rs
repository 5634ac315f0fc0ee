use std::collections::VecDeque;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::Argument;
use crate::constant::OPTS_END;
use crate::error::ParseError;
use crate::model::{ArgType, Value};

pub(crate) static LONG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(--\w+(?:-\w+)*)$").expect("valid regex"));
pub(crate) static SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(-[a-z])$").expect("valid regex"));
pub(crate) static EQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(--\w+(?:-\w+)*|-[a-z])=(.*)$").expect("valid regex"));
pub(crate) static SHORT_SQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^-([a-z]{2,})$").expect("valid regex"));
pub(crate) static SHORT_NUM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(-[a-z])([-+]?(?:\d*\.\d+|\d+))$").expect("valid regex")
});
static NUMERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:\d*\.\d+|\d+)$").expect("valid regex"));
static NO_OR_SKIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--(?:no|skip)-([-\w]+)$").expect("valid regex"));
static SWITCHY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-{1,2}\S+").expect("valid regex"));

/// The stem of a `--no-name`/`--skip-name` switch.
pub(crate) fn no_or_skip(switch: &str) -> Option<&str> {
    NO_OR_SKIP_RE
        .captures(switch)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Whether `token` looks like a switch (anything but a value).
pub(crate) fn is_switchy(token: &str) -> bool {
    SWITCHY_RE.is_match(token)
}

/// Whether `token` is reported as an unknown switch: a `-`/`--` prefix, with no further `--` after it.
pub(crate) fn is_unknown_switch(token: &str) -> bool {
    let plain = |rest: &str| !rest.contains("--") && !rest.contains('\n');

    match (token.strip_prefix("--"), token.strip_prefix('-')) {
        (Some(long), Some(short)) => plain(long) || plain(short),
        (None, Some(short)) => plain(short),
        _ => false,
    }
}

/// The split of leading non-switch tokens from the rest.
pub(crate) fn split(tokens: Vec<String>) -> (Vec<String>, Vec<String>) {
    let boundary = tokens
        .iter()
        .position(|token| token.starts_with('-'))
        .unwrap_or(tokens.len());
    let mut positional = tokens;
    let rest = positional.split_off(boundary);
    (positional, rest)
}

/// An ordered queue of tokens being consumed.
///
/// A pile watching for the end of options turns option parsing off the first time `--` is peeked.
/// The `--` itself stays in the pile.
#[derive(Debug)]
pub(crate) struct Pile {
    tokens: VecDeque<String>,
    watches_end: bool,
    parsing_options: bool,
}

impl Pile {
    pub(crate) fn positional(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
            watches_end: false,
            parsing_options: false,
        }
    }

    pub(crate) fn options(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into(),
            watches_end: true,
            parsing_options: true,
        }
    }

    pub(crate) fn peek(&mut self) -> Option<&str> {
        if self.parsing_options && self.tokens.front().map(String::as_str) == Some(OPTS_END) {
            self.parsing_options = false;
        }

        self.tokens.front().map(String::as_str)
    }

    pub(crate) fn peek_owned(&mut self) -> Option<String> {
        self.peek().map(str::to_string)
    }

    pub(crate) fn shift(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    pub(crate) fn unshift(&mut self, token: String) {
        self.tokens.push_front(token);
    }

    pub(crate) fn unshift_all(&mut self, tokens: Vec<String>) {
        for token in tokens.into_iter().rev() {
            self.tokens.push_front(token);
        }
    }

    pub(crate) fn parsing_options(&mut self) -> bool {
        self.peek();
        self.parsing_options
    }

    pub(crate) fn stop_parsing_options(&mut self) {
        self.parsing_options = false;
    }

    /// Whether no value follows: the pile is empty, or (when watching for it) at `--`.
    pub(crate) fn is_last(&mut self) -> bool {
        let watches_end = self.watches_end;

        match self.peek() {
            None => true,
            Some(token) => watches_end && token == OPTS_END,
        }
    }

    pub(crate) fn current_is_value(&mut self) -> bool {
        match self.peek() {
            Some(token) => !is_switchy(token),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub(crate) fn into_remaining(self) -> Vec<String> {
        self.tokens.into()
    }

    /// Consume a value for `argument`, named `name` in error messages.
    pub(crate) fn take_value(
        &mut self,
        name: &str,
        argument: &Argument,
    ) -> Result<Value, ParseError> {
        match argument.get_type() {
            ArgType::String | ArgType::Boolean => self.take_string(name, argument),
            ArgType::Numeric => self.take_numeric(name, argument),
            ArgType::Array => self.take_array(name, argument),
            ArgType::Hash => self.take_hash(name),
        }
    }

    fn take_string(&mut self, name: &str, argument: &Argument) -> Result<Value, ParseError> {
        if no_or_skip(name).is_some() {
            return Ok(Value::Null);
        }

        let value = Value::String(self.shift().unwrap_or_default());
        check_choice(name, argument, &value)?;
        Ok(value)
    }

    fn take_numeric(&mut self, name: &str, argument: &Argument) -> Result<Value, ParseError> {
        let token = self.peek_owned().unwrap_or_default();

        if !NUMERIC_RE.is_match(&token) {
            return Err(ParseError::MalformedValue(format!(
                "Expected numeric value for '{name}'; got {token:?}"
            )));
        }

        self.shift();
        let value = parse_numeric(&token).ok_or_else(|| {
            ParseError::MalformedValue(format!(
                "Expected numeric value for '{name}'; got {token:?}"
            ))
        })?;
        check_choice(name, argument, &value)?;
        Ok(value)
    }

    fn take_array(&mut self, name: &str, argument: &Argument) -> Result<Value, ParseError> {
        let mut values = Vec::default();

        while self.current_is_value() {
            let value = self.shift().unwrap_or_default();

            if !value.is_empty() {
                if let Some(choices) = argument.get_choices() {
                    let candidate = Value::String(value.clone());

                    if !choices.iter().any(|c| c.same_choice(&candidate)) {
                        return Err(ParseError::MalformedValue(format!(
                            "Expected all values of '{name}' to be one of {}; got {value}",
                            join_choices(choices)
                        )));
                    }
                }
            }

            values.push(value);
        }

        Ok(Value::Array(values))
    }

    fn take_hash(&mut self, name: &str) -> Result<Value, ParseError> {
        let mut values: IndexMap<String, String> = IndexMap::default();

        while self.current_is_value() {
            let token = self.shift().unwrap_or_default();
            let (key, value) = token.split_once(':').ok_or_else(|| {
                ParseError::MalformedValue(format!(
                    "Expected 'key:value' for '{name}'; got {token:?}"
                ))
            })?;

            if let Some(previous) = values.get(key) {
                return Err(ParseError::MalformedValue(format!(
                    "You can't specify '{key}' more than once in option '{name}'; got {key}:{previous} and {key}:{value}"
                )));
            }

            values.insert(key.to_string(), value.to_string());
        }

        Ok(Value::Hash(values))
    }
}

pub(crate) fn parse_numeric(token: &str) -> Option<Value> {
    if token.contains('.') {
        token.parse::<f64>().ok().map(Value::Float)
    } else {
        token.parse::<i64>().ok().map(Value::Integer)
    }
}

fn check_choice(name: &str, argument: &Argument, value: &Value) -> Result<(), ParseError> {
    if let Some(choices) = argument.get_choices() {
        if !choices.iter().any(|c| c.same_choice(value)) {
            return Err(ParseError::MalformedValue(format!(
                "Expected '{name}' to be one of {}; got {value}",
                join_choices(choices)
            )));
        }
    }

    Ok(())
}

fn join_choices(choices: &[Value]) -> String {
    choices
        .iter()
        .map(Value::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}
