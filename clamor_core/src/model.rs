use std::fmt;

use indexmap::IndexMap;

/// The type an argument/option coerces its tokens into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// A single token, taken verbatim.
    String,
    /// A single integer or decimal token.
    Numeric,
    /// A greedy run of `key:value` tokens.
    Hash,
    /// A greedy run of value tokens.
    Array,
    /// A flag (options only).
    Boolean,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::String => "string",
            ArgType::Numeric => "numeric",
            ArgType::Hash => "hash",
            ArgType::Array => "array",
            ArgType::Boolean => "boolean",
        };
        write!(f, "{name}")
    }
}

/// A parsed (or default) argument/option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `true`/`false`.
    Bool(bool),
    /// A numeric literal without a decimal point.
    Integer(i64),
    /// A numeric literal with a decimal point.
    Float(f64),
    /// A verbatim token.
    String(String),
    /// A run of verbatim tokens.
    Array(Vec<String>),
    /// A run of `key:value` tokens, in input order.
    Hash(IndexMap<String, String>),
    /// Explicitly unset, as by `--no-name` on a non-boolean option.
    Null,
}

impl Value {
    /// The [`ArgType`] this value naturally belongs to, if any.
    pub fn arg_type(&self) -> Option<ArgType> {
        match self {
            Value::Bool(_) => Some(ArgType::Boolean),
            Value::Integer(_) | Value::Float(_) => Some(ArgType::Numeric),
            Value::String(_) => Some(ArgType::String),
            Value::Array(_) => Some(ArgType::Array),
            Value::Hash(_) => Some(ArgType::Hash),
            Value::Null => None,
        }
    }

    /// Whether this value counts as "set" in a boolean context.
    ///
    /// `Null` and `false` are falsey; strings are truthy unless they spell out a false value.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::String(s) => crate::constant::TRUTHY_STRINGS
                .iter()
                .any(|t| t.eq_ignore_ascii_case(s)),
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Array(_) | Value::Hash(_) => true,
        }
    }

    #[allow(missing_docs)]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_array(&self) -> Option<&[String]> {
        match self {
            Value::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn as_hash(&self) -> Option<&IndexMap<String, String>> {
        match self {
            Value::Hash(values) => Some(values),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether `other` is the same choice as this value.
    /// Numbers compare by magnitude, everything else by display.
    pub(crate) fn same_choice(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(values) => write!(f, "{}", values.join(" ")),
            Value::Hash(values) => write!(
                f,
                "{}",
                values
                    .iter()
                    .map(|(k, v)| format!("{k}:{v}"))
                    .collect::<Vec<String>>()
                    .join(" ")
            ),
            Value::Null => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::Array(value.into_iter().map(str::to_string).collect())
    }
}

impl From<IndexMap<String, String>> for Value {
    fn from(value: IndexMap<String, String>) -> Self {
        Value::Hash(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// How many trailing positional tokens a command handler accepts.
///
/// Inspired by method arity: a minimum, and an optional maximum (`None` means "any number").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    min: usize,
    max: Option<usize>,
}

impl Arity {
    /// Precisely `n` tokens.
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    /// Between `min` and `max` tokens, inclusive.
    pub fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(std::cmp::max(min, max)),
        }
    }

    /// At least `n` tokens.
    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Any number of tokens, including none.
    pub fn any() -> Self {
        Self::at_least(0)
    }

    #[allow(missing_docs)]
    pub fn min(&self) -> usize {
        self.min
    }

    #[allow(missing_docs)]
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    pub(crate) fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{max}"),
            Some(max) => write!(f, "{}..{max}", self.min),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// The frozen option map produced by a parse.
///
/// Keys are the options' human names.
/// Lookups are indifferent to `-` versus `_`, so `dry_run` and `dry-run` find the same entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: IndexMap<String, Value>,
}

impl Options {
    pub(crate) fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get the value for `key`, if assigned.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.values.get(key) {
            Some(value) => Some(value),
            None => self
                .values
                .iter()
                .find(|(k, _)| indifferent(k) == indifferent(key))
                .map(|(_, v)| v),
        }
    }

    /// Whether `key` has been assigned (possibly to `Null`).
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether `key` is assigned a truthy value.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).map_or(false, Value::truthy)
    }

    #[allow(missing_docs)]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[allow(missing_docs)]
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    #[allow(missing_docs)]
    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    #[allow(missing_docs)]
    pub fn array(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(Value::as_array)
    }

    #[allow(missing_docs)]
    pub fn hash(&self, key: &str) -> Option<&IndexMap<String, String>> {
        self.get(key).and_then(Value::as_hash)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate the assigned options in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A copy of these options restricted to `keys`.
    pub fn slice<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Options {
        let mut values = IndexMap::default();

        for key in keys {
            if let Some(value) = self.get(key) {
                values.insert(key.to_string(), value.clone());
            }
        }

        Options { values }
    }

    /// Produce a copy of `self` with every entry of `over` written on top.
    pub(crate) fn overlay(&self, over: &Options) -> Options {
        let mut values = self.values.clone();

        for (key, value) in &over.values {
            match values
                .keys()
                .find(|k| indifferent(k) == indifferent(key))
                .cloned()
            {
                Some(existing) => {
                    values.insert(existing, value.clone());
                }
                None => {
                    values.insert(key.clone(), value.clone());
                }
            }
        }

        Options { values }
    }

    /// Render these options back into switch tokens.
    ///
    /// `false` and `Null` entries are omitted.
    pub fn to_switches(&self) -> Vec<String> {
        let mut tokens = Vec::default();

        for (key, value) in &self.values {
            let switch = format!("--{}", key.replace('_', "-"));

            match value {
                Value::Bool(true) => tokens.push(switch),
                Value::Bool(false) | Value::Null => {}
                Value::Array(values) => {
                    tokens.push(switch);
                    tokens.extend(values.iter().cloned());
                }
                Value::Hash(values) => {
                    tokens.push(switch);
                    tokens.extend(values.iter().map(|(k, v)| format!("{k}:{v}")));
                }
                other => {
                    tokens.push(switch);
                    tokens.push(other.to_string());
                }
            }
        }

        tokens
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Options {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn indifferent(key: &str) -> String {
    key.replace('-', "_")
}
