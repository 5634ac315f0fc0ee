use crate::error::DeclarationError;
use crate::model::{ArgType, Value};

/// A positional parameter.
///
/// ### Example
/// ```
/// # use clamor_core as clamor;
/// use clamor::{ArgType, Argument};
///
/// let name = Argument::new("name");
/// assert!(name.is_required());
/// assert_eq!(name.usage(), "NAME");
///
/// let count = Argument::new("count").arg_type(ArgType::Numeric).default(1);
/// assert!(!count.is_required());
/// assert_eq!(count.usage(), "[N]");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    description: Option<String>,
    arg_type: ArgType,
    required: Option<bool>,
    default: Option<Value>,
    banner: Option<String>,
    choices: Option<Vec<Value>>,
    type_given: bool,
}

impl Argument {
    /// Create a string argument, required unless given a default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type: ArgType::String,
            required: None,
            default: None,
            banner: None,
            choices: None,
            type_given: false,
        }
    }

    /// Document this argument for help output.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description.replace(description.into());
        self
    }

    /// Set the type tokens are coerced into.
    pub fn arg_type(mut self, arg_type: ArgType) -> Self {
        self.arg_type = arg_type;
        self.type_given = true;
        self
    }

    /// Explicitly mark this argument required (or not).
    pub fn required(mut self, required: bool) -> Self {
        self.required.replace(required);
        self
    }

    /// Set the value assigned when no token is given.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default.replace(value.into());
        self
    }

    /// Set the placeholder shown in usage strings.
    pub fn banner(mut self, banner: impl Into<String>) -> Self {
        self.banner.replace(banner.into());
        self
    }

    /// Restrict the accepted values.
    pub fn choices<V: Into<Value>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.choices
            .replace(choices.into_iter().map(Into::into).collect());
        self
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key this argument is assigned under.
    pub fn human_name(&self) -> &str {
        self.name.trim_start_matches('-')
    }

    #[allow(missing_docs)]
    pub fn get_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[allow(missing_docs)]
    pub fn get_type(&self) -> ArgType {
        self.arg_type
    }

    #[allow(missing_docs)]
    pub fn get_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[allow(missing_docs)]
    pub fn get_choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    /// Required when set explicitly, otherwise required iff there is no default.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(self.default.is_none())
    }

    /// The placeholder shown in usage strings, if any.
    pub fn get_banner(&self) -> Option<String> {
        match &self.banner {
            Some(banner) => Some(banner.clone()),
            None => default_banner(self.arg_type, self.human_name()),
        }
    }

    /// The banner, wrapped in `[..]` when not required.
    pub fn usage(&self) -> String {
        let banner = self.get_banner().unwrap_or_default();

        if self.is_required() {
            banner
        } else {
            format!("[{banner}]")
        }
    }

    /// Whether the default is worth showing in help output.
    pub(crate) fn show_default(&self) -> bool {
        match &self.default {
            None | Some(Value::Null) => false,
            Some(Value::Bool(_)) => true,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(values)) => !values.is_empty(),
            Some(Value::Hash(values)) => !values.is_empty(),
            Some(_) => true,
        }
    }

    pub(crate) fn type_given(&self) -> bool {
        self.type_given
    }

    pub(crate) fn set_type(&mut self, arg_type: ArgType) {
        self.arg_type = arg_type;
    }

    /// Check the constraints shared by positional arguments and options.
    pub(crate) fn validate_common(&self, kind: &str) -> Result<(), DeclarationError> {
        if self.name.is_empty() {
            return Err(DeclarationError::new(format!("{kind} name can't be empty.")));
        }

        if let Some(choices) = &self.choices {
            if choices.is_empty() {
                return Err(DeclarationError::new(format!(
                    "{kind} '{}' cannot have an empty list of choices.",
                    self.name
                )));
            }
        }

        Ok(())
    }

    /// Check the positional-only constraints.
    pub(crate) fn validate(&self) -> Result<(), DeclarationError> {
        self.validate_common("Argument")?;

        if self.arg_type == ArgType::Boolean {
            return Err(DeclarationError::new(format!(
                "Type {} is not valid for arguments.",
                self.arg_type
            )));
        }

        if self.is_required() && self.default.is_some() {
            return Err(DeclarationError::new(
                "An argument cannot be required and have default value.",
            ));
        }

        Ok(())
    }
}

pub(crate) fn default_banner(arg_type: ArgType, human_name: &str) -> Option<String> {
    match arg_type {
        ArgType::Boolean => None,
        ArgType::String => Some(human_name.to_uppercase()),
        ArgType::Numeric => Some("N".to_string()),
        ArgType::Hash => Some("key:value".to_string()),
        ArgType::Array => Some("one two three".to_string()),
    }
}
