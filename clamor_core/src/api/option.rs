use tracing::warn;

use crate::api::argument::Argument;
use crate::error::DeclarationError;
use crate::model::{ArgType, Value};

/// A named parameter, given via `--name`/`-n` switches.
///
/// Options are not required unless marked so.
/// When no type is given, the type is taken from the default (or is `String` without a default).
///
/// ### Example
/// ```
/// # use clamor_core as clamor;
/// use clamor::Opt;
///
/// let verbose = Opt::new("verbose").default(false).aliases(["v"]);
/// assert_eq!(verbose.switch_name(), "--verbose");
/// assert_eq!(verbose.usage(0), "-v, [--verbose], [--no-verbose]");
///
/// let dry_run = Opt::new("dry_run").required(true);
/// assert_eq!(dry_run.switch_name(), "--dry-run");
/// assert_eq!(dry_run.human_name(), "dry_run");
/// assert_eq!(dry_run.usage(0), "--dry-run=DRY_RUN");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Opt {
    argument: Argument,
    aliases: Vec<String>,
    group: Option<String>,
    hide: bool,
    lazy_default: Option<Value>,
    groups: Vec<String>,
}

impl Opt {
    /// Create an option.
    ///
    /// A name starting with `-` is taken as the switch verbatim.
    /// Otherwise the switch is `--name` (underscores become dashes), or `-n` for a single character name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            argument: Argument::new(name).required(false),
            aliases: Vec::default(),
            group: None,
            hide: false,
            lazy_default: None,
            groups: Vec::default(),
        }
    }

    #[allow(missing_docs)]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.argument = self.argument.description(description);
        self
    }

    #[allow(missing_docs)]
    pub fn arg_type(mut self, arg_type: ArgType) -> Self {
        self.argument = self.argument.arg_type(arg_type);
        self
    }

    #[allow(missing_docs)]
    pub fn required(mut self, required: bool) -> Self {
        self.argument = self.argument.required(required);
        self
    }

    /// Set the value assigned when the switch is absent.
    /// Also sets the option type, unless one was given explicitly.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();

        if !self.argument.type_given() {
            self.argument
                .set_type(value.arg_type().unwrap_or(ArgType::String));
        }

        self.argument = self.argument.default(value);
        self
    }

    /// Set the value assigned when the switch is present without a value.
    pub fn lazy_default(mut self, value: impl Into<Value>) -> Self {
        self.lazy_default.replace(value.into());
        self
    }

    #[allow(missing_docs)]
    pub fn banner(mut self, banner: impl Into<String>) -> Self {
        self.argument = self.argument.banner(banner);
        self
    }

    #[allow(missing_docs)]
    pub fn choices<V: Into<Value>>(mut self, choices: impl IntoIterator<Item = V>) -> Self {
        self.argument = self.argument.choices(choices);
        self
    }

    /// Add alternate switches, ex: `["v"]` or `["-v"]`.
    pub fn aliases<S: Into<String>>(mut self, aliases: impl IntoIterator<Item = S>) -> Self {
        for alias in aliases {
            let alias: String = alias.into();

            if alias.starts_with('-') {
                self.aliases.push(alias);
            } else {
                self.aliases.push(format!("-{alias}"));
            }
        }

        self
    }

    /// Place this option under a named group in help output.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group.replace(capitalize(&group.into()));
        self
    }

    /// Keep this option out of help output.
    pub fn hide(mut self) -> Self {
        self.hide = true;
        self
    }

    /// Tag a shared option with the groups it may be included by.
    pub fn groups<S: Into<String>>(mut self, groups: impl IntoIterator<Item = S>) -> Self {
        for group in groups {
            let group: String = group.into();

            if !self.groups.contains(&group) {
                self.groups.push(group);
            }
        }

        self
    }

    /// The underlying argument declaration.
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        self.argument.name()
    }

    /// The key this option is assigned under.
    pub fn human_name(&self) -> &str {
        self.argument.human_name()
    }

    /// The canonical switch, ex: `--dry-run`.
    pub fn switch_name(&self) -> String {
        let name = self.argument.name();

        if name.starts_with('-') {
            name.to_string()
        } else {
            dasherize(name)
        }
    }

    #[allow(missing_docs)]
    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    #[allow(missing_docs)]
    pub fn get_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[allow(missing_docs)]
    pub fn get_groups(&self) -> &[String] {
        &self.groups
    }

    #[allow(missing_docs)]
    pub fn is_hidden(&self) -> bool {
        self.hide
    }

    #[allow(missing_docs)]
    pub fn get_lazy_default(&self) -> Option<&Value> {
        self.lazy_default.as_ref()
    }

    #[allow(missing_docs)]
    pub fn get_type(&self) -> ArgType {
        self.argument.get_type()
    }

    #[allow(missing_docs)]
    pub fn is_required(&self) -> bool {
        self.argument.is_required()
    }

    #[allow(missing_docs)]
    pub fn is_boolean(&self) -> bool {
        self.get_type() == ArgType::Boolean
    }

    pub(crate) fn show_default(&self) -> bool {
        match self.argument.get_default() {
            Some(Value::Bool(_)) => true,
            _ => self.argument.show_default(),
        }
    }

    /// Render the usage of this option, ex: `-v, [--verbose], [--no-verbose]`.
    ///
    /// Without aliases, the usage is indented by `padding` spaces so it lines up with aliased options.
    pub fn usage(&self, padding: usize) -> String {
        let switch_name = self.switch_name();
        let mut sample = match self.argument.get_banner() {
            Some(banner) if !banner.is_empty() => format!("{switch_name}={banner}"),
            _ => switch_name,
        };

        if !self.is_required() {
            sample = format!("[{sample}]");
        }

        if self.is_boolean() && self.name() != "force" && !self.name().starts_with("no-") {
            sample.push_str(&format!(
                ", [{}]",
                dasherize(&format!("no-{}", self.human_name()))
            ));
        }

        if self.aliases.is_empty() {
            format!("{:padding$}{sample}", "")
        } else {
            format!("{}, {sample}", self.aliases.join(", "))
        }
    }

    /// Produce the copy of a shared option included into a command via `matched_groups`.
    pub(crate) fn included(&self, matched_groups: &[String]) -> Opt {
        let mut option = self.clone();

        if option.group.is_none() && !matched_groups.is_empty() {
            option.group.replace(
                matched_groups
                    .iter()
                    .map(|g| titleize(g))
                    .collect::<Vec<String>>()
                    .join(" / "),
            );
        }

        option
    }

    pub(crate) fn validate(&self, check_default_type: bool) -> Result<(), DeclarationError> {
        self.argument.validate_common("Option")?;

        if self.is_boolean() && self.is_required() {
            return Err(DeclarationError::new(
                "An option cannot be boolean and required.",
            ));
        }

        if let Some(default) = self.argument.get_default() {
            let default_type = match default {
                Value::Null => return Ok(()),
                Value::Bool(_) if self.is_required() => ArgType::String,
                other => other.arg_type().unwrap_or(ArgType::String),
            };

            if default_type != self.get_type() {
                let message = format!(
                    "Expected {} default value for '{}'; got {:?} ({default_type})",
                    self.get_type(),
                    self.switch_name(),
                    default,
                );

                if check_default_type {
                    return Err(DeclarationError::new(message));
                }

                warn!("{message}");
            }
        }

        Ok(())
    }
}

pub(crate) fn dasherize(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{}", name.replace('_', "-"))
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::default(),
    }
}

fn titleize(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<String>>()
        .join(" ")
}
