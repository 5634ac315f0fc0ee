use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::api::{Argument, Opt};
use crate::constant::{DEFAULT_NAMESPACE, RESERVED_WORDS};
use crate::context::Context;
use crate::error::{BoxError, DeclarationError};
use crate::model::{Arity, Value};
use crate::registry::ClassView;

/// The callable behind a command.
///
/// Receives the invocation context and the positional tokens left over once every argument has been consumed.
pub type Handler =
    Arc<dyn Fn(&mut Context<'_>, Vec<String>) -> Result<Value, BoxError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visibility {
    Public,
    Private,
}

/// A handler registered under a name, with the number of trailing tokens it accepts.
#[derive(Clone)]
pub(crate) struct Method {
    pub(crate) handler: Handler,
    pub(crate) arity: Arity,
    pub(crate) visibility: Visibility,
}

impl Method {
    pub(crate) fn new(handler: Handler, arity: Arity, visibility: Visibility) -> Self {
        Self {
            handler,
            arity,
            visibility,
        }
    }

    pub(crate) fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("arity", &self.arity)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// How a [`Command`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Declared on a class.
    Declared,
    /// Made up during dispatch for a name that matched no declared command.
    Dynamic,
}

/// A named, invocable unit: its documentation, options and arguments.
///
/// Commands are immutable once registered.
/// A class that needs a different version of an inherited command registers its own copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: String,
    description: String,
    long_description: Option<String>,
    usage: String,
    examples: Vec<String>,
    options: IndexMap<String, Opt>,
    arguments: Vec<Argument>,
    ancestor_name: Option<String>,
    hidden: bool,
    kind: CommandKind,
}

impl Command {
    /// Start declaring a command.
    ///
    /// ### Example
    /// ```
    /// # use clamor_core as clamor;
    /// use clamor::{Argument, Arity, Command, Opt, Value};
    ///
    /// let greet = Command::build("greet")
    ///     .description("Say hello")
    ///     .argument(Argument::new("name"))
    ///     .option(Opt::new("loud").default(false))
    ///     .handler(Arity::exactly(0), |_ctx, _args| Ok(Value::Null));
    /// ```
    pub fn build(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub(crate) fn dynamic(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            description: "A dynamically-generated command".to_string(),
            long_description: None,
            examples: Vec::default(),
            options: IndexMap::default(),
            arguments: Vec::default(),
            ancestor_name: None,
            hidden: false,
            kind: CommandKind::Dynamic,
        }
    }

    pub(crate) fn internal(
        name: impl Into<String>,
        usage: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            long_description: None,
            usage: usage.into(),
            examples: Vec::default(),
            options: IndexMap::default(),
            arguments: Vec::default(),
            ancestor_name: None,
            hidden: false,
            kind: CommandKind::Declared,
        }
    }

    /// The command name, with dashes normalized to underscores.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(missing_docs)]
    pub fn get_description(&self) -> &str {
        &self.description
    }

    #[allow(missing_docs)]
    pub fn get_long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    /// The raw usage line, ex: `greet NAME`.
    pub fn get_usage(&self) -> &str {
        &self.usage
    }

    #[allow(missing_docs)]
    pub fn get_examples(&self) -> &[String] {
        &self.examples
    }

    /// The command's own options, keyed by human name.
    pub fn options(&self) -> &IndexMap<String, Opt> {
        &self.options
    }

    /// The command's own positional arguments, consumed after the class arguments.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The user-facing name of the subcommand this command is reached through.
    pub fn get_ancestor_name(&self) -> Option<&str> {
        self.ancestor_name.as_deref()
    }

    #[allow(missing_docs)]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    #[allow(missing_docs)]
    pub fn is_dynamic(&self) -> bool {
        self.kind == CommandKind::Dynamic
    }

    pub(crate) fn with_ancestor(&self, ancestor_name: &str) -> Command {
        let mut command = self.clone();
        command.ancestor_name.replace(ancestor_name.to_string());
        command
    }

    pub(crate) fn with_options(mut self, options: IndexMap<String, Opt>) -> Command {
        self.options = options;
        self
    }

    /// Render the usage of this command as listed by `view`.
    ///
    /// The usage is prefixed by the ancestor name when reached through a subcommand.
    /// Otherwise it is prefixed with the namespace when `show_namespace`, or the last namespace segment when `is_subcommand`.
    /// The class arguments are injected after the command name, and the required options are appended.
    pub fn formatted_usage(&self, view: &ClassView, show_namespace: bool, is_subcommand: bool) -> String {
        let mut formatted = if let Some(ancestor_name) = &self.ancestor_name {
            format!("{ancestor_name} ")
        } else if show_namespace {
            let namespace = view.namespace();
            let namespace = namespace.strip_prefix(DEFAULT_NAMESPACE).unwrap_or(namespace);
            format!("{namespace}:")
        } else if is_subcommand {
            let last = view.namespace().rsplit(':').next().unwrap_or_default();
            format!("{last} ")
        } else {
            String::default()
        };

        let class_arguments: Vec<String> = view.class_arguments().iter().map(Argument::usage).collect();

        match self.usage.strip_prefix(&self.name) {
            Some(rest) if !class_arguments.is_empty() => {
                formatted.push_str(&self.name);
                formatted.push(' ');
                formatted.push_str(&class_arguments.join(" "));
                formatted.push_str(rest);
            }
            _ => formatted.push_str(&self.usage),
        }

        let mut required_options: Vec<String> = self
            .options
            .values()
            .filter(|option| option.is_required())
            .map(|option| option.usage(0))
            .collect();
        required_options.sort();

        if !required_options.is_empty() {
            formatted.push(' ');
            formatted.push_str(&required_options.join(" "));
        }

        formatted.trim().to_string()
    }
}

/// Shared options to pull into a command, by option name or by group.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Inclusion {
    pub(crate) names: Vec<String>,
    pub(crate) groups: Vec<String>,
}

/// Declares a [`Command`], along with the handler that runs it.
///
/// Declaration problems are deferred until the command is registered on a class.
pub struct CommandBuilder {
    command: Command,
    usage_given: bool,
    inclusion: Inclusion,
    method: Option<Method>,
    deferred_error: Option<DeclarationError>,
}

impl CommandBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        let mut builder = Self {
            command: Command {
                name: name.replace('-', "_"),
                description: String::default(),
                long_description: None,
                usage: name.clone(),
                examples: Vec::default(),
                options: IndexMap::default(),
                arguments: Vec::default(),
                ancestor_name: None,
                hidden: false,
                kind: CommandKind::Declared,
            },
            usage_given: false,
            inclusion: Inclusion::default(),
            method: None,
            deferred_error: None,
        };

        if RESERVED_WORDS.contains(&name.as_str()) {
            builder.defer(DeclarationError::new(format!(
                "\"{name}\" is a reserved word and cannot be defined as command"
            )));
        }

        builder
    }

    /// Set the usage line shown in help, ex: `greet NAME`.
    /// Defaults to the name followed by the arguments' usages.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.command.usage = usage.into();
        self.usage_given = true;
        self
    }

    /// Set the one line description shown when listing commands.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.command.description = description.into();
        self
    }

    /// Set the usage and description at once.
    pub fn desc(self, usage: impl Into<String>, description: impl Into<String>) -> Self {
        self.usage(usage).description(description)
    }

    /// Set the description shown when describing this command alone.
    pub fn long_description(mut self, long_description: impl Into<String>) -> Self {
        self.command.long_description.replace(long_description.into());
        self
    }

    /// Add an example invocation to the command help.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.command.examples.push(example.into());
        self
    }

    /// Add an option.
    /// An option with the same human name replaces the earlier one.
    pub fn option(mut self, option: Opt) -> Self {
        self.command
            .options
            .insert(option.human_name().to_string(), option);
        self
    }

    /// Add a positional argument.
    /// An argument with the same name replaces the earlier one.
    pub fn argument(mut self, argument: Argument) -> Self {
        if let Err(error) = check_argument(&mut self.command.arguments, argument) {
            self.defer(error);
        }

        self
    }

    /// Pull in the class's shared options matching `names`, or tagged with one of `groups`.
    pub fn include_options<N, G>(
        mut self,
        names: impl IntoIterator<Item = N>,
        groups: impl IntoIterator<Item = G>,
    ) -> Self
    where
        N: Into<String>,
        G: Into<String>,
    {
        self.inclusion.names.extend(names.into_iter().map(Into::into));
        self.inclusion.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Keep this command out of the command listing.
    pub fn hide(mut self) -> Self {
        self.command.hidden = true;
        self
    }

    /// Set the handler run for this command, accepting `arity` trailing tokens.
    pub fn handler<F>(mut self, arity: Arity, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, Vec<String>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.method.replace(Method::new(
            Arc::new(handler),
            arity,
            Visibility::Public,
        ));
        self
    }

    fn defer(&mut self, error: DeclarationError) {
        if self.deferred_error.is_none() {
            self.deferred_error.replace(error);
        }
    }

    pub(crate) fn finish(
        self,
    ) -> Result<(Command, Inclusion, Option<Method>), DeclarationError> {
        if let Some(error) = self.deferred_error {
            return Err(error);
        }

        let mut command = self.command;

        if !self.usage_given && !command.arguments.is_empty() {
            let arguments: Vec<String> = command.arguments.iter().map(Argument::usage).collect();
            command.usage = format!("{} {}", command.usage, arguments.join(" "));
        }

        Ok((command, self.inclusion, self.method))
    }
}

/// Validate `argument` and add it to `arguments`, replacing a same-named one.
pub(crate) fn check_argument(
    arguments: &mut Vec<Argument>,
    argument: Argument,
) -> Result<(), DeclarationError> {
    argument.validate()?;

    if RESERVED_WORDS.contains(&argument.name()) {
        return Err(DeclarationError::new(format!(
            "\"{}\" is a reserved word and cannot be defined as argument",
            argument.name()
        )));
    }

    arguments.retain(|a| a.name() != argument.name());

    if argument.is_required() {
        if let Some(optional) = arguments.iter().find(|a| !a.is_required()) {
            return Err(required_after_optional(&argument, optional));
        }
    }

    arguments.push(argument);
    Ok(())
}

/// Check that `command`'s arguments, parsed after `class_arguments`, never put a required argument after an optional one.
pub(crate) fn check_argument_order(
    class_arguments: &[Argument],
    command: &Command,
) -> Result<(), DeclarationError> {
    let mut optional = class_arguments.iter().find(|a| !a.is_required());

    for argument in command.arguments() {
        match optional {
            Some(optional) if argument.is_required() => {
                return Err(required_after_optional(argument, optional));
            }
            None if !argument.is_required() => optional = Some(argument),
            _ => {}
        }
    }

    Ok(())
}

fn required_after_optional(required: &Argument, optional: &Argument) -> DeclarationError {
    DeclarationError::new(format!(
        "You cannot have \"{}\" as required argument after the non-required argument \"{}\".",
        required.name(),
        optional.human_name()
    ))
}
