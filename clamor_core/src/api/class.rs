use std::sync::Arc;

use tracing::debug;

use crate::api::command::{check_argument, check_argument_order, Method, Visibility};
use crate::api::{Argument, Command, CommandBuilder, Opt};
use crate::constant::{HELP_COMMAND, RESERVED_WORDS};
use crate::context::Context;
use crate::error::{BoxError, DeclarationError, Error};
use crate::model::{Arity, Value};
use crate::parser::split;
use crate::registry::{ClassDef, ClassId, Registry, UnknownPolicy};

/// Declares a class on a [`Registry`]: its commands, options, arguments and dispatch policies.
///
/// Declaration problems are deferred, and reported by [`ClassBuilder::build`].
pub struct ClassBuilder<'r> {
    registry: &'r mut Registry,
    id: ClassId,
    deferred_error: Option<Error>,
}

impl<'r> ClassBuilder<'r> {
    pub(crate) fn new(registry: &'r mut Registry, id: ClassId) -> Self {
        Self {
            registry,
            id,
            deferred_error: None,
        }
    }

    fn def(&mut self) -> &mut ClassDef {
        self.registry.def_mut(self.id)
    }

    fn defer(&mut self, error: impl Into<Error>) {
        if self.deferred_error.is_none() {
            self.deferred_error.replace(error.into());
        }
    }

    /// Inherit from `parent` instead of the base class.
    pub fn inherits(mut self, parent: ClassId) -> Self {
        if parent >= self.id || !self.registry.contains(parent) {
            self.defer(DeclarationError::new(format!(
                "Class '{}' cannot inherit from a class declared after it.",
                self.registry.def(self.id).name
            )));
        } else {
            self.def().parent.replace(parent);
        }

        self
    }

    /// Set the namespace, ex: `app:remote`.
    /// Defaults to the snake cased class name.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.def().namespace.replace(namespace.into());
        self
    }

    /// Set the title used when listing commands: `<package_name> commands:`.
    pub fn package_name(mut self, package_name: impl Into<String>) -> Self {
        self.def().package_name.replace(package_name.into());
        self
    }

    /// Add an option parsed for every command of this class.
    pub fn class_option(mut self, option: Opt) -> Self {
        let check_default_type = self.registry.resolve(self.id).check_default_type();

        match option.validate(check_default_type) {
            Ok(()) => {
                let def = self.def();
                def.removed_class_options.remove(option.human_name());
                def.class_options
                    .insert(option.human_name().to_string(), option);
            }
            Err(error) => self.defer(error),
        }

        self
    }

    /// Add a positional argument consumed ahead of every command's own arguments.
    pub fn class_argument(mut self, argument: Argument) -> Self {
        let mut arguments = self.registry.resolve(self.id).class_arguments;

        if let Err(error) = check_argument(&mut arguments, argument.clone()) {
            self.defer(error);
        } else {
            let def = self.def();
            def.removed_class_arguments.remove(argument.name());
            def.class_arguments.retain(|a| a.name() != argument.name());
            def.class_arguments.push(argument);
        }

        self
    }

    /// Add an option that commands pull in via [`CommandBuilder::include_options`].
    pub fn shared_option(mut self, option: Opt) -> Self {
        let check_default_type = self.registry.resolve(self.id).check_default_type();

        match option.validate(check_default_type) {
            Ok(()) => {
                self.def()
                    .shared_options
                    .insert(option.human_name().to_string(), option);
            }
            Err(error) => self.defer(error),
        }

        self
    }

    /// Add the named common class options.
    /// Only `backtrace` is available.
    pub fn common_class_options<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name: String = name.into();

            match name.as_str() {
                "backtrace" => {
                    self = self.class_option(
                        Opt::new("backtrace")
                            .default(false)
                            .description("Print stack traces with error messages"),
                    );
                }
                other => {
                    self.defer(DeclarationError::new(format!(
                        "Unknown common class option '{other}'."
                    )));
                }
            }
        }

        self
    }

    /// Alias `alias` to the command `command`, ex: `map("ls", "list")`.
    pub fn map(mut self, alias: impl Into<String>, command: impl Into<String>) -> Self {
        self.def()
            .map
            .insert(alias.into(), command.into().replace('-', "_"));
        self
    }

    /// Set the command run when no command name is given.
    pub fn default_command(mut self, name: impl Into<String>) -> Self {
        self.def().default_command.replace(name.into());
        self
    }

    /// Report unknown switches as errors, for the commands selected by `policy`.
    pub fn check_unknown_options(mut self, policy: UnknownPolicy) -> Self {
        self.def().check_unknown.replace(policy);
        self
    }

    /// Stop option parsing at the first unknown token for the named commands.
    /// When such a command is given a positional token first, every token is treated as positional.
    pub fn stop_on_unknown_option<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name = name.into().replace('-', "_");
            self.def().stop_on_unknown.insert(name);
        }

        self
    }

    /// Skip the required option check for the named commands.
    pub fn disable_required_check<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name = name.into().replace('-', "_");
            self.def().disable_required_check.insert(name);
        }

        self
    }

    /// Do not let tokens left over by the option parser fill positional arguments.
    pub fn strict_args_position(mut self, strict: bool) -> Self {
        self.def().strict_args_position.replace(strict);
        self
    }

    /// Reject option defaults whose type does not match the option type (otherwise a warning is logged).
    pub fn check_default_type(mut self, check: bool) -> Self {
        self.def().check_default_type.replace(check);
        self
    }

    /// Exit with status 1 when [`Registry::start`] hits a framework error.
    pub fn exit_on_failure(mut self, exit: bool) -> Self {
        self.def().exit_on_failure.replace(exit);
        self
    }

    /// Register a command (and its handler, if it has one).
    pub fn command(mut self, builder: CommandBuilder) -> Self {
        let (command, inclusion, method) = match builder.finish() {
            Ok(finished) => finished,
            Err(error) => {
                self.defer(error);
                return self;
            }
        };

        let view = self.registry.resolve(self.id);

        for option in command.options().values() {
            if let Err(error) = option.validate(view.check_default_type()) {
                self.defer(error);
                return self;
            }
        }

        let mut options = view.find_shared_options(&inclusion.names, &inclusion.groups);

        for name in &inclusion.names {
            if !options.contains_key(name.as_str())
                && !options.values().any(|o| o.name() == name.as_str())
            {
                self.defer(DeclarationError::new(format!(
                    "Shared option '{name}' is not declared."
                )));
                return self;
            }
        }

        for (key, option) in command.options() {
            options.insert(key.clone(), option.clone());
        }

        let command = command.with_options(options);

        if let Err(error) = check_argument_order(view.class_arguments(), &command) {
            self.defer(error);
            return self;
        }

        let name = command.name().to_string();
        debug!("Registering command '{name}' on class '{}'.", view.name());
        let def = self.def();
        def.removed_commands.remove(&name);

        if let Some(method) = method {
            def.methods.insert(name.clone(), method);
        }

        def.commands.insert(name, command);
        self
    }

    /// Copy an inherited command into this class, transformed by `refresh`.
    pub fn refresh_command<F>(mut self, name: &str, refresh: F) -> Self
    where
        F: FnOnce(Command) -> Command,
    {
        let name = name.replace('-', "_");
        let view = self.registry.resolve(self.id);

        match view.all_commands().get(&name) {
            Some(command) => {
                let refreshed = refresh(command.clone());
                self.def().commands.insert(name, refreshed);
            }
            None => {
                self.defer(DeclarationError::new(format!(
                    "Cannot refresh command '{name}': it is not declared."
                )));
            }
        }

        self
    }

    /// Remove commands, inherited ones included.
    pub fn remove_command<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name = name.into().replace('-', "_");
            let def = self.def();
            def.commands.shift_remove(&name);
            def.removed_commands.insert(name);
        }

        self
    }

    /// Remove class options, inherited ones included.
    pub fn remove_class_option<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name: String = name.into();
            let def = self.def();
            def.class_options.shift_remove(&name);
            def.removed_class_options.insert(name);
        }

        self
    }

    /// Remove class arguments, inherited ones included.
    pub fn remove_class_argument<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name: String = name.into();
            let def = self.def();
            def.class_arguments.retain(|a| a.name() != name);
            def.removed_class_arguments.insert(name);
        }

        self
    }

    /// Register a public handler under `name` without declaring a command for it.
    /// See [`ClassBuilder::public_command`].
    pub fn method<F>(self, name: &str, arity: Arity, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, Vec<String>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.add_method(name, Method::new(Arc::new(handler), arity, Visibility::Public))
    }

    /// Register a private handler under `name`.
    /// Dispatching to it fails as if the command did not exist.
    pub fn private_method<F>(self, name: &str, arity: Arity, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, Vec<String>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.add_method(name, Method::new(Arc::new(handler), arity, Visibility::Private))
    }

    fn add_method(mut self, name: &str, method: Method) -> Self {
        if RESERVED_WORDS.contains(&name) {
            self.defer(DeclarationError::new(format!(
                "\"{name}\" is a reserved word and cannot be defined as command"
            )));
        } else {
            self.def().methods.insert(name.replace('-', "_"), method);
        }

        self
    }

    /// Declare commands for previously registered methods, using their names as usage.
    pub fn public_command<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for name in names {
            let name: String = name.into().replace('-', "_");
            let view = self.registry.resolve(self.id);

            match view.method(&name) {
                Some(method) if method.is_public() => {
                    self.def()
                        .commands
                        .insert(name.clone(), Command::internal(name.as_str(), name.as_str(), ""));
                }
                _ => {
                    self.defer(DeclarationError::new(format!(
                        "Cannot make '{name}' a public command: no public method is registered under it."
                    )));
                }
            }
        }

        self
    }

    /// Handle commands that have no handler of their own.
    pub fn method_missing<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Context<'_>, &str, Vec<String>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.def().method_missing.replace(Arc::new(handler));
        self
    }

    /// Transform the value returned by every successful handler of this class.
    pub fn on_run_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context<'_>, Value, &[String]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.def().on_run_success.replace(Arc::new(hook));
        self
    }

    /// Map the error of every failed invocation of this class.
    pub fn on_run_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Context<'_>, &Error, &[String]) -> Option<Error> + Send + Sync + 'static,
    {
        self.def().on_run_error.replace(Arc::new(hook));
        self
    }

    /// Delegate the command `name` to the class `class`.
    ///
    /// `prog name ...` dispatches `...` into `class`, handing down the options parsed so far.
    /// The commands of `class` are listed under `name` from then on.
    pub fn subcommand(mut self, name: &str, class: ClassId, description: Option<&str>) -> Self {
        if class == self.id || !self.registry.contains(class) || class == self.registry.base() {
            self.defer(DeclarationError::new(format!(
                "Subcommand '{name}' must delegate to another declared class."
            )));
            return self;
        }

        let command_name = name.replace('-', "_");
        let ancestor_name = name.to_string();
        let target = class;
        let mut command = Command::build(name).usage(format!("{name} SUBCOMMAND ...args"));

        if let Some(description) = description {
            command = command.description(description);
        }

        self = self.command(command.handler(Arity::any(), move |ctx, args| {
            let (args, mut opts) = split(args);
            let mut argv = Vec::with_capacity(args.len() + opts.len() + 1);
            let help = ["--help", "-h"]
                .into_iter()
                .find(|switch| opts.iter().any(|token| token == switch));

            if let Some(switch) = help {
                opts.retain(|token| token != switch);
                argv.push(HELP_COMMAND.to_string());
            }

            argv.extend(args);
            argv.extend(opts);
            Ok(ctx.invoke_subcommand(target, argv)?)
        }));
        self.def().subcommands.insert(command_name, class);

        let view = self.registry.resolve(class);
        let sub = self.registry.def_mut(class);
        sub.subcommand_help = true;
        sub.commands.insert(
            HELP_COMMAND.to_string(),
            Command::internal(
                HELP_COMMAND,
                "help [COMMAND]",
                "Describe subcommands or one specific subcommand",
            )
            .with_ancestor(&ancestor_name),
        );

        for (key, command) in view.all_commands() {
            if key != HELP_COMMAND && command.get_ancestor_name().is_none() {
                sub.commands
                    .insert(key.clone(), command.with_ancestor(&ancestor_name));
            }
        }

        self
    }

    /// Finish declaring the class.
    pub fn build(self) -> Result<ClassId, Error> {
        if let Some(error) = self.deferred_error {
            return Err(error);
        }

        let view = self.registry.resolve(self.id);

        for command in view.all_commands().values() {
            check_argument_order(view.class_arguments(), command)?;
        }

        Ok(self.id)
    }
}
