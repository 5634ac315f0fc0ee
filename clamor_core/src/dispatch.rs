use tracing::debug;

use crate::api::Command;
use crate::context::{Config, Context};
use crate::error::{DeclarationError, Error};
use crate::invocation::invoke_command;
use crate::model::{Options, Value};
use crate::parser::{split, ArgumentParser, OptionTable};
use crate::registry::{ClassId, Registry};

impl Registry {
    /// Resolve and run a command of `class`.
    ///
    /// Without a `name`, the command name is taken off the front of `argv` (or the default command is run).
    /// `preparsed` options are assigned ahead of parsing, and win over parsed ones.
    pub fn dispatch(
        &self,
        class: ClassId,
        name: Option<&str>,
        argv: Vec<String>,
        preparsed: Option<Options>,
        config: Config,
    ) -> Result<Value, Error> {
        self.dispatch_observed(class, name, argv, preparsed, config, |_| {})
    }

    /// Like [`Registry::dispatch`], showing `observer` the context before the command runs.
    pub fn dispatch_observed<F>(
        &self,
        class: ClassId,
        name: Option<&str>,
        argv: Vec<String>,
        preparsed: Option<Options>,
        mut config: Config,
        observer: F,
    ) -> Result<Value, Error>
    where
        F: FnOnce(&Context<'_>),
    {
        if !self.contains(class) {
            return Err(DeclarationError::new(format!(
                "Class #{} is not declared on this registry.",
                class.0
            ))
            .into());
        }

        let view = self.resolve(class);
        let mut given_args = argv;
        let meth = match name {
            Some(name) => Some(name.to_string()),
            None => view.retrieve_command_name(&mut given_args),
        };
        let mut command = view
            .all_commands()
            .get(&view.normalize_command_name(meth.as_deref())?)
            .cloned();

        if command.is_none() && config.invoked_via_subcommand() {
            debug!(
                "No command {meth:?} on '{}', falling back to '{}'.",
                view.name(),
                view.default_command()
            );

            if let Some(meth) = &meth {
                given_args.insert(0, meth.clone());
            }

            command = view
                .all_commands()
                .get(&view.normalize_command_name(None)?)
                .cloned();
        }

        let (command, args, opts) = match command {
            Some(command) => {
                let (mut args, mut opts) = split(given_args);

                if view.stop_on_unknown_option(&command) && !args.is_empty() {
                    args.append(&mut opts);
                }

                (command, args, opts)
            }
            None => {
                let name = meth.unwrap_or_default().replace('-', "_");
                (Command::dynamic(name), given_args, Vec::default())
            }
        };

        debug!(
            "Dispatching '{}' on '{}' with args {args:?} and opts {opts:?}.",
            command.name(),
            view.name()
        );
        config.set_current_command(command.clone());

        let mut parse_options = view.class_options().clone();

        for (key, option) in command.options() {
            parse_options.insert(key.clone(), option.clone());
        }

        let preparsed = preparsed.unwrap_or_default();
        let mut table = OptionTable::new(
            &parse_options,
            &preparsed,
            view.stop_on_unknown_option(&command),
            view.disable_required_check(&command),
        );
        let mut options = table.parse(opts)?;

        if let Some(class_options) = config.class_options() {
            options = class_options.overlay(&options);
        }

        options = options.overlay(&preparsed);

        if view.check_unknown_options(config.current_command()) {
            table.check_unknown()?;
        }

        let mut to_parse = args;

        if !view.strict_args_position() {
            to_parse.extend(table.remaining().iter().cloned());
        }

        let mut arguments = view.class_arguments().to_vec();
        arguments.extend(command.arguments().iter().cloned());
        let parsed = ArgumentParser::new(&arguments).parse(to_parse)?;

        let mut context = Context::new(
            self,
            view,
            command.clone(),
            options,
            parsed.values,
            parsed.remaining.clone(),
            config,
        );
        observer(&context);
        invoke_command(&mut context, &command, parsed.remaining)
    }
}
