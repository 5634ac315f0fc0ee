use tracing::{error, trace};

use crate::api::Command;
use crate::constant::OPTS_END;
use crate::context::Context;
use crate::error::Error;
use crate::model::Value;

/// Run `command` with its trailing `args`.
///
/// Private handlers are hidden as if the command did not exist.
/// A public handler gets `args` without the `--` separator (unless it delegates to a subcommand), after its arity is checked.
/// A command without handler goes to the class's catch-all handler, if any.
pub(crate) fn invoke_command(
    ctx: &mut Context<'_>,
    command: &Command,
    args: Vec<String>,
) -> Result<Value, Error> {
    let method = ctx.view().method(command.name()).cloned();

    if command.is_dynamic() && method.as_ref().map_or(false, |m| m.is_public()) {
        return Err(not_found(ctx, command));
    }

    let args: Vec<String> = match &method {
        Some(method) if method.is_public() && !ctx.view().is_subcommand(command.name()) => {
            args.into_iter().filter(|arg| arg != OPTS_END).collect()
        }
        _ => args,
    };

    let result = match method {
        Some(method) if !method.is_public() => Err(not_found(ctx, command)),
        Some(method) => {
            if !method.arity.accepts(args.len()) {
                return Err(arity_error(ctx, command, args));
            }

            trace!("Running '{}' with {args:?}.", command.name());
            (method.handler)(ctx, args.clone()).map_err(Error::from_handler)
        }
        None => match ctx.view().method_missing.clone() {
            Some(method_missing) => {
                trace!("Running catch-all for '{}' with {args:?}.", command.name());
                method_missing(ctx, command.name(), args.clone()).map_err(Error::from_handler)
            }
            None => Err(not_found(ctx, command)),
        },
    };

    hooks(ctx, result, &args)
}

/// Pass `result` through the class's success and error hooks.
fn hooks(ctx: &mut Context<'_>, result: Result<Value, Error>, args: &[String]) -> Result<Value, Error> {
    let result = match (result, ctx.view().on_run_success.clone()) {
        (Ok(value), Some(on_success)) => on_success(ctx, value, args).map_err(Error::from_handler),
        (result, _) => result,
    };

    match (result, ctx.view().on_run_error.clone()) {
        (Err(original), Some(on_error)) => match on_error(ctx, &original, args) {
            Some(replacement) => Err(replacement),
            None => {
                error!(
                    "The error hook of '{}' returned no error for: {original}",
                    ctx.view().name()
                );
                Err(original)
            }
        },
        (result, _) => result,
    }
}

fn not_found(ctx: &Context<'_>, command: &Command) -> Error {
    Error::CommandNotFound {
        name: command.name().to_string(),
        namespace: ctx
            .config()
            .is_show_namespace()
            .then(|| ctx.view().namespace().to_string()),
    }
}

fn arity_error(ctx: &Context<'_>, command: &Command, args: Vec<String>) -> Error {
    let name = match command.get_ancestor_name() {
        Some(ancestor_name) => format!("{ancestor_name} {}", command.name()),
        None => command.name().to_string(),
    };

    Error::Arity {
        command: format!("{} {name}", ctx.config().program()),
        args,
        usage: ctx
            .view()
            .banner(ctx.config().program(), command, false, false),
    }
}
