use indexmap::IndexMap;

use crate::api::Opt;
use crate::constant::HELP_COMMAND;
use crate::context::{Config, Context};
use crate::error::{BoxError, Error};
use crate::interface::{print_table, print_wrapped, Shell};
use crate::model::Value;
use crate::registry::ClassView;

/// The handler of the built-in `help` command.
///
/// Without arguments, lists the class's commands.
/// With a subcommand name, lists the subcommand's commands (or describes the named one).
/// Otherwise describes the named command.
pub(crate) fn help(ctx: &mut Context<'_>, args: Vec<String>) -> Result<Value, BoxError> {
    let mut args = args.into_iter();

    match args.next() {
        Some(name) => match ctx.view().subcommand_classes().get(&name.replace('-', "_")) {
            Some(&class) => {
                let rest: Vec<String> = args.collect();

                if rest.is_empty() {
                    let view = ctx.registry().resolve(class);
                    class_help(&view, ctx.config(), true);
                } else {
                    let mut argv = vec![HELP_COMMAND.to_string()];
                    argv.extend(rest);
                    ctx.invoke_subcommand(class, argv)?;
                }
            }
            None => command_help(ctx.view(), ctx.config(), &name)?,
        },
        None => class_help(ctx.view(), ctx.config(), ctx.view().subcommand_help),
    }

    Ok(Value::Null)
}

/// List the visible commands of `view`, followed by its class options.
pub(crate) fn class_help(view: &ClassView, config: &Config, is_subcommand: bool) {
    let shell = config.get_shell();
    let mut rows: Vec<(String, String)> = view
        .all_commands()
        .values()
        .filter(|command| !command.is_hidden())
        .map(|command| {
            (
                view.banner(config.program(), command, false, is_subcommand),
                describe(command.get_description()),
            )
        })
        .collect();
    rows.sort();

    match view.package_name() {
        Some(package_name) => shell.say(&format!("{package_name} commands:")),
        None => shell.say("Commands:"),
    }

    print_table(shell, &rows, 2);
    shell.say("");
    options_help(shell, view.class_options().values(), Vec::default());
}

/// Describe the command `name` of `view`: usage, options, and description.
pub(crate) fn command_help(view: &ClassView, config: &Config, name: &str) -> Result<(), Error> {
    let shell = config.get_shell();
    let normalized = view.normalize_command_name(Some(name))?;
    let command = view
        .all_commands()
        .get(&normalized)
        .ok_or_else(|| Error::CommandNotFound {
            name: normalized.clone(),
            namespace: config
                .is_show_namespace()
                .then(|| view.namespace().to_string()),
        })?;

    shell.say("Usage:");
    shell.say(&format!(
        "  {}",
        view.banner(config.program(), command, false, false)
    ));
    shell.say("");
    options_help(
        shell,
        view.class_options().values(),
        command.options().values().collect(),
    );

    match command.get_long_description() {
        Some(long_description) => {
            shell.say("Description:");
            print_wrapped(shell, long_description, 2);
        }
        None => shell.say(command.get_description()),
    }

    if !command.get_examples().is_empty() {
        shell.say("");
        shell.say("Examples:");

        for example in command.get_examples() {
            shell.say(&format!("  {example}"));
        }
    }

    Ok(())
}

/// Print `leading` options under `Options:` along with the ungrouped `class_options`, then each group of class options.
fn options_help<'a>(
    shell: &dyn Shell,
    class_options: impl Iterator<Item = &'a Opt>,
    leading: Vec<&'a Opt>,
) {
    let mut groups: IndexMap<Option<&str>, Vec<&Opt>> = IndexMap::default();
    groups.insert(None, Vec::default());

    for option in leading.into_iter().chain(class_options) {
        if !option.is_hidden() {
            groups.entry(option.get_group()).or_default().push(option);
        }
    }

    for (group, options) in groups {
        print_options(shell, &options, group);
    }
}

fn print_options(shell: &dyn Shell, options: &[&Opt], group: Option<&str>) {
    if options.is_empty() {
        return;
    }

    let padding = options
        .iter()
        .map(|option| match option.get_aliases() {
            [] => 0,
            aliases => aliases.join(", ").len() + 2,
        })
        .max()
        .unwrap_or(0);
    let mut rows = Vec::default();

    for option in options {
        rows.push((
            option.usage(padding),
            option
                .argument()
                .get_description()
                .map(describe)
                .unwrap_or_default(),
        ));

        if option.show_default() {
            if let Some(default) = option.argument().get_default() {
                rows.push((String::default(), format!("# Default: {default}")));
            }
        }

        if let Some(choices) = option.argument().get_choices() {
            let choices: Vec<String> = choices.iter().map(Value::to_string).collect();
            rows.push((
                String::default(),
                format!("# Possible values: {}", choices.join(", ")),
            ));
        }
    }

    match group {
        Some(group) => shell.say(&format!("{group} options:")),
        None => shell.say("Options:"),
    }

    print_table(shell, &rows, 2);
    shell.say("");
}

fn describe(description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().collect();

    if words.is_empty() {
        String::default()
    } else {
        format!("# {}", words.join(" "))
    }
}
