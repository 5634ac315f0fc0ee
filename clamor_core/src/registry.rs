use std::sync::Arc;

use crate::api::{ClassBuilder, Command, Method, Visibility};
use crate::constant::{BASE_CLASS, DEFAULT_NAMESPACE, HELP_COMMAND, HELP_MAPPINGS};
use crate::help;
use crate::model::Arity;

mod class;
mod view;

pub use class::{ErrorHook, MissingHandler, SuccessHook, UnknownPolicy};
pub(crate) use class::ClassDef;
pub use view::ClassView;

/// Identifies a class declared on a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) usize);

/// Holds every declared class.
///
/// Each class inherits from the built-in base class (or from another class via [`ClassBuilder::inherits`]).
/// The base class carries the `help` command, reachable via `-h`, `-?`, `--help` and `-D`.
///
/// ### Example
/// ```
/// # use clamor_core as clamor;
/// use clamor::{Arity, Command, Config, Registry, Value};
///
/// let mut registry = Registry::new();
/// let app = registry
///     .class("App")
///     .command(
///         Command::build("hello")
///             .description("Say hello")
///             .handler(Arity::exactly(0), |ctx, _args| {
///                 ctx.say("hello");
///                 Ok(Value::Null)
///             }),
///     )
///     .build()
///     .unwrap();
///
/// let result = registry.dispatch(app, None, vec!["hello".to_string()], None, Config::new("app"));
/// assert!(result.is_ok());
/// ```
#[derive(Debug)]
pub struct Registry {
    classes: Vec<ClassDef>,
    base: ClassId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only the base class.
    pub fn new() -> Self {
        let mut base = ClassDef::new(BASE_CLASS, None);
        base.namespace.replace(DEFAULT_NAMESPACE.to_string());
        base.commands.insert(
            HELP_COMMAND.to_string(),
            Command::internal(
                HELP_COMMAND,
                "help [COMMAND]",
                "Describe available commands or one specific command",
            ),
        );
        base.methods.insert(
            HELP_COMMAND.to_string(),
            Method::new(Arc::new(help::help), Arity::any(), Visibility::Public),
        );

        for mapping in HELP_MAPPINGS {
            base.map
                .insert(mapping.to_string(), HELP_COMMAND.to_string());
        }

        base.disable_required_check
            .insert(HELP_COMMAND.to_string());

        Self {
            classes: vec![base],
            base: ClassId(0),
        }
    }

    /// The built-in class every other class inherits from.
    pub fn base(&self) -> ClassId {
        self.base
    }

    /// Declare a new class, inheriting from the base class.
    pub fn class(&mut self, name: impl Into<String>) -> ClassBuilder<'_> {
        let id = ClassId(self.classes.len());
        self.classes.push(ClassDef::new(name, Some(self.base)));
        ClassBuilder::new(self, id)
    }

    pub(crate) fn def(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.0]
    }

    pub(crate) fn def_mut(&mut self, id: ClassId) -> &mut ClassDef {
        &mut self.classes[id.0]
    }

    pub(crate) fn contains(&self, id: ClassId) -> bool {
        id.0 < self.classes.len()
    }

    /// Merge `id` with its ancestry into a [`ClassView`].
    ///
    /// ### Panics
    /// When `id` was not declared on this registry.
    /// [`Registry::dispatch`] checks this up front and returns an error instead.
    pub fn resolve(&self, id: ClassId) -> ClassView {
        let mut chain = vec![id];
        let mut current = self.def(id).parent;

        while let Some(parent) = current {
            chain.push(parent);
            current = self.def(parent).parent;
        }

        chain.reverse();
        let leaf = self.def(id);
        let mut view = ClassView {
            id,
            name: leaf.name.clone(),
            namespace: leaf
                .namespace
                .clone()
                .unwrap_or_else(|| snake_case(&leaf.name)),
            package_name: leaf.package_name.clone(),
            commands: Default::default(),
            map: Default::default(),
            class_options: Default::default(),
            class_arguments: Default::default(),
            shared_options: Default::default(),
            methods: Default::default(),
            method_missing: leaf.method_missing.clone(),
            check_unknown: None,
            stop_on_unknown: Default::default(),
            disable_required_check: Default::default(),
            subcommands: Default::default(),
            subcommand_help: leaf.subcommand_help,
            strict_args_position: false,
            check_default_type: false,
            exit_on_failure: false,
            default_command: None,
            on_run_success: None,
            on_run_error: None,
        };

        for id in chain {
            let def = self.def(id);

            for name in &def.removed_commands {
                view.commands.shift_remove(name);
            }

            for (name, command) in &def.commands {
                view.commands.insert(name.clone(), command.clone());
            }

            view.map
                .extend(def.map.iter().map(|(k, v)| (k.clone(), v.clone())));

            for name in &def.removed_class_options {
                view.class_options.shift_remove(name);
            }

            view.class_options.extend(
                def.class_options
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );

            view.class_arguments
                .retain(|a| !def.removed_class_arguments.contains(a.name()));

            for argument in &def.class_arguments {
                view.class_arguments.retain(|a| a.name() != argument.name());
                view.class_arguments.push(argument.clone());
            }

            view.shared_options.extend(
                def.shared_options
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            view.methods
                .extend(def.methods.iter().map(|(k, v)| (k.clone(), v.clone())));

            if def.check_unknown.is_some() {
                view.check_unknown = def.check_unknown.clone();
            }

            view.stop_on_unknown
                .extend(def.stop_on_unknown.iter().cloned());
            view.disable_required_check
                .extend(def.disable_required_check.iter().cloned());
            view.subcommands
                .extend(def.subcommands.iter().map(|(k, v)| (k.clone(), *v)));

            if let Some(strict) = def.strict_args_position {
                view.strict_args_position = strict;
            }

            if let Some(check) = def.check_default_type {
                view.check_default_type = check;
            }

            if let Some(exit) = def.exit_on_failure {
                view.exit_on_failure = exit;
            }

            if def.default_command.is_some() {
                view.default_command = def.default_command.clone();
            }

            if def.on_run_success.is_some() {
                view.on_run_success = def.on_run_success.clone();
            }

            if def.on_run_error.is_some() {
                view.on_run_error = def.on_run_error.clone();
            }
        }

        view
    }
}

/// `MyApp` becomes `my_app`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::default();

    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }

            out.extend(c.to_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Argument, Opt};
    use crate::model::Value;
    use rstest::rstest;

    #[rstest]
    #[case("App", "app")]
    #[case("MyApp", "my_app")]
    #[case("remote-cli", "remote_cli")]
    fn snake(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(snake_case(name), expected);
    }

    #[test]
    fn base_class() {
        let registry = Registry::new();
        let view = registry.resolve(registry.base());

        assert_eq!(view.namespace(), "default");
        assert_eq!(view.all_commands().keys().collect::<Vec<_>>(), vec!["help"]);
        assert_eq!(view.map().len(), 4);
        assert!(view.disable_required_check(&view.all_commands()["help"]));
        assert!(!view.check_unknown_options(None));
    }

    #[test]
    fn inheritance() {
        // Setup
        let mut registry = Registry::new();
        let parent = registry
            .class("Parent")
            .class_option(Opt::new("verbose").default(false))
            .class_option(Opt::new("color").default(true))
            .class_argument(Argument::new("target"))
            .command(Command::build("list").description("List"))
            .command(Command::build("show").description("Show"))
            .map("ls", "list")
            .strict_args_position(true)
            .build()
            .unwrap();

        // Execute
        let child = registry
            .class("Child")
            .inherits(parent)
            .remove_class_option(["color"])
            .remove_command(["show"])
            .command(Command::build("list").description("List children"))
            .build()
            .unwrap();
        let view = registry.resolve(child);

        // Verify
        assert_eq!(view.namespace(), "child");
        assert_eq!(
            view.all_commands().keys().collect::<Vec<_>>(),
            vec!["help", "list"]
        );
        assert_eq!(view.all_commands()["list"].get_description(), "List children");
        assert_eq!(view.map()["ls"], "list");
        assert_eq!(
            view.class_options().keys().collect::<Vec<_>>(),
            vec!["verbose"]
        );
        assert_eq!(view.class_arguments().len(), 1);
        assert!(view.strict_args_position());

        let parent_view = registry.resolve(parent);
        assert_eq!(
            parent_view.all_commands()["list"].get_description(),
            "List"
        );
        assert!(parent_view.all_commands().contains_key("show"));
    }

    #[test]
    fn class_argument_removed() {
        let mut registry = Registry::new();
        let parent = registry
            .class("Parent")
            .class_argument(Argument::new("target"))
            .build()
            .unwrap();
        let child = registry
            .class("Child")
            .inherits(parent)
            .remove_class_argument(["target"])
            .class_argument(Argument::new("other").default(Value::from("x")))
            .build()
            .unwrap();

        let view = registry.resolve(child);
        assert_eq!(view.class_arguments().len(), 1);
        assert_eq!(view.class_arguments()[0].name(), "other");
    }
}
