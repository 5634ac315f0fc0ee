use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::api::Command;
use crate::error::Error;
use crate::interface::{ConsoleShell, Shell};
use crate::model::{Options, Value};
use crate::registry::{ClassId, ClassView, Registry};

/// Settings carried through a dispatch.
///
/// ### Example
/// ```
/// # use clamor_core as clamor;
/// use clamor::Config;
///
/// let config = Config::new("prog").debug(true);
/// assert_eq!(config.program(), "prog");
/// assert!(config.get("debug").unwrap().truthy());
/// ```
#[derive(Clone)]
pub struct Config {
    program: String,
    shell: Rc<dyn Shell>,
    invoked_via_subcommand: bool,
    class_options: Option<Options>,
    show_namespace: bool,
    values: IndexMap<String, Value>,
    current_command: Option<Command>,
}

impl Default for Config {
    /// A config named after the running executable.
    fn default() -> Self {
        let program = std::env::args()
            .next()
            .map(|arg0| {
                std::path::Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or(arg0)
            })
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
        Self::new(program)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("program", &self.program)
            .field("invoked_via_subcommand", &self.invoked_via_subcommand)
            .field("class_options", &self.class_options)
            .field("show_namespace", &self.show_namespace)
            .field("values", &self.values)
            .field(
                "current_command",
                &self.current_command.as_ref().map(Command::name),
            )
            .finish_non_exhaustive()
    }
}

impl Config {
    /// A config for the program `program`, writing to the console.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            shell: Rc::new(ConsoleShell::default()),
            invoked_via_subcommand: false,
            class_options: None,
            show_namespace: false,
            values: IndexMap::default(),
            current_command: None,
        }
    }

    /// Write help and errors to `shell`.
    pub fn shell(mut self, shell: Rc<dyn Shell>) -> Self {
        self.shell = shell;
        self
    }

    /// Prefix usages and not-found errors with the class namespace.
    pub fn show_namespace(mut self, show_namespace: bool) -> Self {
        self.show_namespace = show_namespace;
        self
    }

    /// Set an arbitrary value, ex: `debug`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Raise errors instead of reporting them, and print backtraces.
    pub fn debug(self, debug: bool) -> Self {
        self.set("debug", debug)
    }

    /// Raise errors instead of reporting them.
    pub fn raise_errors(self, raise_errors: bool) -> Self {
        self.set("raise_errors", raise_errors)
    }

    /// Print the error's causes when reporting it.
    pub fn backtrace(self, backtrace: bool) -> Self {
        self.set("backtrace", backtrace)
    }

    #[allow(missing_docs)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The program name, as shown in usages.
    pub fn program(&self) -> &str {
        &self.program
    }

    #[allow(missing_docs)]
    pub fn get_shell(&self) -> &dyn Shell {
        self.shell.as_ref()
    }

    /// Whether this dispatch was delegated by a subcommand.
    pub fn invoked_via_subcommand(&self) -> bool {
        self.invoked_via_subcommand
    }

    /// The options parsed by the delegating class, when delegated by a subcommand.
    pub fn class_options(&self) -> Option<&Options> {
        self.class_options.as_ref()
    }

    #[allow(missing_docs)]
    pub fn is_show_namespace(&self) -> bool {
        self.show_namespace
    }

    /// The command being dispatched.
    pub fn current_command(&self) -> Option<&Command> {
        self.current_command.as_ref()
    }

    pub(crate) fn set_current_command(&mut self, command: Command) {
        self.current_command.replace(command);
    }

    /// The config for a dispatch delegated by a subcommand, handing down `options`.
    pub(crate) fn for_subcommand(&self, options: Options) -> Config {
        Config {
            invoked_via_subcommand: true,
            class_options: Some(options),
            current_command: None,
            ..self.clone()
        }
    }

    /// The config for a nested dispatch into another class.
    pub(crate) fn for_invocation(&self) -> Config {
        Config {
            invoked_via_subcommand: false,
            class_options: None,
            current_command: None,
            ..self.clone()
        }
    }
}

/// Everything a handler gets to see: the parsed options and arguments, the command, and the config.
pub struct Context<'r> {
    registry: &'r Registry,
    view: ClassView,
    command: Command,
    options: Options,
    arguments: IndexMap<String, Value>,
    args: Vec<String>,
    config: Config,
}

impl<'r> fmt::Debug for Context<'r> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("class", &self.view.name())
            .field("command", &self.command.name())
            .field("options", &self.options)
            .field("arguments", &self.arguments)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl<'r> Context<'r> {
    pub(crate) fn new(
        registry: &'r Registry,
        view: ClassView,
        command: Command,
        options: Options,
        arguments: IndexMap<String, Value>,
        args: Vec<String>,
        config: Config,
    ) -> Self {
        Self {
            registry,
            view,
            command,
            options,
            arguments,
            args,
            config,
        }
    }

    /// The parsed options: class options, command options, and those handed down by a subcommand.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The value of the positional argument `name`.
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    /// Every positional argument value, in declaration order.
    pub fn arguments(&self) -> &IndexMap<String, Value> {
        &self.arguments
    }

    /// The positional tokens left over once every argument has been consumed.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The command being run.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// The class the command is run on.
    pub fn view(&self) -> &ClassView {
        &self.view
    }

    #[allow(missing_docs)]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn shell(&self) -> &dyn Shell {
        self.config.get_shell()
    }

    /// Write a line of output to the shell.
    pub fn say(&self, message: &str) {
        self.config.get_shell().say(message);
    }

    /// The options restricted to `names`.
    pub fn option_slice<'k>(&self, names: impl IntoIterator<Item = &'k str>) -> Options {
        self.options.slice(names)
    }

    /// Dispatch `argv` into `class`, as a separate invocation.
    pub fn invoke(&self, class: ClassId, name: Option<&str>, argv: Vec<String>) -> Result<Value, Error> {
        self.registry
            .dispatch(class, name, argv, None, self.config.for_invocation())
    }

    /// Dispatch `argv` into `class` as a subcommand, handing down the options parsed so far.
    pub fn invoke_subcommand(&self, class: ClassId, argv: Vec<String>) -> Result<Value, Error> {
        self.registry.dispatch(
            class,
            None,
            argv,
            None,
            self.config.for_subcommand(self.options.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::CapturedShell;

    #[test]
    fn config_values() {
        let config = Config::new("prog")
            .debug(true)
            .raise_errors(false)
            .set("level", 3);

        assert_eq!(config.get("debug"), Some(&Value::Bool(true)));
        assert_eq!(config.get("raise_errors"), Some(&Value::Bool(false)));
        assert_eq!(config.get("level"), Some(&Value::Integer(3)));
        assert_eq!(config.get("backtrace"), None);
    }

    #[test]
    fn subcommand_config() {
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone()).show_namespace(true);
        let options: Options = vec![("verbose", true)].into_iter().collect();

        let sub = config.for_subcommand(options.clone());
        assert!(sub.invoked_via_subcommand());
        assert_eq!(sub.class_options(), Some(&options));
        assert!(sub.is_show_namespace());
        sub.get_shell().say("through the clone");

        let nested = sub.for_invocation();
        assert!(!nested.invoked_via_subcommand());
        assert_eq!(nested.class_options(), None);
        assert_eq!(shell.output(), "through the clone");
    }

    #[test]
    fn default_program() {
        let config = Config::default();
        assert!(!config.program().is_empty());
        assert!(!config.program().contains('/'));
    }
}
