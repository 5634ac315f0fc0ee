use std::error::Error as StdError;

use tracing::debug;

use crate::constant::{ENV_PREFIXES, TRUTHY_STRINGS};
use crate::context::Config;
use crate::error::Error;
use crate::model::{Options, Value};
use crate::registry::{ClassId, Registry};

/// How an [`Execution`] ended.
#[derive(Debug)]
pub enum Outcome {
    /// The command ran, producing this value.
    Success(Value),
    /// The error was reported to the shell; the process should exit with this code.
    Exit(i32),
    /// The error is handed back to the caller (debug or `raise_errors` mode).
    Raise(Error),
}

/// A top level run of a class over the process arguments.
///
/// Errors are either reported to the shell or raised, following the `debug`, `backtrace`, and `raise_errors` flags.
/// Each flag is read from the parsed options, then the [`Config`], then the `CLAMOR_<FLAG>` environment variable.
///
/// ### Example
/// ```
/// # use clamor_core as clamor;
/// use clamor::prelude::*;
///
/// let mut registry = Registry::new();
/// let app = registry
///     .class("App")
///     .command(Command::build("ping").handler(Arity::any(), |_, _| Ok(Value::from("pong"))))
///     .build()
///     .unwrap();
///
/// let outcome = Execution::new(&registry, app, vec!["ping".to_string()], Config::new("app")).run();
/// assert!(matches!(outcome, Outcome::Success(Value::String(s)) if s == "pong"));
/// ```
#[derive(Debug)]
pub struct Execution<'r> {
    registry: &'r Registry,
    class: ClassId,
    name: Option<String>,
    argv: Vec<String>,
    config: Config,
}

impl<'r> Execution<'r> {
    #[allow(missing_docs)]
    pub fn new(registry: &'r Registry, class: ClassId, argv: Vec<String>, config: Config) -> Self {
        Self {
            registry,
            class,
            name: None,
            argv,
            config,
        }
    }

    /// Run the command `name` rather than taking the name off the front of the arguments.
    pub fn command(mut self, name: impl Into<String>) -> Self {
        self.name.replace(name.into());
        self
    }

    #[allow(missing_docs)]
    pub fn run(self) -> Outcome {
        let Execution {
            registry,
            class,
            name,
            argv,
            config,
        } = self;
        let mut options = None;
        let result = registry.dispatch_observed(
            class,
            name.as_deref(),
            argv,
            None,
            config.clone(),
            |ctx| {
                options.replace(ctx.options().clone());
            },
        );

        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) if error.is_broken_pipe() => Outcome::Exit(0),
            Err(error) => {
                let env = |key: &str| std::env::var(key).ok();
                let debug_mode = flag("debug", options.as_ref(), &config, env);
                let backtrace = debug_mode || flag("backtrace", options.as_ref(), &config, env);
                let raise = debug_mode || flag("raise_errors", options.as_ref(), &config, env);
                debug!(debug = debug_mode, backtrace, raise, "Run failed: {error:?}");

                if raise {
                    Outcome::Raise(error)
                } else {
                    report(&config, &error, backtrace);
                    Outcome::Exit(1)
                }
            }
        }
    }
}

impl Registry {
    /// Run `class` over `argv`, reporting framework errors to the shell.
    ///
    /// Returns the exit code: `1` after a framework error when the class exits on failure, `0` otherwise.
    /// Framework errors are raised instead in debug mode (via [`Config::debug`] or `CLAMOR_DEBUG`).
    /// Errors from command handlers always propagate.
    pub fn start(&self, class: ClassId, argv: Vec<String>, config: Config) -> Result<i32, Error> {
        match self.dispatch(class, None, argv, None, config.clone()) {
            Ok(_) => Ok(0),
            Err(error) if error.is_broken_pipe() => Ok(0),
            Err(error)
                if error.is_framework()
                    && !flag("debug", None, &config, |key| std::env::var(key).ok()) =>
            {
                config.get_shell().error(&error.to_string());

                if self.contains(class) && self.resolve(class).exit_on_failure() {
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
            Err(error) => Err(error),
        }
    }
}

/// Read the flag `key` from `options`, then `config`, then the environment.
fn flag(
    key: &str,
    options: Option<&Options>,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> bool {
    if let Some(value) = options.and_then(|options| options.get(key)) {
        return value.truthy();
    }

    if let Some(value) = config.get(key) {
        return value.truthy();
    }

    ENV_PREFIXES.iter().any(|prefix| {
        env(&format!("{prefix}_{}", key.to_ascii_uppercase())).map_or(false, |value| {
            TRUTHY_STRINGS.contains(&value.trim().to_ascii_lowercase().as_str())
        })
    })
}

fn report(config: &Config, error: &Error, backtrace: bool) {
    let shell = config.get_shell();
    shell.error(&error.to_string());

    if backtrace {
        let mut source = error.source();

        while let Some(cause) = source {
            shell.error(&format!("Caused by: {cause}"));
            source = cause.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use rstest::rstest;

    use super::*;
    use crate::api::{Command, Opt};
    use crate::interface::CapturedShell;
    use crate::model::{ArgType, Arity};

    #[derive(Debug, thiserror::Error)]
    #[error("could not save")]
    struct SaveError(#[source] std::io::Error);

    fn registry(exit_on_failure: bool) -> (Registry, ClassId) {
        let mut registry = Registry::new();
        let class = registry
            .class("App")
            .class_option(Opt::new("debug").arg_type(ArgType::Boolean))
            .exit_on_failure(exit_on_failure)
            .command(Command::build("ok").handler(Arity::any(), |_, _| Ok(Value::from(1))))
            .command(Command::build("save").handler(Arity::any(), |_, _| {
                Err(SaveError(std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into())
            }))
            .command(Command::build("pipe").handler(Arity::any(), |_, _| {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into())
            }))
            .build()
            .unwrap();
        (registry, class)
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn run_success() {
        let (registry, class) = registry(true);

        assert_matches!(
            Execution::new(&registry, class, tokens(&["ok"]), Config::new("prog")).run(),
            Outcome::Success(Value::Integer(1))
        );
    }

    #[test]
    fn run_named_command() {
        let (registry, class) = registry(true);
        let outcome = Execution::new(&registry, class, Vec::default(), Config::new("prog"))
            .command("ok")
            .run();

        assert_matches!(outcome, Outcome::Success(Value::Integer(1)));
    }

    #[test]
    fn run_reports_errors() {
        // Setup
        let (registry, class) = registry(true);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone());

        // Execute
        let outcome = Execution::new(&registry, class, tokens(&["save"]), config).run();

        // Verify
        assert_matches!(outcome, Outcome::Exit(1));
        assert_eq!(shell.consume(), (None, Some("could not save".to_string())));
    }

    #[test]
    fn run_reports_causes() {
        // Setup
        let (registry, class) = registry(true);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone()).backtrace(true);

        // Execute
        let outcome = Execution::new(&registry, class, tokens(&["save"]), config).run();

        // Verify
        assert_matches!(outcome, Outcome::Exit(1));
        assert_eq!(shell.errors(), "could not save\nCaused by: disk full");
    }

    #[rstest]
    #[case(Config::new("prog").raise_errors(true), vec!["save"])]
    #[case(Config::new("prog").debug(true), vec!["save"])]
    #[case(Config::new("prog"), vec!["save", "--debug"])]
    #[case(Config::new("prog").debug(false), vec!["--debug", "bogus"])]
    fn run_raises(#[case] config: Config, #[case] argv: Vec<&str>) {
        let (registry, class) = registry(true);
        let shell = Rc::new(CapturedShell::default());

        let outcome = Execution::new(&registry, class, tokens(&argv), config.shell(shell.clone())).run();

        assert_matches!(outcome, Outcome::Raise(_));
        assert_eq!(shell.consume(), (None, None));
    }

    #[test]
    fn run_broken_pipe() {
        let (registry, class) = registry(true);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone());

        assert_matches!(
            Execution::new(&registry, class, tokens(&["pipe"]), config).run(),
            Outcome::Exit(0)
        );
        assert_eq!(shell.consume(), (None, None));
    }

    #[rstest]
    #[case(true, 1)]
    #[case(false, 0)]
    fn start_framework_error(#[case] exit_on_failure: bool, #[case] expected: i32) {
        let (registry, class) = registry(exit_on_failure);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone());

        assert_eq!(registry.start(class, tokens(&["bogus"]), config).unwrap(), expected);
        assert_eq!(
            shell.consume(),
            (None, Some("Could not find command \"bogus\".".to_string()))
        );
    }

    #[test]
    fn start_debug() {
        let (registry, class) = registry(true);
        let config = Config::new("prog").debug(true);

        assert_matches!(
            registry.start(class, tokens(&["bogus"]), config),
            Err(Error::CommandNotFound { .. })
        );
    }

    #[test]
    fn start_undeclared_class() {
        let (registry, _) = registry(true);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone());

        assert_eq!(registry.start(ClassId(42), tokens(&["ok"]), config).unwrap(), 0);
        assert_eq!(
            shell.consume(),
            (None, Some("Declaration error: Class #42 is not declared on this registry.".to_string()))
        );
    }

    #[test]
    fn start_handler_error() {
        let (registry, class) = registry(true);
        let shell = Rc::new(CapturedShell::default());
        let config = Config::new("prog").shell(shell.clone());

        assert_matches!(
            registry.start(class, tokens(&["save"]), config),
            Err(Error::Runtime(_))
        );
        assert_eq!(registry.start(class, tokens(&["pipe"]), Config::new("prog")).unwrap(), 0);
        assert_eq!(registry.start(class, tokens(&["ok"]), Config::new("prog")).unwrap(), 0);
        assert_eq!(shell.consume(), (None, None));
    }

    #[rstest]
    #[case(None, None, None, false)]
    #[case(Some(true), None, None, true)]
    #[case(Some(false), Some(true), Some("1"), false)]
    #[case(None, Some(false), Some("1"), false)]
    #[case(None, Some(true), None, true)]
    #[case(None, None, Some("1"), true)]
    #[case(None, None, Some(" Yes"), true)]
    #[case(None, None, Some("0"), false)]
    #[case(None, None, Some("nope"), false)]
    fn flag_precedence(
        #[case] option: Option<bool>,
        #[case] configured: Option<bool>,
        #[case] environment: Option<&str>,
        #[case] expected: bool,
    ) {
        let options: Options = option.into_iter().map(|value| ("debug", value)).collect();
        let mut config = Config::new("prog");

        if let Some(configured) = configured {
            config = config.debug(configured);
        }

        let env = |key: &str| {
            assert_eq!(key, "CLAMOR_DEBUG");
            environment.map(str::to_string)
        };

        assert_eq!(flag("debug", Some(&options), &config, env), expected);
    }
}
