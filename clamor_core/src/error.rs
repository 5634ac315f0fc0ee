use thiserror::Error;

/// A boxed error returned by command handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error for a malformed declaration (argument, option, command, or class).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Declaration error: {0}")]
pub struct DeclarationError(pub(crate) String);

impl DeclarationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The bare message, without the `Declaration error:` prefix.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Error for tokens that do not satisfy the declared arguments/options.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A non-boolean option was given without a value.
    #[error("No value provided for option '{switch}'")]
    MissingValue {
        /// The switch as it was written, ex: `--name`.
        switch: String,
    },

    /// Required arguments/options were never assigned.
    #[error("No value provided for required {kind} '{}'", .names.join("', '"))]
    RequiredMissing {
        /// `arguments` or `options`.
        kind: &'static str,
        /// Switch names for options, human names for arguments.
        names: Vec<String>,
    },

    /// A value failed coercion or its enum constraint.
    #[error("{0}")]
    MalformedValue(String),

    /// Unknown switches were left over while unknown options are being checked.
    #[error("Unknown switches '{}'", .switches.join(", "))]
    UnknownArgument {
        #[allow(missing_docs)]
        switches: Vec<String>,
    },
}

/// The top level error for dispatching a command.
#[derive(Debug, Error)]
pub enum Error {
    /// The registry was declared incorrectly.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// A command name prefix matched several commands.
    #[error("Ambiguous command {input} matches [{}]", .candidates.join(", "))]
    AmbiguousCommand {
        #[allow(missing_docs)]
        input: String,
        #[allow(missing_docs)]
        candidates: Vec<String>,
    },

    /// The command does not exist, or is not invocable.
    #[error("Could not find command \"{name}\"{}.", .namespace.as_ref().map(|ns| format!(" in \"{ns}\" namespace")).unwrap_or_default())]
    CommandNotFound {
        #[allow(missing_docs)]
        name: String,
        /// Present when the program shows namespaces.
        namespace: Option<String>,
    },

    /// The tokens did not satisfy the declared arguments/options.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The handler was given a number of trailing tokens it does not accept.
    #[error("ERROR: \"{command}\" was called with {}\nUsage: \"{usage}\"", describe_args(.args))]
    Arity {
        /// The program basename followed by the command's full name.
        command: String,
        #[allow(missing_docs)]
        args: Vec<String>,
        /// The command's banner.
        usage: String,
    },

    /// An error raised by a command handler.
    #[error(transparent)]
    Runtime(BoxError),
}

impl Error {
    /// Whether this error originates from the framework rather than a command handler.
    pub fn is_framework(&self) -> bool {
        !matches!(self, Error::Runtime(_))
    }

    /// Wrap a handler error.
    ///
    /// A handler that propagates a framework error (ex: from a nested dispatch) keeps its kind.
    pub fn from_handler(error: BoxError) -> Self {
        match error.downcast::<Error>() {
            Ok(error) => *error,
            Err(error) => match error.downcast::<ParseError>() {
                Ok(error) => Error::Parse(*error),
                Err(error) => Error::Runtime(error),
            },
        }
    }

    /// Whether this error is an io broken pipe, as when output is piped into `head`.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            Error::Runtime(error) => error
                .downcast_ref::<std::io::Error>()
                .map_or(false, |e| e.kind() == std::io::ErrorKind::BrokenPipe),
            _ => false,
        }
    }
}

fn describe_args(args: &[String]) -> String {
    if args.is_empty() {
        "no arguments".to_string()
    } else {
        format!("arguments {args:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn ambiguous_message() {
        let error = Error::AmbiguousCommand {
            input: "de".to_string(),
            candidates: vec!["deploy".to_string(), "destroy".to_string()],
        };

        assert_eq!(error.to_string(), "Ambiguous command de matches [deploy, destroy]");
    }

    #[rstest]
    #[case(None, "Could not find command \"x\".")]
    #[case(Some("db".to_string()), "Could not find command \"x\" in \"db\" namespace.")]
    fn not_found_message(#[case] namespace: Option<String>, #[case] expected: &str) {
        let error = Error::CommandNotFound {
            name: "x".to_string(),
            namespace,
        };

        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case(vec![], "ERROR: \"prog greet\" was called with no arguments\nUsage: \"prog greet NAME\"")]
    #[case(vec!["a", "b"], "ERROR: \"prog greet\" was called with arguments [\"a\", \"b\"]\nUsage: \"prog greet NAME\"")]
    fn arity_message(#[case] args: Vec<&str>, #[case] expected: &str) {
        let error = Error::Arity {
            command: "prog greet".to_string(),
            args: args.into_iter().map(str::to_string).collect(),
            usage: "prog greet NAME".to_string(),
        };

        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn required_message() {
        let error = ParseError::RequiredMissing {
            kind: "options",
            names: vec!["--a".to_string(), "--b".to_string()],
        };

        assert_eq!(
            error.to_string(),
            "No value provided for required options '--a', '--b'"
        );
    }

    #[test]
    fn from_handler() {
        let framework: BoxError = Box::new(Error::CommandNotFound {
            name: "x".to_string(),
            namespace: None,
        });
        assert_matches!(Error::from_handler(framework), Error::CommandNotFound { .. });

        let parse: BoxError = Box::new(ParseError::MalformedValue("bad".to_string()));
        assert_matches!(Error::from_handler(parse), Error::Parse(ParseError::MalformedValue(_)));

        let runtime: BoxError = "boom".into();
        let error = Error::from_handler(runtime);
        assert!(!error.is_framework());
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn broken_pipe() {
        let error = Error::Runtime(Box::new(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        )));
        assert!(error.is_broken_pipe());
        assert!(!Error::Runtime("x".into()).is_broken_pipe());
    }
}
