/// Switches that map onto the built-in `help` command.
pub(crate) const HELP_MAPPINGS: [&str; 4] = ["-h", "-?", "--help", "-D"];

/// Ends option parsing; everything after it is passed through verbatim.
pub(crate) const OPTS_END: &str = "--";

pub(crate) const HELP_COMMAND: &str = "help";
pub(crate) const DEFAULT_COMMAND: &str = HELP_COMMAND;
pub(crate) const BASE_CLASS: &str = "Base";
pub(crate) const DEFAULT_NAMESPACE: &str = "default";

/// Names that may not be used for commands or arguments.
pub(crate) const RESERVED_WORDS: [&str; 5] = ["invoke", "shell", "options", "args", "run"];

/// Environment variable prefixes consulted by [`crate::Execution`].
pub(crate) const ENV_PREFIXES: [&str; 1] = ["CLAMOR"];

pub(crate) const TRUTHY_STRINGS: [&str; 6] = ["1", "true", "yes", "on", "t", "y"];
pub(crate) const TRUE_LITERALS: [&str; 4] = ["true", "TRUE", "t", "T"];
pub(crate) const FALSE_LITERALS: [&str; 4] = ["false", "FALSE", "f", "F"];
