//! `clamor` is a command line framework for Rust, built around *commands* grouped into *classes*.
//!
//! Where most parsers map a Cli onto a single data structure, `clamor` dispatches tokens to named handlers.
//! The design concerns are as follows:
//! * *Command/option paradigm*:
//! A class declares commands, each with positional arguments, options, and a handler.
//! Options may also be declared per class, applying to every command of the class.
//! * *Forgiving command names*:
//! A command may be given by any unambiguous prefix of its name, or by an alias (ex: `hi` for `greet`).
//! * *Subcommand delegation*:
//! A command may hand its tokens to another class, which then dispatches them on its own.
//! Options parsed before the handoff are visible to the delegated command.
//! * *Permissive by default*:
//! Unknown switches are passed through to the handler, unless unknown option checking is enabled for the command.
//! * *Plain help*:
//! Every class gets a `help` command (also `-h`, `--help`), rendered as a column table through a [`Shell`].
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/greet.rs")]
//! ```
//!
//! Which generates the following Cli program:
//! ```console
//! $ greet hi Alice --loud
//! HELLO, ALICE!
//!
//! $ greet greet
//! No value provided for required arguments 'name'
//!
//! $ greet remote add origin git://example
//! origin	git://example
//! ```
//!
//! # Tokens
//! Tokens are split into positional tokens and switches.
//! Switches come in the following forms:
//! * `--name value` or `--name=value`.
//! * `-n value`, `-n=value`, or `-n3` for numbers.
//! * `-abc`, which bundles the boolean switches `-a`, `-b`, and `-c`.
//! * `--no-name` or `--skip-name`, which negates a boolean option.
//!
//! A bare `--` ends option parsing: every following token is positional.
//!
//! # Errors
//! Framework errors (unknown or ambiguous commands, parse errors, arity mismatches) are distinguished from errors raised by handlers via [`Error::is_framework`].
//! [`Registry::start`] and [`Execution`] turn them into shell output and exit codes.
pub use clamor_core::*;
