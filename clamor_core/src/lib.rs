//! Engine for `clamor`: the command registry, the option/argument parsers, and the dispatcher.
//! See the `clamor` crate root for an overview.
#![deny(missing_docs)]
mod api;
mod constant;
mod context;
mod dispatch;
mod error;
mod execution;
mod help;
mod interface;
mod invocation;
mod model;
mod parser;
#[allow(missing_docs)]
pub mod prelude;
mod registry;

pub use api::*;
pub use context::{Config, Context};
pub use error::{BoxError, DeclarationError, Error, ParseError};
pub use execution::{Execution, Outcome};
#[cfg(any(test, feature = "unit_test"))]
pub use interface::CapturedShell;
pub use interface::{ConsoleShell, Shell};
pub use model::*;
pub use parser::ParsedArguments;
pub use registry::{
    ClassId, ClassView, ErrorHook, MissingHandler, Registry, SuccessHook, UnknownPolicy,
};

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
