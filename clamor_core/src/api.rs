mod argument;
mod class;
mod command;
mod option;

pub use argument::Argument;
pub use class::ClassBuilder;
pub use command::{Command, CommandBuilder, CommandKind, Handler};
pub use option::Opt;

pub(crate) use command::{Method, Visibility};
