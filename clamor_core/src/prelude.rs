//! The types needed to declare and run commands: `use clamor::prelude::*`.

pub use crate::api::{Argument, Command, Opt};
pub use crate::context::{Config, Context};
pub use crate::error::{BoxError, Error};
pub use crate::execution::{Execution, Outcome};
pub use crate::model::{ArgType, Arity, Value};
pub use crate::registry::{ClassId, Registry, UnknownPolicy};
