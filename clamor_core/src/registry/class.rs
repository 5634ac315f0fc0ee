use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::api::{Argument, Command, Method, Opt};
use crate::context::Context;
use crate::error::{BoxError, Error};
use crate::model::Value;
use crate::registry::ClassId;

/// The catch-all handler, run for a command that has no handler of its own.
/// Receives the command name and the trailing tokens.
pub type MissingHandler =
    Arc<dyn Fn(&mut Context<'_>, &str, Vec<String>) -> Result<Value, BoxError> + Send + Sync>;

/// Transforms the value returned by a successful handler.
pub type SuccessHook =
    Arc<dyn Fn(&mut Context<'_>, Value, &[String]) -> Result<Value, BoxError> + Send + Sync>;

/// Maps a failed invocation's error onto the error that is raised.
/// Returning `None` is a contract violation: it is logged and the original error is raised.
pub type ErrorHook =
    Arc<dyn Fn(&mut Context<'_>, &Error, &[String]) -> Option<Error> + Send + Sync>;

/// Which commands unknown switches are reported for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownPolicy {
    pub(crate) only: Vec<String>,
    pub(crate) except: Vec<String>,
}

impl UnknownPolicy {
    /// Report unknown switches for every command.
    pub fn all() -> Self {
        Self::default()
    }

    /// Report unknown switches only for the named commands.
    pub fn only<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            only: names.into_iter().map(|n| n.into().replace('-', "_")).collect(),
            except: Vec::default(),
        }
    }

    /// Report unknown switches for every command except the named ones.
    pub fn except<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            only: Vec::default(),
            except: names.into_iter().map(|n| n.into().replace('-', "_")).collect(),
        }
    }

    pub(crate) fn applies_to(&self, name: &str) -> bool {
        if !self.except.is_empty() {
            !self.except.iter().any(|n| n == name)
        } else if !self.only.is_empty() {
            self.only.iter().any(|n| n == name)
        } else {
            true
        }
    }
}

/// A class as declared: only what was set on it, nothing inherited.
#[derive(Default)]
pub(crate) struct ClassDef {
    pub(crate) name: String,
    pub(crate) parent: Option<ClassId>,
    pub(crate) namespace: Option<String>,
    pub(crate) package_name: Option<String>,
    pub(crate) commands: IndexMap<String, Command>,
    pub(crate) removed_commands: HashSet<String>,
    pub(crate) map: IndexMap<String, String>,
    pub(crate) class_options: IndexMap<String, Opt>,
    pub(crate) removed_class_options: HashSet<String>,
    pub(crate) class_arguments: Vec<Argument>,
    pub(crate) removed_class_arguments: HashSet<String>,
    pub(crate) shared_options: IndexMap<String, Opt>,
    pub(crate) methods: HashMap<String, Method>,
    pub(crate) method_missing: Option<MissingHandler>,
    pub(crate) check_unknown: Option<UnknownPolicy>,
    pub(crate) stop_on_unknown: HashSet<String>,
    pub(crate) disable_required_check: HashSet<String>,
    pub(crate) subcommands: IndexMap<String, ClassId>,
    pub(crate) subcommand_help: bool,
    pub(crate) strict_args_position: Option<bool>,
    pub(crate) check_default_type: Option<bool>,
    pub(crate) exit_on_failure: Option<bool>,
    pub(crate) default_command: Option<String>,
    pub(crate) on_run_success: Option<SuccessHook>,
    pub(crate) on_run_error: Option<ErrorHook>,
}

impl ClassDef {
    pub(crate) fn new(name: impl Into<String>, parent: Option<ClassId>) -> Self {
        Self {
            name: name.into(),
            parent,
            ..Self::default()
        }
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UnknownPolicy::all(), "deploy", true)]
    #[case(UnknownPolicy::only(["deploy"]), "deploy", true)]
    #[case(UnknownPolicy::only(["deploy"]), "destroy", false)]
    #[case(UnknownPolicy::except(["dry-run"]), "dry_run", false)]
    #[case(UnknownPolicy::except(["dry-run"]), "deploy", true)]
    fn policy_applies_to(#[case] policy: UnknownPolicy, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(policy.applies_to(name), expected);
    }
}
