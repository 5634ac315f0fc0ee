use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::trace;

use crate::api::{Argument, Command, Method, Opt};
use crate::constant::DEFAULT_COMMAND;
use crate::error::Error;
use crate::registry::class::{ErrorHook, MissingHandler, SuccessHook, UnknownPolicy};
use crate::registry::ClassId;

/// A class with its ancestry merged in, root first, so that the class's own declarations win.
pub struct ClassView {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) namespace: String,
    pub(crate) package_name: Option<String>,
    pub(crate) commands: IndexMap<String, Command>,
    pub(crate) map: IndexMap<String, String>,
    pub(crate) class_options: IndexMap<String, Opt>,
    pub(crate) class_arguments: Vec<Argument>,
    pub(crate) shared_options: IndexMap<String, Opt>,
    pub(crate) methods: HashMap<String, Method>,
    pub(crate) method_missing: Option<MissingHandler>,
    pub(crate) check_unknown: Option<UnknownPolicy>,
    pub(crate) stop_on_unknown: HashSet<String>,
    pub(crate) disable_required_check: HashSet<String>,
    pub(crate) subcommands: IndexMap<String, ClassId>,
    pub(crate) subcommand_help: bool,
    pub(crate) strict_args_position: bool,
    pub(crate) check_default_type: bool,
    pub(crate) exit_on_failure: bool,
    pub(crate) default_command: Option<String>,
    pub(crate) on_run_success: Option<SuccessHook>,
    pub(crate) on_run_error: Option<ErrorHook>,
}

impl std::fmt::Debug for ClassView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassView")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("map", &self.map)
            .finish_non_exhaustive()
    }
}

impl ClassView {
    #[allow(missing_docs)]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace, ex: `app:remote`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every command reachable on this class, inherited ones included.
    pub fn all_commands(&self) -> &IndexMap<String, Command> {
        &self.commands
    }

    /// Command aliases: alias to command name.
    pub fn map(&self) -> &IndexMap<String, String> {
        &self.map
    }

    #[allow(missing_docs)]
    pub fn class_options(&self) -> &IndexMap<String, Opt> {
        &self.class_options
    }

    #[allow(missing_docs)]
    pub fn class_arguments(&self) -> &[Argument] {
        &self.class_arguments
    }

    #[allow(missing_docs)]
    pub fn shared_options(&self) -> &IndexMap<String, Opt> {
        &self.shared_options
    }

    /// The classes delegated to, keyed by their subcommand's command name.
    pub fn subcommand_classes(&self) -> &IndexMap<String, ClassId> {
        &self.subcommands
    }

    /// Whether `name` is the command name of a subcommand.
    pub fn is_subcommand(&self, name: &str) -> bool {
        self.subcommands.contains_key(name)
    }

    /// The title used when listing commands.
    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    #[allow(missing_docs)]
    pub fn strict_args_position(&self) -> bool {
        self.strict_args_position
    }

    #[allow(missing_docs)]
    pub fn check_default_type(&self) -> bool {
        self.check_default_type
    }

    #[allow(missing_docs)]
    pub fn exit_on_failure(&self) -> bool {
        self.exit_on_failure
    }

    pub(crate) fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// The command run when no command name is given.
    pub fn default_command(&self) -> &str {
        self.default_command.as_deref().unwrap_or(DEFAULT_COMMAND)
    }

    /// Resolve a possibly abbreviated, possibly aliased, command name into a command name.
    ///
    /// Without input, this is the default command.
    /// An exact match (command or alias) wins over a longer one sharing the prefix.
    /// Several prefix matches are ambiguous, unless they are all aliases of the same command.
    /// Input matching nothing is returned as is, for the caller to report.
    pub fn normalize_command_name(&self, input: Option<&str>) -> Result<String, Error> {
        let input = match input {
            Some(input) => input,
            None => return Ok(self.default_command().replace('-', "_")),
        };

        let possibilities = self.find_command_possibilities(input);

        if possibilities.len() > 1 {
            return Err(Error::AmbiguousCommand {
                input: input.to_string(),
                candidates: possibilities,
            });
        }

        let resolved = match possibilities.first() {
            None => input.to_string(),
            Some(_) if self.map.contains_key(input) => self.map[input].clone(),
            Some(only) => only.clone(),
        };

        trace!("Normalized command '{input}' to '{resolved}'.");
        Ok(resolved.replace('-', "_"))
    }

    fn find_command_possibilities(&self, input: &str) -> Vec<String> {
        let mut possibilities: Vec<String> = self
            .commands
            .keys()
            .chain(self.map.keys())
            .filter(|key| key.starts_with(input))
            .cloned()
            .collect();
        possibilities.sort();
        possibilities.dedup();

        if possibilities.iter().any(|p| p == input) {
            return vec![input.to_string()];
        }

        let mut unique: Vec<String> = Vec::default();

        for possibility in &possibilities {
            let target = self.map.get(possibility).unwrap_or(possibility);

            if !unique.contains(target) {
                unique.push(target.clone());
            }
        }

        if unique.len() == 1 {
            unique
        } else {
            possibilities
        }
    }

    /// Take the command name off the front of `args`: an alias, or any token that is not a switch.
    pub fn retrieve_command_name(&self, args: &mut Vec<String>) -> Option<String> {
        match args.first() {
            Some(first) if self.map.contains_key(first) || !first.starts_with('-') => {
                Some(args.remove(0))
            }
            _ => None,
        }
    }

    /// Whether option parsing stops at the first unknown token for `command`.
    pub fn stop_on_unknown_option(&self, command: &Command) -> bool {
        self.stop_on_unknown.contains(command.name())
    }

    /// Whether required options are not enforced for `command`.
    pub fn disable_required_check(&self, command: &Command) -> bool {
        self.disable_required_check.contains(command.name())
    }

    /// Whether unknown switches are reported for `command`.
    /// Never for subcommands, which hand their unknown switches down to the subcommand class.
    pub fn check_unknown_options(&self, command: Option<&Command>) -> bool {
        let policy = match &self.check_unknown {
            Some(policy) => policy,
            None => return false,
        };

        match command {
            None => true,
            Some(command) if self.is_subcommand(command.name()) => false,
            Some(command) => policy.applies_to(command.name()),
        }
    }

    /// The shared options included by `names`, or by membership in one of `groups`.
    pub fn find_shared_options(&self, names: &[String], groups: &[String]) -> IndexMap<String, Opt> {
        let mut found = IndexMap::default();

        for (key, option) in &self.shared_options {
            let matched_groups: Vec<String> = option
                .get_groups()
                .iter()
                .filter(|g| groups.contains(g))
                .cloned()
                .collect();

            if names.iter().any(|n| n == key || n == option.name()) || !matched_groups.is_empty() {
                found.insert(key.clone(), option.included(&matched_groups));
            }
        }

        found
    }

    /// The usage line as shown to the user, ex: `prog greet NAME`.
    pub fn banner(&self, program: &str, command: &Command, show_namespace: bool, is_subcommand: bool) -> String {
        format!(
            "{program} {}",
            command.formatted_usage(self, show_namespace, is_subcommand)
        )
    }
}
