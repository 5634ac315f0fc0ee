use indexmap::IndexMap;
use tracing::trace;

use crate::api::Argument;
use crate::error::ParseError;
use crate::model::Value;
use crate::parser::pile::Pile;

/// The result of consuming positional tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArguments {
    /// Values keyed by the arguments' human names.
    pub values: IndexMap<String, Value>,
    /// Tokens left over after every argument has been considered.
    pub remaining: Vec<String>,
}

/// Consumes ordered positional tokens against ordered [`Argument`]s.
pub(crate) struct ArgumentParser<'a> {
    arguments: &'a [Argument],
}

impl<'a> ArgumentParser<'a> {
    pub(crate) fn new(arguments: &'a [Argument]) -> Self {
        Self { arguments }
    }

    pub(crate) fn parse(&self, tokens: Vec<String>) -> Result<ParsedArguments, ParseError> {
        let mut values: IndexMap<String, Value> = IndexMap::default();
        let mut non_assigned_required: Vec<&Argument> = Vec::default();

        for argument in self.arguments {
            if let Some(default) = argument.get_default() {
                values.insert(argument.human_name().to_string(), default.clone());
            } else if argument.is_required() {
                non_assigned_required.push(argument);
            }
        }

        let mut pile = Pile::positional(tokens);

        for argument in self.arguments {
            if pile.is_last() {
                break;
            }

            non_assigned_required.retain(|a| a.human_name() != argument.human_name());
            let value = pile.take_value(argument.human_name(), argument)?;
            trace!("Assigned argument '{}': {value:?}.", argument.human_name());
            values.insert(argument.human_name().to_string(), value);
        }

        if !non_assigned_required.is_empty() {
            return Err(ParseError::RequiredMissing {
                kind: "arguments",
                names: non_assigned_required
                    .iter()
                    .map(|a| a.human_name().to_string())
                    .collect(),
            });
        }

        Ok(ParsedArguments {
            values,
            remaining: pile.into_remaining(),
        })
    }
}
