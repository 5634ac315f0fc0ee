use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::api::Opt;
use crate::constant::{FALSE_LITERALS, TRUE_LITERALS};
use crate::error::ParseError;
use crate::model::{ArgType, Options, Value};
use crate::parser::pile::*;

/// Consumes a full token stream against a table of [`Opt`]s.
///
/// Recognized switches are assigned into the resulting [`Options`].
/// Everything else lands in [`OptionTable::remaining`], in order.
pub(crate) struct OptionTable<'a> {
    switches: HashMap<String, &'a Opt>,
    shorts: HashMap<String, String>,
    assigns: IndexMap<String, Value>,
    non_assigned_required: Vec<&'a Opt>,
    extra: Vec<String>,
    ended_at: Option<usize>,
    stop_on_unknown: bool,
    disable_required_check: bool,
}

impl<'a> OptionTable<'a> {
    /// Build a table over `options`.
    ///
    /// Declared defaults are assigned up front, then `defaults` on top of them.
    /// Either kind of default satisfies a required option.
    pub(crate) fn new(
        options: &'a IndexMap<String, Opt>,
        defaults: &Options,
        stop_on_unknown: bool,
        disable_required_check: bool,
    ) -> Self {
        let mut switches = HashMap::default();
        let mut shorts: HashMap<String, String> = HashMap::default();
        let mut assigns = IndexMap::default();
        let mut non_assigned_required = Vec::default();

        for option in options.values() {
            if let Some(default) = option.argument().get_default() {
                assigns.insert(option.human_name().to_string(), default.clone());
            } else if option.is_required() {
                non_assigned_required.push(option);
            }

            switches.insert(option.switch_name(), option);

            for alias in option.get_aliases() {
                shorts
                    .entry(alias.clone())
                    .or_insert_with(|| option.switch_name());
            }
        }

        for (key, value) in defaults.iter() {
            let indifferent = key.replace('-', "_");
            let key = options
                .values()
                .find(|o| o.human_name().replace('-', "_") == indifferent)
                .map_or(key, Opt::human_name);
            assigns.insert(key.to_string(), value.clone());
            non_assigned_required.retain(|o: &&Opt| o.human_name().replace('-', "_") != indifferent);
        }

        Self {
            switches,
            shorts,
            assigns,
            non_assigned_required,
            extra: Vec::default(),
            ended_at: None,
            stop_on_unknown,
            disable_required_check,
        }
    }

    /// The tokens not consumed as switches or their values, in input order.
    pub(crate) fn remaining(&self) -> &[String] {
        &self.extra
    }

    pub(crate) fn parse(&mut self, tokens: Vec<String>) -> Result<Options, ParseError> {
        let mut pile = Pile::options(tokens);

        while pile.peek().is_some() {
            if !pile.parsing_options() {
                self.ended_at.get_or_insert(self.extra.len());

                if let Some(token) = pile.shift() {
                    self.extra.push(token);
                }
                continue;
            }

            let (matched, is_switch) = self.current_is_switch(&mut pile);
            let Some(shifted) = pile.shift() else {
                break;
            };

            if is_switch {
                let raw_switch = if let Some(captures) = SHORT_SQ_RE.captures(&shifted) {
                    let expanded: Vec<String> =
                        captures[1].chars().map(|f| format!("-{f}")).collect();
                    trace!("Expanding '{shifted}' into {expanded:?}.");
                    pile.unshift_all(expanded);
                    continue;
                } else if let Some(captures) = EQ_RE
                    .captures(&shifted)
                    .or_else(|| SHORT_NUM_RE.captures(&shifted))
                {
                    pile.unshift(captures[2].to_string());
                    captures[1].to_string()
                } else {
                    shifted.clone()
                };

                let switch = self.normalize_switch(&raw_switch);
                let option = match self.switch_option(&switch) {
                    Some(option) => option,
                    None => {
                        self.extra.push(shifted);
                        continue;
                    }
                };
                let value = self.parse_peek(&mut pile, &switch, option)?;
                trace!("Assigned option '{}': {value:?}.", option.human_name());
                self.assigns.insert(option.human_name().to_string(), value);
            } else if self.stop_on_unknown {
                pile.stop_parsing_options();
                self.extra.push(shifted);

                while let Some(token) = pile.shift() {
                    self.extra.push(token);
                }

                break;
            } else if matched {
                self.extra.push(shifted);

                while pile.peek().map_or(false, |token| !token.starts_with('-')) {
                    if let Some(token) = pile.shift() {
                        self.extra.push(token);
                    }
                }
            } else {
                self.extra.push(shifted);
            }
        }

        if !self.disable_required_check && !self.non_assigned_required.is_empty() {
            return Err(ParseError::RequiredMissing {
                kind: "options",
                names: self
                    .non_assigned_required
                    .iter()
                    .map(|o| o.switch_name())
                    .collect(),
            });
        }

        debug!(
            "Parsed {} option(s), {} remaining token(s).",
            self.assigns.len(),
            self.extra.len()
        );
        Ok(Options::new(self.assigns.clone()))
    }

    /// Fail with every remaining token that looks like a switch.
    /// Tokens from `--` onwards are passed through, so they are never reported.
    pub(crate) fn check_unknown(&self) -> Result<(), ParseError> {
        let checked = &self.extra[..self.ended_at.unwrap_or(self.extra.len())];
        let unknown: Vec<String> = checked
            .iter()
            .filter(|token| is_unknown_switch(token))
            .cloned()
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ParseError::UnknownArgument { switches: unknown })
        }
    }

    /// Whether the next token is shaped like a switch, and whether it names a registered one.
    fn current_is_switch(&self, pile: &mut Pile) -> (bool, bool) {
        let Some(token) = pile.peek_owned() else {
            return (false, false);
        };

        for pattern in [&*LONG_RE, &*SHORT_RE, &*EQ_RE, &*SHORT_NUM_RE] {
            if let Some(captures) = pattern.captures(&token) {
                return (true, self.is_switch(&captures[1]));
            }
        }

        if let Some(captures) = SHORT_SQ_RE.captures(&token) {
            let all_known = captures[1]
                .chars()
                .all(|f| self.is_switch(&format!("-{f}")));
            return (true, all_known);
        }

        (false, false)
    }

    fn current_is_switch_formatted(pile: &mut Pile) -> bool {
        match pile.peek() {
            Some(token) => [
                &*LONG_RE,
                &*SHORT_RE,
                &*EQ_RE,
                &*SHORT_NUM_RE,
                &*SHORT_SQ_RE,
            ]
            .iter()
            .any(|pattern| pattern.is_match(token)),
            None => false,
        }
    }

    fn is_switch(&self, raw_switch: &str) -> bool {
        self.switch_option(&self.normalize_switch(raw_switch))
            .is_some()
    }

    fn normalize_switch(&self, raw_switch: &str) -> String {
        self.shorts
            .get(raw_switch)
            .map(String::as_str)
            .unwrap_or(raw_switch)
            .replace('_', "-")
    }

    fn switch_option(&self, switch: &str) -> Option<&'a Opt> {
        match no_or_skip(switch) {
            Some(stem) => self
                .switches
                .get(switch)
                .or_else(|| self.switches.get(&format!("--{stem}")))
                .copied(),
            None => self.switches.get(switch).copied(),
        }
    }

    fn parse_peek(
        &mut self,
        pile: &mut Pile,
        switch: &str,
        option: &'a Opt,
    ) -> Result<Value, ParseError> {
        self.non_assigned_required
            .retain(|o| o.human_name() != option.human_name());

        if Self::current_is_switch_formatted(pile) || pile.is_last() {
            if option.is_boolean() {
                // Falls through to the boolean parse.
            } else if no_or_skip(switch).is_some() {
                return Ok(Value::Null);
            } else if !option.is_required() {
                return Ok(option
                    .get_lazy_default()
                    .or(option.argument().get_default())
                    .cloned()
                    .unwrap_or_else(|| Value::String(option.human_name().to_string())));
            } else if let Some(lazy_default) = option.get_lazy_default() {
                return Ok(lazy_default.clone());
            } else {
                return Err(ParseError::MissingValue {
                    switch: switch.to_string(),
                });
            }
        }

        match option.get_type() {
            ArgType::Boolean => Ok(self.parse_boolean(pile, switch)),
            _ => pile.take_value(switch, option.argument()),
        }
    }

    fn parse_boolean(&self, pile: &mut Pile, switch: &str) -> Value {
        let negated = no_or_skip(switch).is_some();

        if pile.current_is_value() {
            let token = pile.peek_owned().unwrap_or_default();

            if TRUE_LITERALS.contains(&token.as_str()) {
                pile.shift();
                Value::Bool(true)
            } else if FALSE_LITERALS.contains(&token.as_str()) {
                pile.shift();
                Value::Bool(false)
            } else {
                Value::Bool(!negated)
            }
        } else {
            Value::Bool(self.switches.contains_key(switch) || !negated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};
    use rstest::rstest;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| t.to_string()).collect()
    }

    fn table(options: Vec<Opt>) -> IndexMap<String, Opt> {
        options
            .into_iter()
            .map(|o| (o.human_name().to_string(), o))
            .collect()
    }

    fn parse(
        options: &IndexMap<String, Opt>,
        input: &[&str],
    ) -> Result<(Options, Vec<String>), ParseError> {
        let mut table = OptionTable::new(options, &Options::default(), false, false);
        let parsed = table.parse(tokens(input))?;
        Ok((parsed, table.remaining().to_vec()))
    }

    #[test]
    fn empty_tokens() {
        let options = table(vec![Opt::new("name")]);
        let mut table = OptionTable::new(&options, &Options::default(), false, false);
        let tokens: &[String] = &[];
        let parsed = table.parse(tokens.to_vec()).unwrap();
        assert!(parsed.is_empty());
        assert!(table.remaining().is_empty());
    }

    #[rstest]
    #[case(vec!["--name", "alice"])]
    #[case(vec!["--name=alice"])]
    #[case(vec!["-n", "alice"])]
    #[case(vec!["-n=alice"])]
    fn string_value(#[case] input: Vec<&str>) {
        let options = table(vec![Opt::new("name").aliases(["n"])]);
        let (parsed, remaining) = parse(&options, &input).unwrap();
        assert_eq!(parsed.str("name"), Some("alice"));
        assert!(remaining.is_empty());
    }

    #[rstest]
    #[case(vec!["--verbose"], Some(true))]
    #[case(vec!["--no-verbose"], Some(false))]
    #[case(vec!["--skip-verbose"], Some(false))]
    #[case(vec!["--verbose", "false"], Some(false))]
    #[case(vec!["--verbose", "T"], Some(true))]
    #[case(vec!["--no-verbose", "true"], Some(true))]
    #[case(vec!["--verbose=f"], Some(false))]
    #[case(vec![], None)]
    fn boolean(#[case] input: Vec<&str>, #[case] expected: Option<bool>) {
        let options = table(vec![Opt::new("verbose").arg_type(ArgType::Boolean)]);
        let (parsed, remaining) = parse(&options, &input).unwrap();
        assert_eq!(parsed.get("verbose").and_then(Value::as_bool), expected);
        assert!(remaining.is_empty());
    }

    #[test]
    fn boolean_leaves_value() {
        let options = table(vec![Opt::new("verbose").arg_type(ArgType::Boolean)]);
        let (parsed, remaining) = parse(&options, &["--verbose", "alice"]).unwrap();
        assert!(parsed.flag("verbose"));
        assert_eq!(remaining, tokens(&["alice"]));
    }

    #[rstest]
    #[case(vec!["-ab"])]
    #[case(vec!["-a", "-b"])]
    #[case(vec!["-ba"])]
    fn bundled(#[case] input: Vec<&str>) {
        let options = table(vec![
            Opt::new("a").arg_type(ArgType::Boolean),
            Opt::new("b").arg_type(ArgType::Boolean),
        ]);
        let (parsed, remaining) = parse(&options, &input).unwrap();
        assert!(parsed.flag("a"));
        assert!(parsed.flag("b"));
        assert!(remaining.is_empty());
    }

    #[test]
    fn bundled_partially_unknown() {
        let options = table(vec![Opt::new("a").arg_type(ArgType::Boolean)]);
        let (parsed, remaining) = parse(&options, &["-az", "x"]).unwrap();
        assert!(!parsed.contains_key("a"));
        assert_eq!(remaining, tokens(&["-az", "x"]));
    }

    #[test]
    fn short_numeric() {
        let options = table(vec![Opt::new("n").arg_type(ArgType::Numeric)]);
        let (parsed, _) = parse(&options, &["-n5"]).unwrap();
        assert_eq!(parsed.int("n"), Some(5));
        let (parsed, _) = parse(&options, &["-n-1.5"]).unwrap();
        assert_eq!(parsed.float("n"), Some(-1.5));
    }

    #[test]
    fn underscores_normalized() {
        let options = table(vec![Opt::new("dry_run").arg_type(ArgType::Boolean)]);
        let (parsed, _) = parse(&options, &["--dry_run"]).unwrap();
        assert!(parsed.flag("dry_run"));
        assert!(parsed.flag("dry-run"));
    }

    #[test]
    fn end_of_options() {
        let options = table(vec![
            Opt::new("a").arg_type(ArgType::Boolean),
            Opt::new("name"),
        ]);
        let (parsed, remaining) = parse(&options, &["-a", "--", "--name", "x", "--"]).unwrap();
        assert!(parsed.flag("a"));
        assert!(!parsed.contains_key("name"));
        assert_eq!(remaining, tokens(&["--", "--name", "x", "--"]));
    }

    #[test]
    fn value_before_end() {
        let options = table(vec![Opt::new("name")]);
        let (parsed, remaining) = parse(&options, &["--name", "--", "x"]).unwrap();
        assert_eq!(parsed.str("name"), Some("name"));
        assert_eq!(remaining, tokens(&["--", "x"]));
    }

    #[rstest]
    #[case(Opt::new("name"), Value::from("name"))]
    #[case(Opt::new("name").default("d"), Value::from("d"))]
    #[case(Opt::new("name").default("d").lazy_default("l"), Value::from("l"))]
    #[case(Opt::new("name").required(true).lazy_default("l"), Value::from("l"))]
    #[case(Opt::new("count").arg_type(ArgType::Numeric), Value::from("count"))]
    fn value_missing_fallback(#[case] option: Opt, #[case] expected: Value) {
        let human_name = option.human_name().to_string();
        let options = table(vec![option]);
        let switch = format!("--{human_name}");
        let (parsed, _) = parse(&options, &[switch.as_str()]).unwrap();
        assert_eq!(parsed.get(&human_name), Some(&expected));
    }

    #[test]
    fn value_missing_required() {
        let options = table(vec![Opt::new("name").required(true)]);
        assert_eq!(
            parse(&options, &["--name"]).unwrap_err(),
            ParseError::MissingValue {
                switch: "--name".to_string()
            }
        );
        assert_eq!(
            parse(&options, &["--name"]).unwrap_err().to_string(),
            "No value provided for option '--name'"
        );
    }

    #[test]
    fn no_value_assigns_null() {
        let options = table(vec![Opt::new("name").default("x")]);
        let (parsed, _) = parse(&options, &["--no-name"]).unwrap();
        assert_eq!(parsed.get("name"), Some(&Value::Null));
    }

    #[test]
    fn required_missing() {
        let options = table(vec![
            Opt::new("b").required(true),
            Opt::new("a").required(true),
            Opt::new("c"),
        ]);
        assert_eq!(
            parse(&options, &[]).unwrap_err().to_string(),
            "No value provided for required options '--b', '--a'"
        );
    }

    #[test]
    fn required_satisfied_by_defaults() {
        let options = table(vec![Opt::new("dry_run").required(true)]);
        let defaults: Options = vec![("dry-run", Value::from("yes"))].into_iter().collect();
        let mut table = OptionTable::new(&options, &defaults, false, false);
        let parsed = table.parse(Vec::default()).unwrap();
        assert_eq!(parsed.str("dry_run"), Some("yes"));
    }

    #[test]
    fn defaults_take_option_name() {
        // Setup
        let options = table(vec![Opt::new("dry_run")]);
        let defaults: Options = vec![("dry-run", Value::from("pre")), ("extra", Value::from(1))]
            .into_iter()
            .collect();
        let mut table = OptionTable::new(&options, &defaults, false, false);

        // Execute
        let parsed = table.parse(Vec::default()).unwrap();

        // Verify
        assert_eq!(parsed.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["dry_run", "extra"]);
        assert_eq!(parsed.str("dry_run"), Some("pre"));
    }

    #[test]
    fn required_check_disabled() {
        let options = table(vec![Opt::new("name").required(true)]);
        let mut table = OptionTable::new(&options, &Options::default(), false, true);
        assert_matches!(table.parse(Vec::default()), Ok(_));
    }

    #[test]
    fn unknown_switch_with_values() {
        // Setup
        let options = table(vec![Opt::new("name")]);
        let mut table = OptionTable::new(&options, &Options::default(), false, false);

        // Execute
        let parsed = table
            .parse(tokens(&["a", "--zzz", "b", "c", "--name", "x", "d", "-q"]))
            .unwrap();

        // Verify
        assert_eq!(parsed.str("name"), Some("x"));
        assert_eq!(table.remaining(), tokens(&["a", "--zzz", "b", "c", "d", "-q"]));
        assert_eq!(
            table.check_unknown().unwrap_err().to_string(),
            "Unknown switches '--zzz, -q'"
        );
    }

    #[test]
    fn stop_on_unknown() {
        let options = table(vec![Opt::new("a").arg_type(ArgType::Boolean)]);
        let mut table = OptionTable::new(&options, &Options::default(), true, false);
        let parsed = table.parse(tokens(&["-a", "cmd", "-a", "--x"])).unwrap();
        assert!(parsed.flag("a"));
        assert_eq!(table.remaining(), tokens(&["cmd", "-a", "--x"]));
    }

    #[rstest]
    #[case(vec!["-a", "x", "--", "--y", "-z"], None)]
    #[case(vec!["--y--z", "x"], None)]
    #[case(vec!["-q", "--", "--y"], Some(vec!["-q"]))]
    #[case(vec!["x", "---q", "--"], Some(vec!["---q"]))]
    fn check_unknown(#[case] input: Vec<&str>, #[case] expected: Option<Vec<&str>>) {
        let options = table(vec![Opt::new("a").arg_type(ArgType::Boolean)]);
        let mut table = OptionTable::new(&options, &Options::default(), false, false);
        table.parse(tokens(&input)).unwrap();

        match expected {
            None => assert_matches!(table.check_unknown(), Ok(())),
            Some(switches) => assert_eq!(
                table.check_unknown().unwrap_err(),
                ParseError::UnknownArgument {
                    switches: tokens(&switches)
                }
            ),
        }
    }

    #[test]
    fn hash_and_array() {
        let options = table(vec![
            Opt::new("env").arg_type(ArgType::Hash),
            Opt::new("items").arg_type(ArgType::Array),
        ]);
        let (parsed, remaining) =
            parse(&options, &["--env", "a:1", "b:2", "--items", "x", "y"]).unwrap();
        assert_eq!(parsed.hash("env").map(|h| h.len()), Some(2));
        assert_eq!(
            parsed.array("items"),
            Some(tokens(&["x", "y"]).as_slice())
        );
        assert!(remaining.is_empty());
    }

    #[test]
    fn equivalent_forms() {
        let options = table(vec![
            Opt::new("name"),
            Opt::new("count").arg_type(ArgType::Numeric),
        ]);

        for _ in 0..50 {
            let value: u16 = thread_rng().gen();
            let value = value.to_string();
            let (a, ra) = parse(&options, &["--count", value.as_str(), "x"]).unwrap();
            let joined = format!("--count={value}");
            let (b, rb) = parse(&options, &[joined.as_str(), "x"]).unwrap();
            assert_eq!(a, b);
            assert_eq!(ra, rb);
        }
    }

    #[test]
    fn conserves_tokens() {
        let options = table(vec![
            Opt::new("a").arg_type(ArgType::Boolean),
            Opt::new("name"),
        ]);
        let vocabulary = ["x", "y", "--zzz", "-q", "--", "z"];

        for _ in 0..100 {
            let count: usize = thread_rng().gen_range(0..8);
            let input: Vec<&str> = (0..count)
                .map(|_| vocabulary[thread_rng().gen_range(0..vocabulary.len())])
                .collect();
            let (parsed, remaining) = parse(&options, &input).unwrap();
            assert!(parsed.is_empty());
            assert_eq!(remaining, tokens(&input));
        }
    }
}
