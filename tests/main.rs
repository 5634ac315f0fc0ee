use std::rc::Rc;

use clamor::prelude::*;
use clamor::{CapturedShell, ParseError};
use rand::{thread_rng, Rng};
use rstest::rstest;

fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn greet(ctx: &mut Context<'_>, args: Vec<String>) -> Result<Value, BoxError> {
    let name = ctx.argument("name").map(Value::to_string).unwrap_or_default();
    let punctuation = if ctx.options().flag("loud") { "!" } else { "." };
    Ok(Value::from(format!("Hello, {name}{punctuation} {args:?}")))
}

fn describe(ctx: &mut Context<'_>, args: Vec<String>) -> Result<Value, BoxError> {
    let mut out: Vec<String> = ctx.options().iter().map(|(k, v)| format!("{k}={v}")).collect();
    out.push(format!("{args:?}"));
    Ok(Value::from(out.join(" ")))
}

fn greeter(registry: &mut Registry, name: &str, unknown: Option<UnknownPolicy>) -> ClassId {
    let mut class = registry.class(name).command(
        Command::build("greet")
            .desc("greet NAME", "Say hello to NAME")
            .argument(Argument::new("name"))
            .option(Opt::new("loud").default(false).description("Shout the greeting"))
            .handler(Arity::any(), greet),
    );

    if let Some(policy) = unknown {
        class = class.check_unknown_options(policy);
    }

    class.build().unwrap()
}

fn run(registry: &Registry, class: ClassId, argv: &[&str]) -> Result<Value, Error> {
    registry.dispatch(class, None, tokens(argv), None, Config::new("prog"))
}

#[test]
fn greet_with_option() {
    let mut registry = Registry::new();
    let class = greeter(&mut registry, "Greeter", None);

    assert_eq!(
        run(&registry, class, &["greet", "Alice", "--loud"]).unwrap(),
        Value::from("Hello, Alice! []")
    );
    assert_eq!(
        run(&registry, class, &["greet", "Alice"]).unwrap(),
        Value::from("Hello, Alice. []")
    );
}

#[test]
fn greet_without_name() {
    let mut registry = Registry::new();
    let class = greeter(&mut registry, "Greeter", None);
    let error = run(&registry, class, &["greet", "--loud"]).unwrap_err();

    assert_eq!(error.to_string(), "No value provided for required arguments 'name'");
    assert!(error.is_framework());
}

#[test]
fn greet_unknown_switch() {
    let mut registry = Registry::new();
    let checked = greeter(&mut registry, "Checked", Some(UnknownPolicy::all()));
    let unchecked = greeter(&mut registry, "Unchecked", None);

    match run(&registry, checked, &["greet", "Alice", "--unknown"]) {
        Err(Error::Parse(ParseError::UnknownArgument { switches })) => {
            assert_eq!(switches, vec!["--unknown"]);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        run(&registry, unchecked, &["greet", "Alice", "--unknown"]).unwrap(),
        Value::from("Hello, Alice. [\"--unknown\"]")
    );
}

#[rstest]
#[case("de", Err("Ambiguous command de matches [deploy, destroy]"))]
#[case("dep", Ok("deploy"))]
#[case("dest", Ok("destroy"))]
#[case("destroy", Ok("destroy"))]
#[case("build", Ok("build"))]
#[case("builder", Ok("builder"))]
#[case("bu", Err("Ambiguous command bu matches [build, builder]"))]
#[case("b", Ok("build"))]
fn resolution(#[case] input: &str, #[case] expected: Result<&str, &str>) {
    // Setup
    let mut registry = Registry::new();
    let mut class = registry.class("Ops");

    for name in ["deploy", "destroy", "build", "builder"] {
        class = class.command(
            Command::build(name).handler(Arity::any(), move |_, _| Ok(Value::from(name))),
        );
    }

    let class = class.map("b", "build").build().unwrap();

    // Execute
    let result = run(&registry, class, &[input]);

    // Verify
    match expected {
        Ok(name) => assert_eq!(result.unwrap(), Value::from(name)),
        Err(message) => assert_eq!(result.unwrap_err().to_string(), message),
    }
}

#[rstest]
#[case(vec!["--no-verbose"], "verbose=false []")]
#[case(vec!["--verbose"], "verbose=true []")]
#[case(vec![], "verbose=true []")]
#[case(vec!["--verbose=false"], "verbose=false []")]
#[case(vec!["--", "--no-verbose"], "verbose=true [\"--no-verbose\"]")]
#[case(vec!["x", "--no-verbose", "y"], "verbose=false [\"x\", \"y\"]")]
fn boolean_negation(#[case] argv: Vec<&str>, #[case] expected: &str) {
    let mut registry = Registry::new();
    let class = registry
        .class("App")
        .command(
            Command::build("show")
                .option(Opt::new("verbose").default(true))
                .handler(Arity::any(), describe),
        )
        .build()
        .unwrap();

    assert_eq!(
        registry
            .dispatch(class, Some("show"), tokens(&argv), None, Config::new("prog"))
            .unwrap(),
        Value::from(expected)
    );
}

#[rstest]
#[case(vec!["-ab"])]
#[case(vec!["-a", "-b"])]
#[case(vec!["-ba"])]
fn bundled_switches(#[case] argv: Vec<&str>) {
    let mut registry = Registry::new();
    let class = registry
        .class("App")
        .command(
            Command::build("show")
                .option(Opt::new("a").arg_type(ArgType::Boolean))
                .option(Opt::new("b").arg_type(ArgType::Boolean))
                .handler(Arity::any(), describe),
        )
        .build()
        .unwrap();

    let result = registry
        .dispatch(class, Some("show"), tokens(&argv), None, Config::new("prog"))
        .unwrap();
    let mut parts: Vec<String> = result.to_string().split(' ').map(str::to_string).collect();
    parts.sort();

    assert_eq!(parts, vec!["[]", "a=true", "b=true"]);
}

#[rstest]
#[case(vec!["--name", "value"])]
#[case(vec!["--name=value"])]
#[case(vec!["-n", "value"])]
#[case(vec!["-n=value"])]
fn switch_value_forms(#[case] argv: Vec<&str>) {
    let mut registry = Registry::new();
    let class = registry
        .class("App")
        .command(
            Command::build("show")
                .option(Opt::new("name").aliases(["n"]))
                .handler(Arity::any(), describe),
        )
        .build()
        .unwrap();

    assert_eq!(
        registry
            .dispatch(class, Some("show"), tokens(&argv), None, Config::new("prog"))
            .unwrap(),
        Value::from("name=value []")
    );
}

#[test]
fn token_conservation() {
    let mut registry = Registry::new();
    let class = registry
        .class("App")
        .command(
            Command::build("collect")
                .argument(Argument::new("first").required(false))
                .argument(Argument::new("second").required(false))
                .option(Opt::new("label"))
                .handler(Arity::any(), |ctx, args| {
                    let label = ctx.options().str("label").map_or(0, |_| 2);
                    Ok(Value::from((ctx.arguments().len() + args.len() + label) as i64))
                }),
        )
        .build()
        .unwrap();

    for _ in 0..200 {
        let mut argv: Vec<String> = (0..thread_rng().gen_range(0..6))
            .map(|i| format!("p{i}"))
            .collect();

        if thread_rng().gen::<bool>() {
            let at = thread_rng().gen_range(0..=argv.len());
            argv.insert(at, "--label".to_string());
            argv.insert(at + 1, "text".to_string());
        }

        let expected = argv.len() as i64;
        let result = registry
            .dispatch(class, Some("collect"), argv.clone(), None, Config::new("prog"))
            .unwrap();
        assert_eq!(result, Value::Integer(expected), "{argv:?}");
    }
}

#[test]
fn subcommand_help() {
    // Setup
    let mut registry = Registry::new();
    let remote = registry
        .class("Remote")
        .command(
            Command::build("add")
                .desc("add NAME URL", "Add a remote")
                .argument(Argument::new("name"))
                .argument(Argument::new("url"))
                .handler(Arity::any(), describe),
        )
        .build()
        .unwrap();
    let git = registry
        .class("Git")
        .package_name("Git")
        .subcommand("remote", remote, Some("Manage remotes"))
        .build()
        .unwrap();
    let shell = Rc::new(CapturedShell::default());

    // Execute
    registry
        .dispatch(
            git,
            None,
            tokens(&["remote", "-h"]),
            None,
            Config::new("git").shell(shell.clone()),
        )
        .unwrap();

    // Verify
    let output = shell.output();
    assert!(output.starts_with("Commands:\n"), "{output}");
    assert!(output.contains("git remote add NAME URL"), "{output}");
    assert!(!output.contains("Git commands:"), "{output}");
}

#[test]
fn start_exit_codes() {
    let mut registry = Registry::new();
    let class = registry
        .class("App")
        .exit_on_failure(true)
        .command(Command::build("ok").handler(Arity::any(), describe))
        .build()
        .unwrap();
    let shell = Rc::new(CapturedShell::default());
    let config = Config::new("prog").shell(shell.clone());

    assert_eq!(registry.start(class, tokens(&["ok"]), config.clone()).unwrap(), 0);
    assert_eq!(registry.start(class, tokens(&["nope"]), config).unwrap(), 1);
    assert_eq!(
        shell.consume(),
        (None, Some("Could not find command \"nope\".".to_string()))
    );
}
