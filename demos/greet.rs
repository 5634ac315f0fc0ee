use clamor::prelude::*;

fn main() {
    let mut registry = Registry::new();
    let remote = registry
        .class("Remote")
        .command(
            Command::build("add")
                .desc("add NAME URL", "Register a remote")
                .argument(Argument::new("name"))
                .argument(Argument::new("url"))
                .handler(Arity::exactly(0), |ctx, _| {
                    let name = ctx.argument("name").map(Value::to_string).unwrap_or_default();
                    let url = ctx.argument("url").map(Value::to_string).unwrap_or_default();

                    if ctx.options().flag("verbose") {
                        ctx.say(&format!("Adding remote '{name}'."));
                    }

                    ctx.say(&format!("{name}\t{url}"));
                    Ok(Value::Null)
                }),
        )
        .build()
        .expect("Invalid remote declaration");
    let app = registry
        .class("Greet")
        .class_option(
            Opt::new("verbose")
                .default(false)
                .aliases(["v"])
                .description("Explain what is being done"),
        )
        .command(
            Command::build("greet")
                .desc("greet NAME", "Say hello to NAME")
                .long_description("Say hello to NAME.\n\nWith --loud, the greeting is shouted.")
                .example("greet Alice --loud")
                .argument(Argument::new("name"))
                .option(Opt::new("loud").default(false).aliases(["l"]).description("Shout"))
                .option(
                    Opt::new("times")
                        .default(1)
                        .description("How many greetings"),
                )
                .handler(Arity::any(), |ctx, args| {
                    let name = ctx.argument("name").map(Value::to_string).unwrap_or_default();
                    let greeting = if ctx.options().flag("loud") {
                        format!("HELLO, {}!", name.to_uppercase())
                    } else {
                        format!("Hello, {name}.")
                    };

                    for _ in 0..ctx.options().int("times").unwrap_or(1) {
                        ctx.say(&greeting);
                    }

                    if !args.is_empty() {
                        ctx.say(&format!("(ignoring {})", args.join(" ")));
                    }

                    Ok(Value::Null)
                }),
        )
        .map("hi", "greet")
        .subcommand("remote", remote, Some("Manage remotes"))
        .exit_on_failure(true)
        .build()
        .expect("Invalid greet declaration");

    let argv: Vec<String> = std::env::args().skip(1).collect();

    match Execution::new(&registry, app, argv, Config::default()).run() {
        Outcome::Success(_) => {}
        Outcome::Exit(code) => std::process::exit(code),
        Outcome::Raise(error) => panic!("{error:?}"),
    }
}
