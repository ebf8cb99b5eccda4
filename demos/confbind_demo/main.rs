//! # confbind demo application
//!
//! Binds a small service config from a JSON document, the process
//! environment and call-time overrides, then prints what it resolved.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example confbind_demo
//! DEMO_SERVER_PORT=9999 cargo run --example confbind_demo
//! DEMO_SERVER_PORT=nope cargo run --example confbind_demo    # cast error
//! cargo run --example confbind_demo -- --report              # collect every failure
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | Where                                                   |
//! |--------------------------|---------------------------------------------------------|
//! | Typed fields and casters | `server.port` (int), `server.debug` (bool)              |
//! | Nested key synthesis     | `server.port` is read as `DEMO_SERVER_PORT`             |
//! | Per-field provider       | `display.color` comes from the JSON document            |
//! | Reference field          | `server.url` is derived from `host` and `port`          |
//! | Constant field           | `display.theme`                                         |
//! | Overrides                | `--quiet` overrides `log_level`                         |
//! | Typed output             | the resolved tree is deserialized into `DemoConfig`     |

use std::process::ExitCode;
use std::sync::Arc;

use serde::Deserialize;

use confbind::{
    BindError, JsonProvider, Schema, ScalarType, Value, constant_field, field, log_level_caster,
    reference_field, sibling,
};

const SETTINGS: &str = r#"{ "display": { "color": "yellow" } }"#;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DemoConfig {
    log_level: String,
    server: Server,
    display: Display,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Server {
    host: String,
    port: u16,
    debug: bool,
    url: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Display {
    color: String,
    theme: String,
}

fn schema() -> Result<Schema, BindError> {
    let settings = Arc::new(JsonProvider::parse(SETTINGS)?);

    let server = Schema::builder("Server")
        .literal("host", ScalarType::Str, "127.0.0.1")
        .literal("port", ScalarType::Int, 8080)
        .literal("debug", ScalarType::Bool, false)
        .field(
            "url",
            reference_field([sibling("host"), sibling("port")], |v| {
                Ok(Value::String(format!(
                    "http://{}:{}",
                    v[0].as_str().unwrap_or_default(),
                    v[1]
                )))
            }),
        );

    let display = Schema::builder("Display")
        .field(
            "color",
            field().key("display.color").default("white").provider(settings),
        )
        .field("theme", constant_field("dark"));

    Schema::builder("Demo")
        .prefix("DEMO")
        .typed_field("log_level", ScalarType::Str, field().default("info").caster(log_level_caster()))
        .sub_config("server", server)
        .sub_config("display", display)
        .build()
}

fn run(report: bool, quiet: bool) -> Result<(), BindError> {
    let schema = schema()?;
    let mut instance = schema.instance();
    if quiet {
        instance = instance.set("log_level", "error");
    }

    let resolved = if report { instance.report()? } else { instance.load()? };
    println!("{resolved}");

    let typed: DemoConfig = resolved.deserialize()?;
    println!("\n{typed:#?}");
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let report = args.iter().any(|a| a == "--report");
    let quiet = args.iter().any(|a| a == "--quiet");

    match run(report, quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(BindError::Unresolved(errors)) => {
            for err in errors {
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
