// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use roster_db::Store;
use runtime::{Command, Runtime};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: roster [options] <command> [args]

options:
  --config <path>          read config from <path>
  --demo                   use an in-memory database seeded with sample records
  --check                  load config, open the database, then exit
  --print-config-path      show where the config file is read from
  --print-path             show which database file would be opened
  --print-example-config   emit a commented v1 config
  -h, --help               show this message

objects: accounts, students, contacts

commands:
  list <object> [--search KEY] [--sort FIELD[:asc|desc]] [--page N] [--json]
  show <object> <id>       record details; accounts also list their contacts
  create <object> Field=Value...
  delete <object> <id>
  dashboard [--json]
";

/// What a single invocation does. The last info flag on the line wins.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Help,
    ShowConfigPath,
    ShowDbPath,
    ShowExampleConfig,
    Check,
    Run(Option<Command>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    config_path: PathBuf,
    demo: bool,
    action: Action,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("roster: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let invocation = parse_invocation(std::env::args().skip(1), Config::default_path()?)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &invocation.action {
        Action::Help => return write_usage(&mut out),
        Action::ShowConfigPath => {
            writeln!(out, "{}", invocation.config_path.display())?;
            return Ok(());
        }
        Action::ShowExampleConfig => {
            write!(out, "{}", Config::example_config(&invocation.config_path))?;
            return Ok(());
        }
        Action::ShowDbPath | Action::Check | Action::Run(_) => {}
    }

    let config = Config::load(&invocation.config_path).with_context(|| {
        format!(
            "config {} is unusable; compare it with `roster --print-example-config`",
            invocation.config_path.display()
        )
    })?;
    init_tracing(config.log_level());

    let db_path = if invocation.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if invocation.action == Action::ShowDbPath {
        writeln!(out, "{}", db_path.display())?;
        return Ok(());
    }

    let store = open_store(&db_path, invocation.demo)?;
    let options = config.list_options();
    info!(
        db = %db_path.display(),
        mode = options.mode.as_str(),
        page_size = options.page_size,
        "store ready"
    );

    match invocation.action {
        Action::Run(Some(command)) => {
            Runtime::new(Rc::new(store), options).execute(&command, &mut out)
        }
        Action::Run(None) => write_usage(&mut out),
        _ => Ok(()),
    }
}

fn open_store(path: &Path, demo: bool) -> Result<Store> {
    let store = Store::open(path).with_context(|| {
        format!(
            "cannot open {}; set [storage].db_path or ROSTER_DB_PATH to a writable file",
            path.display()
        )
    })?;
    store.bootstrap()?;
    if demo {
        store.seed_demo_data()?;
    }
    Ok(store)
}

/// `RUST_LOG` overrides the configured level. Output goes to stderr.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn write_usage(out: &mut dyn Write) -> Result<()> {
    out.write_all(USAGE.as_bytes())?;
    Ok(())
}

/// Splits argv into global flags and a trailing command. Everything from
/// the first bare word on belongs to the command, flags included.
fn parse_invocation<I, S>(args: I, default_config_path: PathBuf) -> Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config_path = default_config_path;
    let mut demo = false;
    let mut info_action = None;
    let mut command_words: Vec<S> = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let flag = arg.as_ref();
        if !flag.starts_with('-') {
            command_words.push(arg);
            command_words.extend(args);
            break;
        }
        match flag {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config expects a path to a TOML file"))?;
                config_path = PathBuf::from(path.as_ref());
            }
            "--demo" => demo = true,
            "--check" => info_action = Some(Action::Check),
            "--print-config-path" => info_action = Some(Action::ShowConfigPath),
            "--print-path" => info_action = Some(Action::ShowDbPath),
            "--print-example-config" => info_action = Some(Action::ShowExampleConfig),
            "-h" | "--help" => info_action = Some(Action::Help),
            other => {
                return Err(anyhow!(
                    "unrecognized option {other:?} (see `roster --help`)"
                ));
            }
        }
    }

    let action = match info_action {
        Some(action) => action,
        None if command_words.is_empty() => Action::Run(None),
        None => Action::Run(Some(Command::parse(&command_words)?)),
    };
    Ok(Invocation {
        config_path,
        demo,
        action,
    })
}
