mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use jiff::tz::TimeZone;
use kql::{FixedClock, QueryEngine};
use std::io::{BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = QueryEngine::from_config(&cli.config())?;
    if let Some(now) = cli.now {
        let tz = match &cli.tz {
            Some(name) => TimeZone::get(name).with_context(|| format!("unknown time zone '{name}'"))?,
            None => TimeZone::system(),
        };
        engine = engine.with_clock(FixedClock(now.to_zoned(tz)));
    }

    if !cli.query.is_empty() {
        let query = cli.query.join(" ");
        let output = run(&engine, &query, cli.ast)?;
        println!("{output}");
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        stdout.flush().context("stdout is closed")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        } else if line == "/bye" {
            break;
        }
        match run(&engine, line, cli.ast) {
            Ok(output) => println!("{output}"),
            Err(e) => eprintln!("Failed to compile: {e:#}"),
        }
    }
    Ok(())
}

fn run(engine: &QueryEngine, query: &str, ast: bool) -> Result<String> {
    debug!(query, ast, "compiling");
    if ast {
        let tree = engine.build(query)?;
        return serde_json::to_string_pretty(&tree).context("Failed to serialize tree");
    }
    Ok(engine.compile(query)?)
}
