use std::path::Path;
use std::process::ExitCode;

use clap::{Args as ClapArgs, Parser, Subcommand};
use deepcompare::{diff, Compare, CompareError, CompareOptions, Value};
use tracing::{debug, Level};

/// Compare two JSON documents or text files and explain how they differ.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two JSON values (literal JSON or paths to JSON files)
    Json {
        first: String,
        second: String,
        #[command(flatten)]
        common: Common,
        /// Report differing types even when values are equal
        #[arg(long)]
        strict: bool,
        /// Always compare structurally
        #[arg(long)]
        ignore_eq: bool,
    },
    /// Compare two text files
    Text {
        first: String,
        second: String,
        #[command(flatten)]
        common: Common,
        /// Ignore blank lines
        #[arg(long)]
        no_blanklines: bool,
        /// Ignore whitespace at the end of lines
        #[arg(long)]
        no_trailing_whitespace: bool,
        /// Make whitespace visible in diffs
        #[arg(long)]
        show_whitespace: bool,
    },
    /// Print a unified diff of two text files
    Diff { first: String, second: String },
}

#[derive(ClapArgs, Debug)]
struct Common {
    /// Label the sides expected/actual
    #[arg(long)]
    expected_actual: bool,
    /// Text placed before the report
    #[arg(long)]
    prefix: Option<String>,
    /// Text placed after the report
    #[arg(long)]
    suffix: Option<String>,
    /// JSON file holding an option object
    #[arg(long)]
    options: Option<String>,
    /// Extra option, `name=value` (value parsed as JSON, else text)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,
}

impl Common {
    fn apply(&self, mut cmp: Compare) -> Result<Compare, CompareError> {
        if let Some(path) = &self.options {
            let text = std::fs::read_to_string(path)?;
            cmp = cmp.options(CompareOptions::from_json(&text)?);
        }
        for pair in &self.set {
            let (name, raw) = pair.split_once('=').ok_or_else(|| {
                CompareError::InvalidArguments(format!("expected NAME=VALUE, got {pair:?}"))
            })?;
            let value = serde_json::from_str::<serde_json::Value>(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
            cmp = cmp.option(name, value);
        }
        if let Some(prefix) = &self.prefix {
            cmp = cmp.prefix(prefix);
        }
        if let Some(suffix) = &self.suffix {
            cmp = cmp.suffix(suffix);
        }
        Ok(cmp)
    }
}

fn load_json(arg: &str) -> Result<Value, CompareError> {
    let text = if Path::new(arg).is_file() {
        std::fs::read_to_string(arg)?
    } else {
        arg.to_string()
    };
    let json: serde_json::Value = serde_json::from_str(&text)?;
    Ok(Value::from(json))
}

fn compare(cmp: Compare, common: &Common, first: Value, second: Value) -> Result<(), CompareError> {
    if common.expected_actual {
        cmp.expected(first).actual(second).check()
    } else {
        cmp.run(&first, &second)
    }
}

fn run(args: Args) -> Result<(), CompareError> {
    match args.command {
        Command::Json { first, second, common, strict, ignore_eq } => {
            let cmp = common.apply(Compare::new().strict(strict).ignore_eq(ignore_eq))?;
            compare(cmp, &common, load_json(&first)?, load_json(&second)?)
        }
        Command::Text {
            first,
            second,
            common,
            no_blanklines,
            no_trailing_whitespace,
            show_whitespace,
        } => {
            let cmp = common.apply(
                Compare::new()
                    .blanklines(!no_blanklines)
                    .trailing_whitespace(!no_trailing_whitespace)
                    .show_whitespace(show_whitespace),
            )?;
            let first = Value::Text(std::fs::read_to_string(&first)?);
            let second = Value::Text(std::fs::read_to_string(&second)?);
            compare(cmp, &common, first, second)
        }
        Command::Diff { first, second } => {
            let out = diff(&std::fs::read_to_string(&first)?, &std::fs::read_to_string(&second)?);
            if out.is_empty() {
                Ok(())
            } else {
                Err(CompareError::NotEqual { message: out })
            }
        }
    }
}

fn main() -> ExitCode {
    // Parse CLI arguments.
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    debug!(?args, "starting");

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CompareError::NotEqual { message }) => {
            println!("{message}");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
