use std::env;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use jst_core::{transpile_str, Target, TranspileConfig, TranspileError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Transpile(#[from] TranspileError),
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: io::Error,
    },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 64,
            CliError::Transpile(_) => 1,
            CliError::Io { .. } => 2,
        }
    }
}

fn main() -> ExitCode {
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            anstream::eprintln!("jst-cli: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run_cli() -> Result<(), CliError> {
    let args: Vec<String> = env::args().collect();

    let mut source: Option<String> = None;
    let mut format: Option<Target> = None;
    let mut output: Option<String> = None;
    let mut config = TranspileConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--source" => {
                source = Some(take_value(&args, &mut i, "--source")?);
            }
            "--format" => {
                let value = take_value(&args, &mut i, "--format")?;
                format = Some(value.parse().map_err(CliError::Usage)?);
            }
            "--output" => {
                output = Some(take_value(&args, &mut i, "--output")?);
            }
            "--debug" => {
                config.debug = true;
            }
            other => {
                return Err(CliError::Usage(format!("Unknown argument: {other}")));
            }
        }
        i += 1;
    }

    let source = source.ok_or_else(|| CliError::Usage("Missing required --source".to_string()))?;
    let format = format.ok_or_else(|| CliError::Usage("Missing required --format".to_string()))?;

    let text = if source == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::Io {
                context: "Failed to read stdin".to_string(),
                source,
            })?;
        buffer
    } else {
        fs::read_to_string(&source).map_err(|err| CliError::Io {
            context: format!("Failed to read {source}"),
            source: err,
        })?
    };

    let schema = transpile_str(&text, format, &config)?;
    let rendered = serde_json::to_string_pretty(&schema).map_err(|err| CliError::Io {
        context: "Failed to render output".to_string(),
        source: err.into(),
    })?;

    match output {
        Some(path) => {
            fs::write(&path, format!("{rendered}\n")).map_err(|err| CliError::Io {
                context: format!("Failed to write {path}"),
                source: err,
            })?;
        }
        None => {
            anstream::println!("{rendered}");
        }
    }
    Ok(())
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, CliError> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| CliError::Usage(format!("Missing value for {flag}")))
}

fn print_help() {
    anstream::println!("jst-cli - JSON Schema transpiler");
    anstream::println!();
    anstream::println!("USAGE:");
    anstream::println!("    jst-cli --source <FILE> --format <bigquery|avro> [OPTIONS]");
    anstream::println!();
    anstream::println!("OPTIONS:");
    anstream::println!("    -h, --help            Print this help message");
    anstream::println!("    --source <FILE>       Source JSON Schema file ('-' reads stdin)");
    anstream::println!("    --format <FORMAT>     Target schema language: bigquery or avro");
    anstream::println!("    --output <FILE>       Write the schema here instead of stdout");
    anstream::println!("    --debug               Print merge decisions to stderr");
    anstream::println!();
    anstream::println!("EXIT CODES:");
    anstream::println!("    0    success");
    anstream::println!("    1    schema could not be transpiled");
    anstream::println!("    2    source unreadable or output unwritable");
    anstream::println!("    64   usage error");
    anstream::println!();
    anstream::println!("EXAMPLES:");
    anstream::println!("    jst-cli --source telemetry.schema.json --format bigquery");
    anstream::println!("    echo '{{\"type\": \"integer\"}}' | jst-cli --source - --format avro");
}
