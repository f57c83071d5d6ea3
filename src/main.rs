use std::io::{self, Read};
use std::path::PathBuf;

use chrono::NaiveDate;
use chronolex::{Context, EntityRecognizer, TimeDomain};

fn main() {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let recognizer = EntityRecognizer::with_sources(TimeDomain, config.dictionary, None);
    let ctx = Context { reference_date: config.reference_date };
    let entities = recognizer.recognize_with(&config.input, &ctx);

    if entities.is_empty() {
        println!("no entities recognized");
        return;
    }

    for entity in &entities {
        println!(
            "{:<12} [{:>3}, {:>3})  {}  {} .. {}  granularity={} source={} confidence={:.2}",
            entity.text,
            entity.span.start,
            entity.span.end,
            entity.value.kind.code(),
            entity.value.start_date,
            entity.value.end_date,
            entity.value.granularity.code(),
            entity.source,
            entity.confidence,
        );
    }
}

struct CliConfig {
    input: String,
    reference_date: NaiveDate,
    dictionary: Option<PathBuf>,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut input: Option<String> = None;
    let mut reference_date = chrono::Local::now().date_naive();
    let mut dictionary: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("chronolex {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--reference" => {
                let value = args.next().ok_or_else(|| "error: --reference expects a value".to_string())?;
                reference_date = parse_reference(&value)?;
            }
            "--dictionary" => {
                let value = args.next().ok_or_else(|| "error: --dictionary expects a value".to_string())?;
                dictionary = Some(PathBuf::from(value));
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(value);
            }
            _ if arg.starts_with("--reference=") => {
                reference_date = parse_reference(arg.trim_start_matches("--reference="))?;
            }
            _ if arg.starts_with("--dictionary=") => {
                dictionary = Some(PathBuf::from(arg.trim_start_matches("--dictionary=")));
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                if input.is_some() {
                    return Err("error: input provided multiple times".to_string());
                }
                input = Some(rest);
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(CliConfig { input, reference_date, dictionary })
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn parse_reference(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("error: invalid --reference '{value}' (expected YYYY-MM-DD)"))
}

fn help_text() -> String {
    format!(
        "chronolex {version}

Dictionary-driven time-entity recognition CLI.

Usage:
  chronolex [OPTIONS] <input...>
  chronolex [OPTIONS] --input <text>

Options:
  -i, --input <text>         Input text to recognize. If omitted, reads
                             remaining args or stdin when no args are provided.
  --reference <date>         Reference date in YYYY-MM-DD. Default: today.
  --dictionary <path>        JSON dictionary config document.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Exit codes:
  0  Success.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
