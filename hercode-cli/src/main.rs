use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hercode_core::toolchain::DEFAULT_CC;
use hercode_core::{CoreError, Toolchain, compile_executable, compile_to_c, dump_tokens};
use log::{LevelFilter, info};
use simple_logger::SimpleLogger;

/// Compile HerCode programs to native executables through C.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, help = "Source file (reads stdin when omitted)")]
    input: Option<String>,

    #[arg(short, long, default_value = "output")]
    output: String,

    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "exe",
        help = "Output format: exe, c, tokens"
    )]
    emit: String,

    #[arg(long, env = "CC", default_value = DEFAULT_CC, help = "C compiler used for --emit exe")]
    cc: String,

    #[arg(
        long = "cflag",
        value_name = "FLAG",
        allow_hyphen_values = true,
        help = "Extra argument for the C compiler (repeatable)"
    )]
    cflags: Vec<String>,

    #[arg(long, help = "Keep the generated C file next to the executable")]
    keep_c: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v, -vv, -vvv)")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(log_level(cli.verbose))
        .env()
        .init()
        .context("failed to initialise logging")?;
    execute(cli)
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn execute(cli: Cli) -> Result<()> {
    let (name, source) = match &cli.input {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {path}"))?;
            (path.as_str(), source)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read source from stdin")?;
            ("<stdin>", buffer)
        }
    };

    match cli.emit.as_str() {
        "exe" => {
            let toolchain = Toolchain {
                cc: cli.cc.clone(),
                flags: cli.cflags.clone(),
                keep_c_source: cli.keep_c,
            };
            prepare_parent(&cli.output)?;
            let artifact = compile_executable(&source, &cli.output, &toolchain)
                .with_context(|| format!("failed to compile {name}"))?;
            info!("{} function(s) compiled", artifact.functions.len());
            println!("Compilation successful. Output: {}", cli.output);
        }
        "c" => {
            let artifact =
                compile_to_c(&source).with_context(|| format!("failed to compile {name}"))?;
            write_output(&cli.output, artifact.c_source.as_bytes())?;
        }
        "tokens" => {
            write_output(&cli.output, dump_tokens(&source).as_bytes())?;
        }
        other => return Err(CoreError::UnsupportedFormat(other.to_string()).into()),
    }

    Ok(())
}

fn prepare_parent(path: &str) -> Result<()> {
    if let Some(parent) = PathBuf::from(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
    }
    Ok(())
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    prepare_parent(path)?;
    fs::write(path, bytes).with_context(|| format!("failed to write output file {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_verbosity_to_log_level() {
        assert_eq!(log_level(0), LevelFilter::Warn);
        assert_eq!(log_level(1), LevelFilter::Info);
        assert_eq!(log_level(2), LevelFilter::Debug);
        assert_eq!(log_level(7), LevelFilter::Trace);
    }

    #[test]
    fn parses_repeated_cflags() {
        let cli = Cli::try_parse_from([
            "hercode", "-i", "a.hc", "--cflag", "-O2", "--cflag", "-Wall", "-vv",
        ])
        .expect("valid arguments");
        assert_eq!(cli.cflags, vec!["-O2", "-Wall"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, "output");
        assert_eq!(cli.emit, "exe");
    }
}
