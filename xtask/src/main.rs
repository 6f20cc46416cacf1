use anyhow::{bail, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod contracts;
mod demo;
mod python;

const USAGE: &str = "\
Usage:
  cargo run -p xtask -- contracts
  cargo run -p xtask -- demo <harmonograph|lissajous|convolution|derivative-1d|derivative-2d> [--config path.json]";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .try_init();
}

/// Pull `--config <path>` (or `--config=<path>`) out of the trailing demo arguments.
fn parse_config_flag(args: &[String]) -> Result<Option<PathBuf>> {
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let path = if let Some(value) = arg.strip_prefix("--config=") {
            value.to_string()
        } else if arg == "--config" {
            match iter.next() {
                Some(value) => value.clone(),
                None => bail!("--config expects a path"),
            }
        } else {
            bail!("unexpected argument `{arg}`\n{USAGE}");
        };
        if config.replace(PathBuf::from(path)).is_some() {
            bail!("--config given more than once");
        }
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_tracing();
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("contracts") => contracts::run_contracts(),
        Some("demo") => {
            let Some(name) = args.next() else {
                bail!("missing demo name\n{USAGE}");
            };
            let rest: Vec<String> = args.collect();
            let demo = name.parse::<demo::Demo>()?;
            demo::run_demo(demo, parse_config_flag(&rest)?.as_deref())
        }
        _ => {
            eprintln!("{USAGE}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_flag_accepts_both_spellings() {
        assert_eq!(parse_config_flag(&[]).unwrap(), None);
        assert_eq!(
            parse_config_flag(&args(&["--config", "a.json"])).unwrap(),
            Some(PathBuf::from("a.json"))
        );
        assert_eq!(
            parse_config_flag(&args(&["--config=b.json"])).unwrap(),
            Some(PathBuf::from("b.json"))
        );
    }

    #[test]
    fn config_flag_rejects_strays_and_repeats() {
        assert!(parse_config_flag(&args(&["--config"])).is_err());
        assert!(parse_config_flag(&args(&["--verbose"])).is_err());
        assert!(parse_config_flag(&args(&["--config=a", "--config", "b"])).is_err());
    }
}
