use anyhow::{anyhow, Result};
use ast::into_ast::parse;
use interpreter::run;
use std::{env, fs::File, io::Read, path::PathBuf};
use typesystem::type_check;

#[derive(Debug, PartialEq)]
struct Config {
    path: PathBuf,
    verbose: bool,
    /// stop after type checking
    check: bool,
}

impl Config {
    fn from_args(args: impl Iterator<Item = String>) -> Result<Self> {
        let mut path = None;
        let mut verbose = false;
        let mut check = false;
        for arg in args {
            match arg.as_str() {
                "--verbose" | "-v" => verbose = true,
                "--check" => check = true,
                flag if flag.starts_with('-') => return Err(anyhow!("unknown option {}", flag)),
                _ if path.is_some() => return Err(anyhow!("unexpected argument {}", arg)),
                _ => path = Some(PathBuf::from(arg)),
            }
        }
        let path = path.ok_or(anyhow!("usage: interpreter <path> [--verbose] [--check]"))?;
        Ok(Self {
            path,
            verbose,
            check,
        })
    }

    fn level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}

fn main() -> Result<()> {
    let config = Config::from_args(env::args().skip(1))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_max_level(config.level())
        .with_line_number(true)
        .init();

    log::debug!("path: {}", config.path.display());
    let mut f = File::open(&config.path)?;
    let mut program = String::new();
    f.read_to_string(&mut program)?;

    let program = parse(&program)?;
    if config.check {
        let program = type_check(&program)?;
        println!("{}", program.ty());
        return Ok(());
    }
    let (ret, _) = run(&program)?;
    println!("{}", &ret);
    Ok(())
}
