#![deny(clippy::all)]

use std::env;

use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result};
use shim_core::{detect_interpreter, Config, Invocation, SETUP_PY_STUB};

mod cli;

use cli::ShimCli;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = ShimCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    if cli.print_setup_py {
        print!("{SETUP_PY_STUB}");
        return Ok(());
    }

    let (command, args) = cli
        .legacy
        .split_first()
        .ok_or_else(|| eyre!("missing legacy command"))?;
    let root = match &cli.source {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let config = Config::from_env().with_python(cli.python.clone());

    let outcome = detect_interpreter(&config).and_then(|python| {
        shim_core::run(&Invocation {
            root,
            python,
            command: command.clone(),
            args: args.to_vec(),
            config,
        })
    });

    match outcome {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("Error: {:?}", Report::new(err));
            std::process::exit(code);
        }
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = env::var("SHIM_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| {
            format!("setup_shim={level},shim_core={level},shim_domain={level}")
        });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
