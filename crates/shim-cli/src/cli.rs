use std::path::PathBuf;

use clap::{ArgAction, Parser};

pub const SHIM_AFTER_HELP: &str = concat!(
    "Legacy commands:\n",
    "  egg_info [--egg-base DIR]        Write <name>.egg-info from the build tool's metadata.\n",
    "  develop [--prefix P] [--root R]  Run the build tool's develop step.\n",
    "  install --record FILE            Build a wheel, install it, write the install record.\n",
    "  bdist_wheel [-d DIR]             Build a wheel into DIR (default: dist/).\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "setup-shim",
    author,
    version,
    about = "Present a pypa.json build tool to installers that only know setup.py",
    after_help = SHIM_AFTER_HELP,
    disable_help_subcommand = true
)]
pub struct ShimCli {
    #[arg(short, long, help = "Only log warnings and errors")]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
    #[arg(
        long,
        value_name = "PATH",
        help = "Interpreter that drives the build (default: SHIM_PYTHON, then python3 on PATH)"
    )]
    pub python: Option<String>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Source tree containing pypa.json (default: current directory)"
    )]
    pub source: Option<PathBuf>,
    #[arg(long, help = "Print a setup.py that forwards to this shim and exit")]
    pub print_setup_py: bool,
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "print_setup_py",
        help = "Legacy setup.py command followed by its arguments, passed through verbatim"
    )]
    pub legacy: Vec<String>,
}
