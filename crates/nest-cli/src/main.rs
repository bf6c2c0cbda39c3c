use clap::Parser;

mod cli;
mod commands;

use crate::cli::CliArgs;

pub type CliResult<T> = nest_core::Result<T>;

fn main() -> CliResult<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let settings = args.settings()?;
    args.command.run(&settings)
}
