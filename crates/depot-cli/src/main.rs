use std::process::ExitCode;

use clap::Parser;

mod cli;
mod config;
mod confirm;
mod dispatch;
mod errors;
mod gather;
mod logging;
mod pipeline;
mod postactions;
mod render;
mod session;


fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    dispatch::run(cli)
}
