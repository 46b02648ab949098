use anyhow::Error as Anyhow;
use clap::Parser;

mod applet;
mod build;
mod cli;
mod coordinator;
mod engine;
mod io;
mod uci;

fn main() -> Result<(), Anyhow> {
    cli::Cli::parse().execute()
}
