// enhancer - compose higher-order component enhancers
//
// The library does the work; this binary exposes it for exploration:
// - demo: the withData scenario, step by step
// - inspect: apply the configured enhancer stack to a sample component
// - config: show the effective configuration or its path

mod cli;
mod demo;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    cli::run(cli::Cli::parse())
}
