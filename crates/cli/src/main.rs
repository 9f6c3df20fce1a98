use std::io::Read;

use anyhow::Context;
use clap::Parser;

use courier_cli::Cli;

fn main() -> anyhow::Result<()> {
    courier_observability::init();

    let cli = Cli::parse();
    let config = cli.config().context("invalid courier configuration")?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read event from stdin")?;

    let output = courier_cli::run(&cli.command, &input, config)?;
    println!("{output}");
    Ok(())
}
