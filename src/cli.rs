// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - demo: run the withData scenario against an in-memory source
// - inspect: apply the configured [[stack]] to a sample component
// - config --show / --path: effective configuration and its location

use crate::demo;
use enhancer::compose::Enhancer;
use enhancer::config::{Config, VERSION};
use enhancer::host::Root;
use enhancer::logging;
use enhancer::props;
use enhancer::stack::build_stack;
use enhancer::statics::StaticValue;
use clap::{Parser, Subcommand};

/// Compose component enhancers and inspect the result
#[derive(Parser)]
#[command(name = "enhancer")]
#[command(version = VERSION)]
#[command(about = "Compose component enhancers and inspect the result", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the withData scenario against an in-memory source
    Demo {
        /// Number of updates that only touch an untracked prop
        #[arg(long, default_value_t = 3)]
        ticks: usize,
    },

    /// Apply the configured [[stack]] to a sample component and describe it
    Inspect,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        // Path lookup must work even when the file itself is broken
        Commands::Config { path: true, .. } => handle_config_path(),
        Commands::Config { show, .. } => {
            let config = Config::load()?;
            if show {
                handle_config_show(&config)
            } else {
                println!("Usage: enhancer config [--show|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --path    Show config file path");
                Ok(())
            }
        }
        Commands::Demo { ticks } => {
            let config = Config::load()?;
            let _log_guard = logging::init(&config.logging)?;
            demo::run(ticks).map(|_| ())
        }
        Commands::Inspect => {
            let config = Config::load()?;
            let _log_guard = logging::init(&config.logging)?;
            handle_inspect(&config)
        }
    }
}

fn handle_config_path() -> anyhow::Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => anyhow::bail!("Could not determine config path"),
    }
}

fn handle_config_show(config: &Config) -> anyhow::Result<()> {
    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml()?);

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_inspect(config: &Config) -> anyhow::Result<()> {
    let source = demo::sample_source();
    let selectors = demo::sample_selectors(source);
    let enhance = build_stack(&config.stack, &selectors)?;
    let component = enhance.enhance(demo::sample_component())?;

    println!("Stack ({} entries, outermost first):", config.stack.len());
    for (i, spec) in config.stack.iter().enumerate() {
        println!("  {}. {}", i + 1, spec);
    }
    println!();
    println!("Enhancer:  {}", enhance.name());
    println!("Component: {}", component.display_name());

    println!();
    println!("Contract:");
    if component.contract().is_empty() {
        println!("  (none)");
    }
    for name in component.contract().names() {
        if let Some(spec) = component.contract().get(name) {
            let required = if spec.required { "required" } else { "optional" };
            println!("  {:<16} {:<8} {}", name, spec.kind.as_str(), required);
        }
    }

    println!();
    println!("Statics:");
    for name in component.statics().names() {
        match component.statics().get(name) {
            Some(StaticValue::Value(value)) => println!("  {:<16} {}", name, value.to_json()),
            Some(StaticValue::Function(_)) => println!("  {:<16} <function>", name),
            None => {}
        }
    }

    println!();
    match Root::mount(component, props! { "id" => 1 }).and_then(|root| root.render()) {
        Ok(node) => println!("Render (id=1): {}", demo::show(&node)),
        Err(e) => println!("Render (id=1) failed: {}", e),
    }
    Ok(())
}
