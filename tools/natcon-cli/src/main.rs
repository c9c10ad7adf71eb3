//! NatCon CLI - manage the store cart and check out from the terminal.
//!
//! Commands:
//! - `natcon cart show` - Show the cart
//! - `natcon cart add` - Add an item
//! - `natcon cart update` - Change an item's quantity
//! - `natcon cart remove` - Remove an item
//! - `natcon cart clear` - Empty the cart
//! - `natcon checkout` - Place an order for the cart

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CartArgs, CheckoutArgs};

/// NatCon CLI - cart and checkout for the NatCon 2026 store
#[derive(Parser)]
#[command(name = "natcon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the cart is saved in (default: ./.natcon)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep the cart in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart(CartArgs),

    /// Submit the cart as an order
    Checkout(CheckoutArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "natcon=debug" } else { "natcon=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = match context::Context::load(
        cli.config.as_deref(),
        cli.data_dir,
        cli.no_persist,
        output.clone(),
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
