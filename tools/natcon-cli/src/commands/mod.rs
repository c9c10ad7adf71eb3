//! CLI command implementations.

pub mod cart;
pub mod checkout;

use clap::{Args, Subcommand};

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add an item, merging with an existing line for the same product and variant.
    Add {
        /// Product ID.
        product: String,

        /// Variant, e.g. a size.
        #[arg(long, default_value = "")]
        variant: String,

        /// Number of units.
        #[arg(short, long, default_value = "1")]
        quantity: i64,

        /// Unit price in minor units (cents).
        #[arg(short, long)]
        price: i64,

        /// Name shown in the cart (default: the product ID).
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Set an item's quantity; 0 removes it.
    Update {
        /// Product ID.
        product: String,

        /// New quantity.
        quantity: i64,

        /// Variant.
        #[arg(long, default_value = "")]
        variant: String,
    },
    /// Remove an item.
    Remove {
        /// Product ID.
        product: String,

        /// Variant.
        #[arg(long, default_value = "")]
        variant: String,
    },
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Buyer name.
    #[arg(long)]
    pub name: Option<String>,

    /// Buyer email.
    #[arg(long)]
    pub email: Option<String>,

    /// Phone number.
    #[arg(long)]
    pub phone: Option<String>,

    /// Organization.
    #[arg(long)]
    pub organization: Option<String>,

    /// Retry retryable failures this many times without asking.
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Skip prompts.
    #[arg(short, long)]
    pub yes: bool,
}
