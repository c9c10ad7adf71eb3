//! Inspect and change the cart.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use natcon_commerce::cart::{CartStore, LineItemKey, QuantityChange};

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let session = ctx.open_cart().await;
    let outcome = apply(args.command.unwrap_or(CartCommand::Show), &session.cart, ctx);
    let snapshot = session.cart.snapshot();
    session.close().await;

    if outcome? {
        ctx.output.cart(&snapshot);
    }
    Ok(())
}

/// Apply one cart command. Returns whether the cart should be printed.
fn apply(command: CartCommand, cart: &CartStore, ctx: &Context) -> Result<bool> {
    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            product,
            variant,
            quantity,
            price,
            name,
        } => {
            let name = name.unwrap_or_else(|| product.clone());
            let key = cart.add_item(product, variant, quantity, price, name.clone())?;
            ctx.output.debug(&format!("Line item {}", key));
            ctx.output
                .success(&format!("Added {} × {}", quantity, name));
        }
        CartCommand::Update {
            product,
            quantity,
            variant,
        } => {
            let key = LineItemKey::new(product, variant);
            match cart.update_quantity(&key, quantity)? {
                QuantityChange::Updated => ctx
                    .output
                    .success(&format!("{} quantity set to {}", key, quantity)),
                QuantityChange::Removed => ctx.output.success(&format!("Removed {}", key)),
                QuantityChange::NotFound => bail!("{} is not in the cart", key),
            }
        }
        CartCommand::Remove { product, variant } => {
            let key = LineItemKey::new(product, variant);
            if !cart.remove_item(&key) {
                bail!("{} is not in the cart", key);
            }
            ctx.output.success(&format!("Removed {}", key));
        }
        CartCommand::Clear { yes } => {
            if !yes && !ctx.output.is_json() && !cart.snapshot().is_empty() {
                let confirmed = Confirm::new()
                    .with_prompt("Remove everything from the cart?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    ctx.output.warn("Cart left unchanged");
                    return Ok(false);
                }
            }
            cart.clear();
            ctx.output.success("Cart cleared");
        }
    }
    Ok(true)
}
