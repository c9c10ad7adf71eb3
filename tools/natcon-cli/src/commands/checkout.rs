//! Place an order for the cart.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use console::Term;
use dialoguer::{Confirm, Input};
use natcon_commerce::prelude::*;

use super::CheckoutArgs;
use crate::context::Context;
use crate::output::{state_badge, status_badge};

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let api = HttpOrderApi::from_config(&ctx.config.order_api)
        .context("Order API is not configured (set order_api.base_url or NATCON_ORDER_API_URL)")?;

    let session = ctx.open_cart().await;
    let outcome = place_order(args, ctx, &session.cart, Arc::new(api)).await;
    session.close().await;

    let Some(order) = outcome? else {
        return Ok(());
    };

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }
    ctx.output.success(&format!("Order {} placed", order.id));
    ctx.output.kv("Status", &status_badge(order.status));
    ctx.output.kv("Items", &order.item_count().to_string());
    ctx.output.kv("Total", &order.subtotal().display());
    ctx.output.kv(
        "Placed",
        &order.placed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    ctx.output.kv("Confirmation sent to", &order.contact.email);
    Ok(())
}

/// Returns `None` when the buyer backed out.
async fn place_order(
    args: CheckoutArgs,
    ctx: &Context,
    cart: &CartStore,
    api: Arc<dyn OrderApi>,
) -> Result<Option<Order>> {
    let interactive = !args.yes && !ctx.output.is_json() && Term::stdout().is_term();
    let snapshot = cart.snapshot();

    if !snapshot.is_empty() && !ctx.output.is_json() {
        ctx.output.header("Your order");
        ctx.output.cart(&snapshot);
    }

    let contact = if interactive {
        prompt_contact(&args)?
    } else {
        ContactInfo {
            name: args.name.clone().unwrap_or_default(),
            email: args.email.clone().unwrap_or_default(),
            phone: args.phone.clone(),
            organization: args.organization.clone(),
        }
    };

    if interactive && !snapshot.is_empty() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Place order for {}?", snapshot.subtotal.display()))
            .default(true)
            .interact()?;
        if !confirmed {
            ctx.output.warn("Checkout cancelled");
            return Ok(None);
        }
    }

    let checkout = CheckoutOrchestrator::new(cart.clone(), api);
    let mut retries_left = args.retries;

    loop {
        let spinner = ctx.output.spinner("Placing order...");
        let result = checkout.submit(contact.clone()).await;
        spinner.finish_and_clear();

        let error = match result {
            Ok(order) => return Ok(Some(order)),
            Err(CheckoutError::Validation(errors)) => {
                if ctx.output.is_json() {
                    ctx.output.json(&errors);
                } else {
                    for field in &errors.errors {
                        ctx.output.warn(&format!("{}: {}", field.field, field.message));
                    }
                }
                bail!("Checkout details are invalid");
            }
            Err(CheckoutError::Rejected(error)) if error.retryable => error,
            Err(e) => return Err(e.into()),
        };

        ctx.output.warn(&format!(
            "Order failed ({}): {}",
            state_badge(&checkout.state()),
            error
        ));
        let retry = if retries_left > 0 {
            retries_left -= 1;
            true
        } else if interactive {
            Confirm::new()
                .with_prompt("Try again?")
                .default(true)
                .interact()?
        } else {
            false
        };
        if !retry {
            bail!("Order was not placed: {}", error.message);
        }
        if let Some(key) = checkout.idempotency_key() {
            ctx.output.debug(&format!("Retrying with idempotency key {}", key));
        }
    }
}

fn prompt_contact(args: &CheckoutArgs) -> Result<ContactInfo> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };
    let email = match &args.email {
        Some(email) => email.clone(),
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let phone = match &args.phone {
        Some(phone) => Some(phone.clone()),
        None => optional_input("Phone (optional)")?,
    };
    let organization = match &args.organization {
        Some(organization) => Some(organization.clone()),
        None => optional_input("Organization (optional)")?,
    };

    Ok(ContactInfo {
        name,
        email,
        phone,
        organization,
    })
}

fn optional_input(prompt: &str) -> Result<Option<String>> {
    let value = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok((!value.trim().is_empty()).then_some(value))
}
