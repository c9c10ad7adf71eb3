//! Output formatting for the CLI.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use natcon_commerce::cart::CartSnapshot;
use natcon_commerce::checkout::{CheckoutState, OrderStatus};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print the cart as a table, or as JSON in JSON mode.
    pub fn cart(&self, snapshot: &CartSnapshot) {
        if self.json {
            self.json(snapshot);
            return;
        }
        if snapshot.is_empty() {
            self.info("Your cart is empty");
            return;
        }

        const WIDTHS: [usize; 5] = [20, 24, 5, 10, 10];
        self.table_row(&["ITEM", "NAME", "QTY", "PRICE", "TOTAL"], &WIDTHS);
        for item in &snapshot.items {
            let key = item.key.to_string();
            let quantity = item.quantity.to_string();
            let price = item.unit_price.display();
            let total = item.line_total().display();
            self.table_row(
                &[&key, &item.display_name, &quantity, &price, &total],
                &WIDTHS,
            );
        }
        println!();
        self.kv("Items", &snapshot.item_count.to_string());
        self.kv(
            "Subtotal",
            &style(snapshot.subtotal.display()).bold().to_string(),
        );
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Colored label for a checkout state.
pub fn state_badge(state: &CheckoutState) -> String {
    let label = state.as_str();
    match state {
        CheckoutState::Succeeded(_) => style(label).green().to_string(),
        CheckoutState::Validating | CheckoutState::Submitting => style(label).yellow().to_string(),
        CheckoutState::Failed(_) => style(label).red().to_string(),
        CheckoutState::Idle => style(label).dim().to_string(),
    }
}

/// Colored label for an order status.
pub fn status_badge(status: OrderStatus) -> String {
    match status {
        OrderStatus::Confirmed => style(status.display_name()).green().to_string(),
        OrderStatus::Pending => style(status.display_name()).yellow().to_string(),
    }
}
