//! Cart invariants over arbitrary mutation sequences.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use natcon_commerce::prelude::*;
use proptest::prelude::*;

const PRODUCTS: [&str; 4] = ["tshirt", "mug", "ticket", "lanyard"];
const VARIANTS: [&str; 2] = ["", "M"];

#[derive(Debug, Clone)]
enum Op {
    Add {
        product: usize,
        variant: usize,
        quantity: i64,
        unit_price: i64,
    },
    Update {
        product: usize,
        variant: usize,
        quantity: i64,
    },
    Remove {
        product: usize,
        variant: usize,
    },
    Clear,
}

fn key(product: usize, variant: usize) -> LineItemKey {
    LineItemKey::new(PRODUCTS[product], VARIANTS[variant])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..PRODUCTS.len(), 0..VARIANTS.len(), -2_i64..25, -10_i64..5000).prop_map(
            |(product, variant, quantity, unit_price)| Op::Add {
                product,
                variant,
                quantity,
                unit_price,
            }
        ),
        3 => (0..PRODUCTS.len(), 0..VARIANTS.len(), -3_i64..25).prop_map(
            |(product, variant, quantity)| Op::Update {
                product,
                variant,
                quantity,
            }
        ),
        2 => (0..PRODUCTS.len(), 0..VARIANTS.len())
            .prop_map(|(product, variant)| Op::Remove { product, variant }),
        1 => Just(Op::Clear),
    ]
}

/// Line state the cart should hold: key, quantity, unit price.
type Model = Vec<(LineItemKey, i64, i64)>;

/// Apply `op` to the model; returns whether the cart should count it as a
/// mutation.
fn apply(model: &mut Model, op: &Op) -> bool {
    match *op {
        Op::Add {
            product,
            variant,
            quantity,
            unit_price,
        } => {
            if quantity < 1 || unit_price < 0 {
                return false;
            }
            let key = key(product, variant);
            match model.iter_mut().find(|(k, _, _)| *k == key) {
                Some(line) => line.1 += quantity,
                None => model.push((key, quantity, unit_price)),
            }
            true
        }
        Op::Update {
            product,
            variant,
            quantity,
        } => {
            let key = key(product, variant);
            let Some(index) = model.iter().position(|(k, _, _)| *k == key) else {
                return false;
            };
            if quantity <= 0 {
                model.remove(index);
            } else {
                model[index].1 = quantity;
            }
            true
        }
        Op::Remove { product, variant } => {
            let key = key(product, variant);
            let before = model.len();
            model.retain(|(k, _, _)| *k != key);
            model.len() < before
        }
        Op::Clear => {
            model.clear();
            true
        }
    }
}

fn run(cart: &CartStore, op: &Op) {
    match *op {
        Op::Add {
            product,
            variant,
            quantity,
            unit_price,
        } => {
            let name = PRODUCTS[product];
            let _ = cart.add_item(name, VARIANTS[variant], quantity, unit_price, name);
        }
        Op::Update {
            product,
            variant,
            quantity,
        } => {
            let _ = cart.update_quantity(&key(product, variant), quantity);
        }
        Op::Remove { product, variant } => {
            cart.remove_item(&key(product, variant));
        }
        Op::Clear => cart.clear(),
    }
}

proptest! {
    #[test]
    fn test_cart_invariants_hold_after_every_mutation(ops in prop::collection::vec(op(), 1..64)) {
        let cart = CartStore::in_memory(Cart::new(Currency::USD));
        let notified = Rc::new(Cell::new(0_u64));
        let seen = notified.clone();
        let _subscription = cart.subscribe(move |_| seen.set(seen.get() + 1));

        let mut model = Model::new();
        let mut mutations = 0_u64;

        for op in &ops {
            run(&cart, op);
            if apply(&mut model, op) {
                mutations += 1;
            }

            let snapshot = cart.snapshot();

            let keys: HashSet<_> = snapshot.items.iter().map(|i| i.key.clone()).collect();
            prop_assert_eq!(keys.len(), snapshot.items.len());
            prop_assert!(snapshot.items.iter().all(|i| i.quantity >= 1));

            let subtotal: i64 = snapshot
                .items
                .iter()
                .map(|i| i.unit_price.amount_minor * i.quantity)
                .sum();
            prop_assert_eq!(snapshot.subtotal.amount_minor, subtotal);
            let count: i64 = snapshot.items.iter().map(|i| i.quantity).sum();
            prop_assert_eq!(snapshot.item_count, count);

            let lines: Model = snapshot
                .items
                .iter()
                .map(|i| (i.key.clone(), i.quantity, i.unit_price.amount_minor))
                .collect();
            prop_assert_eq!(&lines, &model);

            prop_assert_eq!(snapshot.revision, mutations);
            prop_assert_eq!(notified.get(), mutations);
        }
    }
}
