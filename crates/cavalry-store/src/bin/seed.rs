//! # Seed Cart Generator
//!
//! Writes a demo cart into a file-backed slot for development.
//!
//! ## Usage
//! ```bash
//! # Seed 6 line items into ./cart-data/cav-cart-v1.json
//! cargo run -p cavalry-store --bin seed -- --dir ./cart-data
//!
//! # Custom slot and size
//! cargo run -p cavalry-store --bin seed -- --dir ./cart-data --slot cav-cart-v1 --items 20
//! ```
//!
//! Products cycle through a small catalog; apparel gets a Color/Size
//! variant, so the same product shows up as several line items.

use std::env;
use std::sync::Arc;

use cavalry_core::{validation::validate_slot_name, Variant, DEFAULT_CART_SLOT};
use cavalry_store::{init_tracing, CartStore, FileStorage};

/// Demo products: (id, has variants)
const PRODUCTS: &[(&str, bool)] = &[
    ("classic-tee", true),
    ("hoodie", true),
    ("enamel-mug", false),
    ("sticker-pack", false),
    ("snapback", true),
];

const COLORS: &[&str] = &["Black", "Red", "Sand"];
const SIZES: &[&str] = &["S", "M", "L", "XL"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut dir: Option<String> = None;
    let mut slot = String::from(DEFAULT_CART_SLOT);
    let mut items: usize = 6;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--dir" | "-d" => {
                if i + 1 < args.len() {
                    dir = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--slot" | "-s" => {
                if i + 1 < args.len() {
                    slot = args[i + 1].clone();
                    i += 1;
                }
            }
            "--items" | "-n" => {
                if i + 1 < args.len() {
                    items = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let Some(dir) = dir else {
        print_help();
        return Err("--dir is required".into());
    };
    validate_slot_name(&slot)?;

    println!("Cavalry Cart Seeder");
    println!("===================");
    println!("Directory: {}", dir);
    println!("Slot:      {}", slot);
    println!("Items:     {}", items);
    println!();

    let storage = FileStorage::open(&dir)?;
    let store = CartStore::with_slot(Arc::new(storage), slot);

    let existing = store.read();
    if !existing.is_empty() {
        println!("Slot already holds {} line items", existing.item_count());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the slot file to regenerate.");
        return Ok(());
    }

    for n in 0..items {
        let (id, has_variants) = PRODUCTS[n % PRODUCTS.len()];
        let variant = has_variants.then(|| demo_variant(n));
        let qty = 1 + (n % 3) as u32;

        store.add(id, qty, variant)?;
    }

    let cart = store.read();
    println!(
        "Wrote {} line items ({} units)",
        cart.item_count(),
        cart.total_quantity()
    );
    for item in &cart.items {
        println!("  {:<40} x{}", item.key, item.qty);
    }

    Ok(())
}

fn demo_variant(seed: usize) -> Variant {
    Variant::new()
        .with("Color", COLORS[seed % COLORS.len()])
        .with("Size", SIZES[(seed / PRODUCTS.len()) % SIZES.len()])
}

fn print_help() {
    println!("Cavalry Cart Seeder");
    println!();
    println!("Usage: seed --dir <DIR> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --dir <DIR>      Data directory for the file-backed slot (required)");
    println!("  -s, --slot <NAME>    Slot name (default: {})", DEFAULT_CART_SLOT);
    println!("  -n, --items <N>      Number of add operations (default: 6)");
    println!("  -h, --help           Show this help message");
}
