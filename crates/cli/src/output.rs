//! Plain-text rendering of storefront state.

use shopaholic_core::{CatalogIndex, Cart, Product, Totals, User, format_amount};

/// One product per line: id, title, brand, category, price.
#[allow(clippy::print_stdout)]
pub fn products<'a>(products: impl IntoIterator<Item = &'a Product>) {
    let mut count = 0_usize;
    for product in products {
        count += 1;
        let mut badges = String::new();
        if product.new_arrival {
            badges.push_str(" [new]");
        }
        if product.best_seller {
            badges.push_str(" [best seller]");
        }
        println!(
            "{:<26} {:<24} {:<16} {:<14} {:>12}{badges}",
            product.id.as_str(),
            product.display_name(),
            product.brand,
            product.category,
            product.price.to_string(),
        );
    }
    if count == 0 {
        println!("No products match.");
    }
}

/// Full product details.
#[allow(clippy::print_stdout)]
pub fn product(product: &Product) {
    println!("{} ({})", product.display_name(), product.id);
    println!("  Brand:    {}", product.brand);
    println!("  Category: {}", product.category);
    println!("  Price:    {}", product.price);
    if let Some(description) = &product.description {
        println!("  {description}");
    }
    if let Some(image) = product.primary_image() {
        println!("  Image:    {image}");
    }
    for image in product.images.iter().skip(1) {
        println!("            {image}");
    }
}

/// Categories with their brands.
#[allow(clippy::print_stdout)]
pub fn categories(index: &CatalogIndex) {
    if index.is_empty() {
        println!("No categories.");
        return;
    }
    for (category, brands) in index.iter() {
        println!("{category}: {}", brands.join(", "));
    }
}

/// A plain list, one entry per line.
#[allow(clippy::print_stdout)]
pub fn list(heading: &str, entries: &[String]) {
    println!("{heading}:");
    for entry in entries {
        println!("  {entry}");
    }
}

/// Cart lines followed by totals.
#[allow(clippy::print_stdout)]
pub fn cart(cart: &Cart, totals: &Totals) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart {
        println!(
            "{:<26} {:<24} {:>4} x {:>10} = {:>12}",
            line.id().as_str(),
            line.product.display_name(),
            line.quantity,
            line.product.price.to_string(),
            format_amount(line.product.price.times(line.quantity)),
        );
    }
    println!("{} item(s)", cart.item_count());
    println!("{totals}");
}

/// Profile of the logged-in shopper.
#[allow(clippy::print_stdout)]
pub fn user(user: &User) {
    println!("Name:  {}", user.name);
    println!("Email: {}", user.email);
    if let Some(phone) = &user.phone {
        println!("Phone: {phone}");
    }
    if let Some(dob) = user.date_of_birth {
        println!("Born:  {}", dob.format("%-d %B %Y"));
    }
    if let Some(since) = user.member_since() {
        println!("Member since {since}");
    }
}

/// A single status line.
#[allow(clippy::print_stdout)]
pub fn message(text: &str) {
    println!("{text}");
}
