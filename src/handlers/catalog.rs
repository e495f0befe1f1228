use garde::Validate;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::models::product::Product;
use crate::services::catalog::CatalogTable;
use crate::services::payments::{PaymentError, StripeClient};

/// Currency of every seeded price.
const SEED_CURRENCY: &str = "usd";

/// Validate a batch of products and write it to the catalog.
///
/// Returns `false` without writing anything when any item is invalid, and
/// `false` when the write fails.
pub async fn upload_products(table: &dyn CatalogTable, items: Vec<Value>) -> bool {
    info!(count = items.len(), "Uploading products");

    let mut products = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let product: Product = match serde_json::from_value(item) {
            Ok(product) => product,
            Err(e) => {
                error!(index, error = %e, "Product failed to parse");
                return false;
            }
        };
        if let Err(report) = product.validate() {
            error!(index, product_id = %product.product_id, error = %report, "Product failed validation");
            return false;
        }
        products.push(product);
    }

    match table.put_products(&products).await {
        Ok(written) => {
            info!(written, "Products uploaded successfully");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to write products");
            false
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub failed: Vec<String>,
}

impl SeedReport {
    pub fn message(&self) -> &'static str {
        if self.failed.is_empty() {
            "Product Created"
        } else {
            "Failed to create Product"
        }
    }
}

/// Create a Stripe product and price for every catalog product. Errors are
/// logged per product and do not stop the loop.
pub async fn seed_stripe_products(stripe: &StripeClient, products: &[Product]) -> SeedReport {
    let mut report = SeedReport::default();

    for product in products {
        match seed_one(stripe, product).await {
            Ok(()) => report.created.push(product.name.clone()),
            Err(e) => {
                error!(name = %product.name, error = %e, "Error creating product or price");
                report.failed.push(product.name.clone());
            }
        }
    }

    report
}

async fn seed_one(
    stripe: &StripeClient,
    product: &Product,
) -> Result<(), PaymentError> {
    let created = stripe.create_product(product).await?;
    info!(name = %created.name, id = %created.id, "Product created");

    let price = stripe
        .create_price(&created.id, product.price, SEED_CURRENCY)
        .await?;
    info!(
        id = %price.id,
        amount = price.unit_amount.unwrap_or_default(),
        currency = %price.currency,
        "Price created"
    );
    Ok(())
}

/// Look up a product by name and create a payment link for `quantity` units.
/// Always answers with a message suitable for the end user.
pub async fn payment_link(stripe: &StripeClient, product_name: &str, quantity: u32) -> String {
    info!(product_name, quantity, "Creating payment link");

    let product = match stripe.find_product_by_name(product_name).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            error!(product_name, "No product found");
            return format!("No product found with name: {product_name}");
        }
        Err(e) => {
            error!(error = %e, "Product lookup failed");
            return format!("Failed to create payment link: {e}");
        }
    };
    info!(product_id = %product.id, "Product found");

    let price = match stripe.first_price(&product.id).await {
        Ok(Some(price)) => price,
        Ok(None) => {
            error!(product_id = %product.id, "No price found");
            return format!("No price found for product ID: {}", product.id);
        }
        Err(e) => {
            error!(error = %e, "Price lookup failed");
            return format!("Failed to create payment link: {e}");
        }
    };

    match stripe.create_payment_link(&price.id, quantity).await {
        Ok(link) => {
            info!(url = %link.url, "Payment link created");
            format!("Payment Link URL: {}", link.url)
        }
        Err(e) => {
            error!(error = %e, "Payment link creation failed");
            format!("Failed to create payment link: {e}")
        }
    }
}
