//! Product catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Money, PriceOptionId, ProductId};

use super::CollaboratorError;

/// Read side of the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Whether the product exists and can currently be purchased.
    async fn is_purchasable(&self, product_id: ProductId) -> Result<bool, CollaboratorError>;

    /// Whether the product sells under multiple price options.
    async fn has_variable_pricing(&self, product_id: ProductId)
        -> Result<bool, CollaboratorError>;

    /// Resolves the price of a product, optionally for one price
    /// option. `None` when the product or option does not exist.
    async fn resolve_price(
        &self,
        product_id: ProductId,
        price_id: Option<PriceOptionId>,
    ) -> Result<Option<Money>, CollaboratorError>;

    /// The cheapest price option of a variable-priced product.
    async fn lowest_price_option(
        &self,
        product_id: ProductId,
    ) -> Result<Option<(Money, PriceOptionId)>, CollaboratorError>;

    /// Display title for the product.
    async fn product_title(&self, product_id: ProductId) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Clone)]
struct ProductEntry {
    title: String,
    purchasable: bool,
    single_price: Option<Money>,
    price_options: HashMap<PriceOptionId, Money>,
}

/// In-memory catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, ProductEntry>>>,
}

impl InMemoryCatalog {
    /// Creates an empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single-priced product.
    pub fn add_product(&self, product_id: ProductId, title: &str, price: Money) {
        self.products.write().unwrap().insert(
            product_id,
            ProductEntry {
                title: title.to_string(),
                purchasable: true,
                single_price: Some(price),
                price_options: HashMap::new(),
            },
        );
    }

    /// Registers a product with variable price options.
    pub fn add_variable_product(
        &self,
        product_id: ProductId,
        title: &str,
        options: Vec<(PriceOptionId, Money)>,
    ) {
        self.products.write().unwrap().insert(
            product_id,
            ProductEntry {
                title: title.to_string(),
                purchasable: true,
                single_price: None,
                price_options: options.into_iter().collect(),
            },
        );
    }

    /// Marks an existing product as not purchasable.
    pub fn set_purchasable(&self, product_id: ProductId, purchasable: bool) {
        if let Some(entry) = self.products.write().unwrap().get_mut(&product_id) {
            entry.purchasable = purchasable;
        }
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn is_purchasable(&self, product_id: ProductId) -> Result<bool, CollaboratorError> {
        let products = self.products.read().unwrap();
        Ok(products.get(&product_id).is_some_and(|entry| entry.purchasable))
    }

    async fn has_variable_pricing(
        &self,
        product_id: ProductId,
    ) -> Result<bool, CollaboratorError> {
        let products = self.products.read().unwrap();
        Ok(products
            .get(&product_id)
            .is_some_and(|entry| !entry.price_options.is_empty()))
    }

    async fn resolve_price(
        &self,
        product_id: ProductId,
        price_id: Option<PriceOptionId>,
    ) -> Result<Option<Money>, CollaboratorError> {
        let products = self.products.read().unwrap();
        let Some(entry) = products.get(&product_id) else {
            return Ok(None);
        };
        Ok(match price_id {
            Some(price_id) => entry.price_options.get(&price_id).copied(),
            None => entry.single_price,
        })
    }

    async fn lowest_price_option(
        &self,
        product_id: ProductId,
    ) -> Result<Option<(Money, PriceOptionId)>, CollaboratorError> {
        let products = self.products.read().unwrap();
        let Some(entry) = products.get(&product_id) else {
            return Ok(None);
        };
        Ok(entry
            .price_options
            .iter()
            .min_by_key(|(id, price)| (**price, **id))
            .map(|(id, price)| (*price, *id)))
    }

    async fn product_title(&self, product_id: ProductId) -> Result<String, CollaboratorError> {
        let products = self.products.read().unwrap();
        products
            .get(&product_id)
            .map(|entry| entry.title.clone())
            .ok_or_else(|| CollaboratorError::Catalog(format!("Unknown product {product_id}")))
    }
}
