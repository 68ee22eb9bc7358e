//! Shopper-facing operations over the loaded catalog and trained artifacts.
//!
//! A [`Storefront`] is built once at startup and is read-only afterwards.
//! Each shopper gets a [`ShopperSession`] that owns its cart and picker.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::domain::cart::{Cart, CartLine};
use crate::domain::product::Product;
use crate::errors::{ApplicationError, DomainError};
use crate::ml::{Artifacts, RecommendationModel};
use crate::suggestions::{Picker, Resolution, SuggestionEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub struct Storefront<M = Artifacts> {
    catalog: Catalog,
    model: M,
}

impl Storefront<Artifacts> {
    /// Loads the catalog and the three artifacts named by `config`. Any
    /// failure aborts startup.
    pub fn open(config: &AppConfig) -> Result<Self, ApplicationError> {
        let catalog = Catalog::load(&config.catalog.path, config.catalog.options())?;
        let artifacts = Artifacts::load(&config.artifacts.paths())?;

        let storefront = Self::new(catalog, artifacts);
        info!(
            event_name = "storefront.opened",
            products = storefront.catalog.len(),
            uncovered = storefront.uncovered_products().len(),
            "storefront ready"
        );
        Ok(storefront)
    }
}

impl<M: RecommendationModel> Storefront<M> {
    pub fn new(catalog: Catalog, model: M) -> Self {
        Self { catalog, model }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn list_products(&self, filter: Option<&str>) -> Vec<&Product> {
        self.catalog.search(filter)
    }

    /// Catalog products the model has never seen; these always echo.
    pub fn uncovered_products(&self) -> Vec<&str> {
        self.catalog
            .products()
            .iter()
            .filter(|product| self.model.encode(&product.name).is_err())
            .map(|product| product.name.as_str())
            .collect()
    }

    pub fn resolve<P: Picker + ?Sized>(
        &self,
        product_name: &str,
        picker: &mut P,
    ) -> Result<Resolution, DomainError> {
        SuggestionEngine::new(&self.catalog, &self.model).resolve(product_name, picker)
    }

    pub fn session<P: Picker>(&self, picker: P) -> ShopperSession<'_, M, P> {
        ShopperSession::new(self, picker)
    }
}

/// One shopper's cart plus the picker used for their recommendations.
pub struct ShopperSession<'a, M, P> {
    id: SessionId,
    storefront: &'a Storefront<M>,
    cart: Cart,
    picker: P,
}

impl<'a, M: RecommendationModel, P: Picker> ShopperSession<'a, M, P> {
    pub fn new(storefront: &'a Storefront<M>, picker: P) -> Self {
        Self { id: SessionId::new(), storefront, cart: Cart::new(), picker }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Appends a catalog product to the cart. Names outside the catalog are
    /// refused so the cart always prices cleanly.
    pub fn add_to_cart(&mut self, name: &str) -> Result<(), DomainError> {
        if !self.storefront.catalog.contains(name) {
            let violation = DomainError::InvariantViolation(format!(
                "cannot add `{name}` to the cart: not in the catalog"
            ));
            error!(
                event_name = "cart.item_rejected",
                session_id = %self.id,
                product = name,
                "{violation}"
            );
            return Err(violation);
        }

        self.cart.append(name);
        info!(
            event_name = "cart.item_added",
            session_id = %self.id,
            product = name,
            items = self.cart.len(),
            "added product to cart"
        );
        Ok(())
    }

    pub fn clear_cart(&mut self) {
        let removed = self.cart.len();
        self.cart.clear();
        info!(event_name = "cart.cleared", session_id = %self.id, removed, "cleared cart");
    }

    pub fn list_products(&self, filter: Option<&str>) -> Vec<&'a Product> {
        self.storefront.list_products(filter)
    }

    pub fn cart_contents(&self) -> Result<Vec<CartLine>, DomainError> {
        self.cart.lines(&self.storefront.catalog)
    }

    pub fn cart_total(&self) -> Result<u64, DomainError> {
        self.cart.total(&self.storefront.catalog)
    }

    /// Recommendation for the most recently added item; `None` only when the
    /// cart is empty.
    pub fn recommend_for_last_cart_item(&mut self) -> Result<Option<String>, DomainError> {
        Ok(self.resolve_for_last_cart_item()?.map(|resolution| resolution.product))
    }

    pub fn resolve_for_last_cart_item(&mut self) -> Result<Option<Resolution>, DomainError> {
        let Some(last) = self.cart.last_item() else {
            return Ok(None);
        };

        let resolution = self.storefront.resolve(last, &mut self.picker)?;
        info!(
            event_name = "recommendation.resolved",
            session_id = %self.id,
            product = last,
            recommended = resolution.product.as_str(),
            echo = resolution.is_echo(),
            "resolved recommendation for last cart item"
        );
        Ok(Some(resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::Storefront;
    use crate::catalog::Catalog;
    use crate::domain::product::Product;
    use crate::errors::DomainError;
    use crate::ml::{train, Artifacts, TrainingOptions};
    use crate::suggestions::{FirstPicker, RandomPicker, ResolutionStrategy};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new("Ceramic Mug", 40, "mug.png"),
            Product::new("Bamboo Spoon", 12, "spoon.png"),
            Product::new("Tea Kettle", 120, "kettle.png"),
            Product::new("Cast Iron Pan", 140, "pan.png"),
            Product::new("Espresso Machine", 890, "espresso.png"),
        ])
        .expect("fixture catalog")
    }

    fn storefront() -> Storefront<Artifacts> {
        let catalog = catalog();
        let trained = train(&catalog, TrainingOptions::default()).expect("trains");
        Storefront::new(catalog, trained.artifacts)
    }

    #[test]
    fn empty_cart_has_no_recommendation_and_zero_total() {
        let storefront = storefront();
        let mut session = storefront.session(FirstPicker);

        assert_eq!(session.recommend_for_last_cart_item(), Ok(None));
        assert_eq!(session.cart_total(), Ok(0));
        assert!(session.cart_contents().expect("contents").is_empty());
    }

    #[test]
    fn cart_keeps_order_duplicates_and_prices() {
        let storefront = storefront();
        let mut session = storefront.session(FirstPicker);

        session.add_to_cart("Tea Kettle").expect("add");
        session.add_to_cart("Ceramic Mug").expect("add");
        session.add_to_cart("Tea Kettle").expect("add");

        let lines = session.cart_contents().expect("contents");
        let names: Vec<&str> = lines.iter().map(|line| line.name.as_str()).collect();
        assert_eq!(names, ["Tea Kettle", "Ceramic Mug", "Tea Kettle"]);
        assert_eq!(session.cart_total(), Ok(280));

        session.clear_cart();
        assert!(session.cart().is_empty());
        assert_eq!(session.cart_total(), Ok(0));
    }

    #[test]
    fn unknown_names_are_refused() {
        let storefront = storefront();
        let mut session = storefront.session(FirstPicker);

        let error = session.add_to_cart("Laptop").expect_err("not in catalog");
        assert!(matches!(error, DomainError::InvariantViolation(_)));
        assert!(session.cart().is_empty());
    }

    #[test]
    fn recommendation_follows_the_last_item_and_stays_in_its_bucket() {
        let storefront = storefront();
        let mut session = storefront.session(RandomPicker::seeded(3));

        session.add_to_cart("Espresso Machine").expect("add");
        session.add_to_cart("Bamboo Spoon").expect("add");

        let resolution =
            session.resolve_for_last_cart_item().expect("resolves").expect("cart not empty");
        assert_eq!(resolution.product, "Ceramic Mug");
        assert!(matches!(resolution.strategy, ResolutionStrategy::SameBucket { candidates: 1, .. }));
    }

    #[test]
    fn listing_filters_case_insensitively() {
        let storefront = storefront();
        let session = storefront.session(FirstPicker);

        let names: Vec<&str> =
            session.list_products(Some("AM")).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ceramic Mug", "Bamboo Spoon"]);
        assert_eq!(session.list_products(Some("")).len(), 5);
        assert_eq!(session.list_products(None).len(), 5);
    }

    #[test]
    fn trained_model_covers_the_whole_catalog() {
        assert!(storefront().uncovered_products().is_empty());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let storefront = storefront();
        let first = storefront.session(FirstPicker);
        let second = storefront.session(FirstPicker);
        assert_ne!(first.id(), second.id());
    }
}
