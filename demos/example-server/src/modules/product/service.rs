use super::model::{CreateProductRequest, Product, ProductFilter};
use super::repository::ProductRepository;
use crate::modules::user::UserService;
use nestrs::prelude::*;
use uuid::Uuid;

#[derive(Injectable)]
pub struct ProductService {
    repository: Arc<ProductRepository>,
    users: Arc<UserService>,
    config: Arc<ConfigService>,
}

impl ProductService {
    pub fn create(&self, req: CreateProductRequest) -> Result<Product, String> {
        if !self.users.exists(&req.owner_id) {
            return Err(format!("unknown owner {}", req.owner_id));
        }
        let product = Product {
            id: Uuid::new_v4().to_string(),
            owner_id: req.owner_id,
            name: req.name,
            price: req.price,
            currency: self.config.get_or("products.currency", "USD"),
        };
        self.repository.save(&product).map_err(|e| e.to_string())?;
        Ok(product)
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.repository.find_by_id(id)
    }

    pub fn list(&self, filter: &ProductFilter) -> Vec<Product> {
        self.repository
            .find_all()
            .into_iter()
            .filter(|p| filter.owner_id.as_ref().is_none_or(|owner| *owner == p.owner_id))
            .filter(|p| filter.max_price.is_none_or(|max| p.price <= max))
            .collect()
    }
}
