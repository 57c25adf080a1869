use super::model::Product;
use crate::infrastructure::Database;
use nestrs::prelude::*;

#[derive(Injectable)]
pub struct ProductRepository {
    db: Arc<Database>,
}

impl ProductRepository {
    pub fn find_by_id(&self, id: &str) -> Option<Product> {
        self.db
            .get("products", id)
            .and_then(|data| serde_json::from_str(&data).ok())
    }

    pub fn save(&self, product: &Product) -> serde_json::Result<()> {
        let data = serde_json::to_string(product)?;
        self.db.insert("products", &product.id, data);
        Ok(())
    }

    pub fn find_all(&self) -> Vec<Product> {
        self.db
            .scan("products")
            .into_iter()
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect()
    }
}
