use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub owner_id: String,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub owner_id: Option<String>,
    pub max_price: Option<f64>,
}
