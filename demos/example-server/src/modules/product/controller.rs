use super::model::{CreateProductRequest, Product, ProductFilter};
use super::service::ProductService;
use nestrs::prelude::*;

#[controller(prefix = "/products", tag = "products")]
pub struct ProductController {
    service: Arc<ProductService>,
}

#[routes]
impl ProductController {
    #[post("/")]
    #[http_code(201)]
    pub async fn create(
        &self,
        #[body] req: CreateProductRequest,
    ) -> Result<Json<Product>, (StatusCode, String)> {
        self.service
            .create(req)
            .map(Json)
            .map_err(|e| (StatusCode::BAD_REQUEST, e))
    }

    #[get("/{id}")]
    pub async fn get_one(&self, #[param] id: String) -> Result<Json<Product>, StatusCode> {
        self.service.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    #[get("/")]
    pub async fn list(&self, #[query] filter: ProductFilter) -> Json<Vec<Product>> {
        Json(self.service.list(&filter))
    }
}
