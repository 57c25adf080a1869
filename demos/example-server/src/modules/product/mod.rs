use crate::modules::user::UserModule;
use nestrs::prelude::*;

mod controller;
pub mod model;
mod repository;
mod service;

pub use controller::ProductController;
pub use repository::ProductRepository;
pub use service::ProductService;

#[module(
    imports = [UserModule],
    controllers = [ProductController],
    providers = [ProductRepository, ProductService],
)]
pub struct ProductModule;
