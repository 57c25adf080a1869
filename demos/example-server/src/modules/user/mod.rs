use nestrs::prelude::*;

mod controller;
pub mod model;
mod repository;
mod service;

pub use controller::UserController;
pub use repository::UserRepository;
pub use service::UserService;

#[module(
    controllers = [UserController],
    providers = [UserRepository, UserService],
    exports = [UserService],
)]
pub struct UserModule;
