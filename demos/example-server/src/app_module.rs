use crate::infrastructure::DatabaseModule;
use crate::modules::product::ProductModule;
use crate::modules::user::UserModule;
use nestrs::prelude::*;
use serde_json::json;

/// Root application module
///
/// `ConfigModule` and `DatabaseModule` are global, so feature modules see
/// their exports without importing them.
#[module(
    imports = [
        ConfigModule::for_root(json!({ "products": { "currency": "EUR" } })),
        DatabaseModule,
        UserModule,
        ProductModule,
    ],
)]
pub struct AppModule;
