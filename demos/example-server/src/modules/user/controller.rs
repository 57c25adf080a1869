use super::model::{CreateUserRequest, User};
use super::service::UserService;
use nestrs::prelude::*;

#[controller(prefix = "/users", tag = "users")]
pub struct UserController {
    service: Arc<UserService>,
}

#[routes]
impl UserController {
    #[post("/")]
    #[http_code(201)]
    pub async fn create(
        &self,
        #[body] req: CreateUserRequest,
    ) -> Result<Json<User>, (StatusCode, String)> {
        self.service
            .create(req)
            .map(Json)
            .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))
    }

    #[get("/{id}")]
    pub async fn get_one(&self, #[param] id: String) -> Result<Json<User>, StatusCode> {
        self.service.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    #[get("/")]
    pub async fn list(&self) -> Json<Vec<User>> {
        Json(self.service.list())
    }

    #[delete("/{id}")]
    pub fn remove(&self, #[param] id: String) -> StatusCode {
        if self.service.remove(&id) {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }
}
