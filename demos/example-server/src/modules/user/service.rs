use super::model::{CreateUserRequest, User};
use super::repository::UserRepository;
use nestrs::prelude::*;
use uuid::Uuid;

#[derive(Injectable)]
pub struct UserService {
    repository: Arc<UserRepository>,
}

impl UserService {
    pub fn create(&self, req: CreateUserRequest) -> Result<User, String> {
        if !req.email.contains('@') {
            return Err(format!("invalid email: {}", req.email));
        }
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            email: req.email,
        };
        self.repository.save(&user).map_err(|e| e.to_string())?;
        tracing::debug!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.repository.find_by_id(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.repository.find_by_id(id).is_some()
    }

    pub fn list(&self) -> Vec<User> {
        self.repository.find_all()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.repository.delete(id)
    }
}
