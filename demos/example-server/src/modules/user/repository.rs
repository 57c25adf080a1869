use super::model::User;
use crate::infrastructure::Database;
use nestrs::prelude::*;

const TABLE: &str = "users";

#[derive(Injectable)]
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn find_by_id(&self, id: &str) -> Option<User> {
        self.db
            .get(TABLE, id)
            .and_then(|data| serde_json::from_str(&data).ok())
    }

    pub fn save(&self, user: &User) -> serde_json::Result<()> {
        let data = serde_json::to_string(user)?;
        self.db.insert(TABLE, &user.id, data);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> bool {
        self.db.remove(TABLE, id).is_some()
    }

    pub fn find_all(&self) -> Vec<User> {
        self.db
            .scan(TABLE)
            .into_iter()
            .filter_map(|json| serde_json::from_str(&json).ok())
            .collect()
    }
}
