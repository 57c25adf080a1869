use crate::di::{Container, HasContainer};
use std::sync::Arc;

/// Router state shared by every mounted controller.
#[derive(Clone)]
pub struct AppState {
    container: Arc<Container>,
}

impl AppState {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }
}

impl HasContainer for AppState {
    fn get_container(&self) -> &Container {
        &self.container
    }
}
