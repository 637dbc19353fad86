// app/src/state.rs
use crate::config::AppConfig;
use mealbox::OrderLifecycleManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub manager: OrderLifecycleManager,
  pub config: Arc<AppConfig>, // Share loaded config
}
