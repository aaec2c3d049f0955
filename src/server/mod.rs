pub mod handlers;
pub mod runtime;

pub use runtime::*;

use axum::extract::FromRef;

use crate::auth::AccessComponents;
use crate::health::HealthManager;

/// Shared state handed to every route
#[derive(Clone, FromRef)]
pub struct AppState {
    pub components: AccessComponents,
    pub health: HealthManager,
}
