pub mod anonymous;
pub mod supabase_auth;

use std::sync::Arc;

use crate::domain::models::IdentityProvider;

pub type SharedIdentityProvider = Arc<dyn IdentityProvider + Send + Sync>;
