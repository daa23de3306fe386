pub mod local;
pub mod memory;
pub mod supabase;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::SessionStore;
use crate::domain::models::StoreName;

pub type SharedStore = Arc<dyn SessionStore + Send + Sync>;

pub struct StoreManager {}

impl StoreManager {
    /// Builds the configured store. `access_token` scopes Supabase requests to
    /// the signed in user; other stores ignore it.
    pub fn get(name: StoreName, access_token: Option<String>) -> Result<SharedStore> {
        if name == StoreName::Supabase {
            let url = Config::get(ConfigKey::SupabaseURL);
            let key = Config::get(ConfigKey::SupabaseKey);
            if url.is_empty() || key.is_empty() {
                bail!("The supabase store requires both supabase-url and supabase-key to be set");
            }

            return Ok(Arc::new(supabase::SupabaseStore::new(
                url,
                key,
                access_token,
            )));
        }

        if name == StoreName::Local {
            return Ok(Arc::new(local::LocalStore::default()));
        }

        if name == StoreName::Memory {
            return Ok(Arc::new(memory::MemoryStore::default()));
        }

        bail!(format!("No store implemented for {name}"))
    }
}
