pub mod http;

use std::sync::Arc;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ResponseGenerator;

pub type SharedGenerator = Arc<dyn ResponseGenerator + Send + Sync>;

pub struct GeneratorManager {}

impl GeneratorManager {
    pub fn get() -> Result<SharedGenerator> {
        let timeout = Config::get(ConfigKey::ChatTimeout).parse::<u64>()?;
        return Ok(Arc::new(http::HttpGenerator::new(
            Config::get(ConfigKey::ChatURL),
            timeout,
        )));
    }
}
