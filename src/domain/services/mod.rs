mod app_state;
mod history;
mod identity;
mod synchronizer;

pub use app_state::*;
pub use history::*;
pub use identity::*;
pub use synchronizer::*;
