mod generator;
mod identity;
mod message;
mod session;
mod slash_commands;
mod store;

pub use generator::*;
pub use identity::*;
pub use message::*;
pub use session::*;
pub use slash_commands::*;
pub use store::*;
