mod backend;
mod error;
mod event;
mod frame;
mod image;
mod ingredients;
mod message;
mod question;
mod recipe;
mod role;
mod session;
mod slash_commands;

pub use backend::*;
pub use error::*;
pub use event::*;
pub use frame::*;
pub use image::*;
pub use ingredients::*;
pub use message::*;
pub use question::*;
pub use recipe::*;
pub use role::*;
pub use session::*;
pub use slash_commands::*;
