pub mod message;

pub use message::{ChatMessage, NewMessage};
