pub mod chat;
pub mod notifier;
pub mod posts;

pub use chat::ChatService;
pub use notifier::Notifier;
pub use posts::PostService;
