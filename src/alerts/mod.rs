pub mod classifier;
pub mod payload;

pub use classifier::classify;
pub use payload::{PushMessage, RefreshAck};
