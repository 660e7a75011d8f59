pub mod cycle;
pub mod pipeline;

pub use cycle::Monitor;
