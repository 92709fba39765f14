pub mod builder;
pub mod driver;
pub mod pipeline;

pub use driver::Processed;
pub use pipeline::Pipeline;
