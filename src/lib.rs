pub mod core;
pub mod engine;
pub mod error;
pub mod io;
pub mod observability;
pub mod report;
pub mod steps;

pub use crate::core::{Frame, Instant, Step, ERRORS_FIELD};
pub use engine::{Pipeline, Processed};
pub use error::{EngineError, Result};
pub use io::FrameSink;
pub use report::ResultRecorder;
