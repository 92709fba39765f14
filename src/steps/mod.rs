pub mod copy;
pub mod file_stats;
pub mod result_recorder;
pub mod write_file;

pub use copy::CopyStep;
pub use file_stats::FileStatsStep;
pub use result_recorder::{ResultRecorderConfig, ResultRecorderStep};
pub use write_file::{WriteFileConfig, WriteFileStep};
