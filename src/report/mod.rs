pub mod recorder;
pub mod tsv;

pub use recorder::ResultRecorder;
