pub mod frame;
pub mod instant;
pub mod step;

pub use frame::{Frame, ERRORS_FIELD};
pub use instant::{parse_date, Instant, IntoTimestamp, TIMESTREAM_DATE_FORMAT};
pub use step::Step;
