use crate::core::Step;

/// Passes frames through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStep;

impl Step for CopyStep {}
