//! Process exit codes, one per error class.

use corrnet_rs::CorrNetError;

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 2;
pub const EXECUTION_ERROR: i32 = 3;
pub const STORAGE_ERROR: i32 = 4;

/// Map an engine error to its exit code.
pub fn for_error(error: &CorrNetError) -> i32 {
    match error {
        CorrNetError::MalformedSample { .. }
        | CorrNetError::DimensionMismatch { .. }
        | CorrNetError::InvalidParameter(_)
        | CorrNetError::IoError(_) => INPUT_ERROR,
        CorrNetError::Store(_) => STORAGE_ERROR,
        CorrNetError::RowOverflow { .. } | CorrNetError::PipelineClosed => EXECUTION_ERROR,
    }
}
