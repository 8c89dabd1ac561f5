use std::fmt;

use depthcast::PipelineError;

// Exit code constants. Both failure kinds are fatal; they differ only so
// callers can tell a device problem from everything else.
pub const SUCCESS: i32 = 0;
pub const DEVICE_FAILURE: i32 = 1;
pub const RUNTIME_FAILURE: i32 = 2;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn pipeline_error(err: PipelineError) -> CliError {
    match err {
        PipelineError::Device(err) => CliError::new(DEVICE_FAILURE, err.to_string()),
        PipelineError::Runtime(err) => {
            CliError::new(RUNTIME_FAILURE, format!("runtime error: {err}"))
        }
    }
}
