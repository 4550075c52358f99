use crate::models::*;
use image::RgbaImage;

// ---------------------------------------------------------------------------
// Automation Engine Trait
// ---------------------------------------------------------------------------

/// Errors raised by an automation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Engine has no operation named '{0}'")]
    UnknownOperation(String),
    #[error("Bad arguments for {operation}: {message}")]
    BadArguments { operation: String, message: String },
    #[error("Engine error: {0}")]
    Other(String),
}

impl EngineError {
    pub fn bad_arguments(operation: &str, message: impl Into<String>) -> Self {
        EngineError::BadArguments {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

/// An external GUI-automation engine exposing a set of named operations.
///
/// Operations report success through their return value; some additionally
/// set the shared [`AutomationEngine::error`] indicator, which callers must
/// read immediately after the call it refers to.
pub trait AutomationEngine {
    /// Every operation name the engine exposes, including private ones.
    fn operations(&self) -> Vec<String>;

    /// Invoke an operation by name.
    fn invoke(&mut self, name: &str, args: &[Value], kwargs: &[(String, Value)])
        -> Result<Value, EngineError>;

    /// Invoke an operation with positional arguments only.
    fn call(&mut self, name: &str, args: &[Value]) -> Result<Value, EngineError> {
        self.invoke(name, args, &[])
    }

    /// The last-error indicator set by the most recent operation (0 = none).
    fn error(&self) -> i64;

    /// Human-readable engine version.
    fn version(&self) -> String;
}

impl<E: AutomationEngine + ?Sized> AutomationEngine for Box<E> {
    fn operations(&self) -> Vec<String> {
        (**self).operations()
    }

    fn invoke(
        &mut self,
        name: &str,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value, EngineError> {
        (**self).invoke(name, args, kwargs)
    }

    fn error(&self) -> i64 {
        (**self).error()
    }

    fn version(&self) -> String {
        (**self).version()
    }
}

// ---------------------------------------------------------------------------
// Screen Capture Trait
// ---------------------------------------------------------------------------

/// Errors from acquiring or persisting a screen image.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No display available: {0}")]
    NoDisplay(String),
    #[error("Capture failed: {0}")]
    Grab(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces in-memory screen images.
pub trait ScreenCapture {
    /// Grab `region`, or the whole primary display when `None`.
    fn grab(&mut self, region: Option<Region>) -> Result<RgbaImage, CaptureError>;
}

impl<C: ScreenCapture + ?Sized> ScreenCapture for Box<C> {
    fn grab(&mut self, region: Option<Region>) -> Result<RgbaImage, CaptureError> {
        (**self).grab(region)
    }
}

// ---------------------------------------------------------------------------
// Keyword Errors
// ---------------------------------------------------------------------------

/// The single error model surfaced to keyword callers.
#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    #[error("No keyword with name '{0}' found")]
    UnknownOperation(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    OperationFailed(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeywordError {
    pub fn invalid(message: impl Into<String>) -> Self {
        KeywordError::InvalidArgument(message.into())
    }
}
