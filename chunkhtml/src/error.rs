use thiserror::Error;

/// Result type alias for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while rendering a tree of nodes.
///
/// Output is written best-effort: by the time one of these is returned, some bytes may already
/// have reached the sink.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The sink could not accept bytes.
    #[error("failed to write to sink: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON node could not be serialized.
    #[error("failed to serialize JSON node: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendered output was not valid UTF-8.
    #[error("rendered output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// An item that is not a node was passed to a render entry point.
    #[error("cannot render item of type `{type_name}`: not a node")]
    InvalidItem {
        /// The name of the offending item's type.
        type_name: &'static str,
    },

    /// A deferred property did not provide a way to render itself.
    #[error("deferred property `{type_name}` does not implement DeferredProperty")]
    MissingDeferred {
        /// The name of the offending property's type.
        type_name: &'static str,
    },

    /// The context was cancelled.
    #[error("render context was cancelled")]
    Cancelled,

    /// A component or deferred property failed with its own error.
    #[error("component failed: {0}")]
    Component(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A component or deferred property failed with a message.
    #[error("{0}")]
    Message(String),
}

impl RenderError {
    /// Wrap an arbitrary error raised by user code.
    pub fn component(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        RenderError::Component(Box::new(err))
    }

    /// Create an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        RenderError::Message(message.into())
    }
}
