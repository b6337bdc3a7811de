use hostbind_api::ConvertError;

/// Configuration-time and dispatch failures of the engine.
///
/// Per-payload conversion failures arrive wrapped as `Convert`/`Marshal`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("binding '{binding}' registered twice: by {existing} and by {incoming}")]
    DuplicateBinding {
        binding: String,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("function '{function}' already has trigger '{existing}', cannot add trigger '{incoming}'")]
    MultipleTriggers {
        function: String,
        existing: String,
        incoming: String,
    },

    #[error("function '{0}' does not have a trigger")]
    MissingTrigger(String),

    #[error("binding type not registered: {0}")]
    UnknownBinding(String),

    #[error("binding '{binding}' ({binding_type}) does not accept {direction} type {declared}")]
    TypeMismatch {
        binding: String,
        binding_type: String,
        direction: &'static str,
        declared: String,
    },

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("{context}: {source}")]
    Marshal {
        context: String,
        #[source]
        source: ConvertError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// Conversion errors become `Marshal` carrying the context; message-only
    /// variants get it prepended. Structured variants are returned unchanged.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::UnknownBinding(msg) => EngineError::UnknownBinding(format!("{ctx}: {msg}")),
            EngineError::Convert(source) => EngineError::Marshal {
                context: ctx.to_string(),
                source,
            },
            EngineError::Marshal { context, source } => EngineError::Marshal {
                context: format!("{ctx}: {context}"),
                source,
            },
            other => other,
        }
    }

    /// The underlying conversion failure, if any.
    pub fn convert_error(&self) -> Option<&ConvertError> {
        match self {
            EngineError::Convert(e) | EngineError::Marshal { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
