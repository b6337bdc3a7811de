/// Request-time marshalling failure.
///
/// Raised straight to the caller of `decode`/`encode`; nothing in the
/// conversion layer retries or swallows these.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported type of {context}: {datum_type}")]
    UnsupportedDatumType { datum_type: String, context: String },

    #[error("cannot convert value of {context} from {from} into {to}")]
    TypeCoercion {
        from: &'static str,
        to: &'static str,
        context: String,
    },

    #[error("cannot parse datetime {text:?}: expected an ISO-8601 UTC timestamp")]
    DatetimeParse { text: String },

    #[error("{binding}: number of bodies ({bodies}) and {field} entries ({metadata}) mismatched")]
    MismatchedBatchLengths {
        binding: &'static str,
        field: String,
        bodies: usize,
        metadata: usize,
    },

    #[error("type {type_name} does not expose a `{method}` function")]
    MissingProtocolMethod {
        type_name: String,
        method: &'static str,
    },

    #[error("missing trigger metadata for the \"{binding}\" binding")]
    MissingTriggerMetadata { binding: &'static str },

    #[error("missing payload for the \"{binding}\" binding")]
    MissingPayload { binding: &'static str },

    #[error("invalid payload for the \"{binding}\" binding: {reason}")]
    InvalidPayload {
        binding: &'static str,
        reason: String,
    },

    #[error("the \"{binding}\" binding cannot encode values of type {native}")]
    UnsupportedNativeType {
        binding: &'static str,
        native: &'static str,
    },

    #[error("the \"{binding}\" binding does not implement {operation}")]
    NotImplemented {
        binding: &'static str,
        operation: &'static str,
    },

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("invalid json in {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConvertError {
    /// Unknown datum type reaching a binding converter.
    pub fn unsupported_for_binding(binding: &'static str, datum_type: impl ToString) -> Self {
        Self::UnsupportedDatumType {
            datum_type: datum_type.to_string(),
            context: format!("data for the \"{binding}\" binding"),
        }
    }

    pub fn invalid(binding: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            binding,
            reason: reason.into(),
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}
