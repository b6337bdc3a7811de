use crate::datum::{Datum, TriggerMetadata};
use crate::error::ConvertError;
use crate::native::{Native, NativeType};

/// Binding converter: translates between host datums and native values for
/// one binding kind.
///
/// Input-only converters keep the default `encode`; output-only converters
/// keep the default `decode`. Both defaults fail with `NotImplemented`.
pub trait Converter: Send + Sync {
    /// Binding kind this converter is registered under.
    fn binding(&self) -> &'static str;

    /// Trigger name, when the converter can drive an invocation.
    ///
    /// Registered as an alias of [`Converter::binding`] when the two differ.
    fn trigger(&self) -> Option<&'static str> {
        None
    }

    fn has_trigger_support(&self) -> bool {
        self.trigger().is_some()
    }

    /// The function's return value is this binding's output.
    fn has_implicit_output(&self) -> bool {
        false
    }

    fn check_input_type(&self, _ty: &NativeType) -> bool {
        false
    }

    fn check_output_type(&self, _ty: &NativeType) -> bool {
        false
    }

    fn decode(
        &self,
        _datum: Option<&Datum>,
        _metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, ConvertError> {
        Err(ConvertError::NotImplemented {
            binding: self.binding(),
            operation: "decode",
        })
    }

    fn encode(&self, _value: Native, _expected: Option<&NativeType>) -> Result<Datum, ConvertError> {
        Err(ConvertError::NotImplemented {
            binding: self.binding(),
            operation: "encode",
        })
    }
}
