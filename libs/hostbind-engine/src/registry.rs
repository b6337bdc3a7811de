use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hostbind_api::{Converter, Datum, Native, NativeType, TriggerMetadata};

use crate::error::EngineError;

/// One converter plus the Rust type that registered it.
#[derive(Clone)]
struct Registrant {
    converter: Arc<dyn Converter>,
    type_name: &'static str,
}

/// Binding kind → converter lookup, built once and read-only afterwards.
///
/// A converter whose trigger name differs from its binding kind is reachable
/// under both names.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    entries: HashMap<&'static str, Registrant>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Collects converters, failing on the first binding kind claimed twice.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<&'static str, Registrant>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("registered", &self.entries.len())
            .finish()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `converter` under its binding kind and, if different, its trigger name.
    pub fn register<C: Converter + 'static>(mut self, converter: C) -> Result<Self, EngineError> {
        let registrant = Registrant {
            converter: Arc::new(converter),
            type_name: std::any::type_name::<C>(),
        };
        let binding = registrant.converter.binding();
        self.insert(binding, registrant.clone())?;
        if let Some(trigger) = registrant.converter.trigger().filter(|t| *t != binding) {
            self.insert(trigger, registrant)?;
        }
        Ok(self)
    }

    fn insert(&mut self, kind: &'static str, registrant: Registrant) -> Result<(), EngineError> {
        if let Some(existing) = self.entries.get(kind) {
            return Err(EngineError::DuplicateBinding {
                binding: kind.to_string(),
                existing: existing.type_name,
                incoming: registrant.type_name,
            });
        }
        self.entries.insert(kind, registrant);
        Ok(())
    }

    pub fn build(self) -> ConverterRegistry {
        let registry = ConverterRegistry {
            entries: self.entries,
        };
        tracing::info!(kinds = registry.len(), "converter registry built");
        registry
    }
}

impl ConverterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Converter for `kind`, or `None` when the kind is unknown.
    pub fn get(&self, kind: &str) -> Option<&dyn Converter> {
        self.entries.get(kind).map(|r| r.converter.as_ref())
    }

    /// Like [`ConverterRegistry::get`], but an unknown kind is an error.
    pub fn converter(&self, kind: &str) -> Result<&dyn Converter, EngineError> {
        self.get(kind)
            .ok_or_else(|| EngineError::UnknownBinding(kind.to_string()))
    }

    /// Name of the Rust type registered for `kind`.
    pub fn registrant(&self, kind: &str) -> Option<&'static str> {
        self.entries.get(kind).map(|r| r.type_name)
    }

    pub fn has_trigger_support(&self, kind: &str) -> bool {
        self.get(kind).is_some_and(|c| c.has_trigger_support())
    }

    /// `kind` names the trigger side of its converter.
    pub fn is_trigger(&self, kind: &str) -> bool {
        self.get(kind).and_then(|c| c.trigger()) == Some(kind)
    }

    pub fn has_implicit_output(&self, kind: &str) -> bool {
        self.get(kind).is_some_and(|c| c.has_implicit_output())
    }

    pub fn check_input_type(&self, kind: &str, ty: &NativeType) -> Result<bool, EngineError> {
        Ok(self.converter(kind)?.check_input_type(ty))
    }

    pub fn check_output_type(&self, kind: &str, ty: &NativeType) -> Result<bool, EngineError> {
        Ok(self.converter(kind)?.check_output_type(ty))
    }

    pub fn decode(
        &self,
        kind: &str,
        datum: Option<&Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<Option<Native>, EngineError> {
        let converter = self.converter(kind)?;
        tracing::debug!(
            binding = %kind,
            datum_type = datum.map(|d| d.datum_type().as_str()).unwrap_or("none"),
            metadata_fields = metadata.map_or(0, |m| m.len()),
            "decode"
        );
        Ok(converter.decode(datum, metadata)?)
    }

    pub fn encode(
        &self,
        kind: &str,
        value: Native,
        expected: Option<&NativeType>,
    ) -> Result<Datum, EngineError> {
        let converter = self.converter(kind)?;
        tracing::debug!(binding = %kind, native = value.type_name(), "encode");
        Ok(converter.encode(value, expected)?)
    }

    /// Every registered name, trigger aliases included, sorted.
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.entries.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use hostbind_api::ConvertError;
    use hostbind_converters::{BlobConverter, QueueMessageOutConverter};

    use super::*;

    #[derive(Debug)]
    struct ShadowBlob;

    impl Converter for ShadowBlob {
        fn binding(&self) -> &'static str {
            "blob"
        }
    }

    #[test]
    fn trigger_alias_resolves_to_the_same_converter() {
        let registry = ConverterRegistry::builder()
            .register(BlobConverter)
            .unwrap()
            .build();
        assert_eq!(registry.kinds(), vec!["blob", "blobTrigger"]);
        assert!(registry.has_trigger_support("blob"));
        assert!(registry.is_trigger("blobTrigger"));
        assert!(!registry.is_trigger("blob"));
        assert_eq!(registry.registrant("blobTrigger"), registry.registrant("blob"));
    }

    #[test]
    fn duplicate_kind_names_both_registrants() {
        let err = ConverterRegistry::builder()
            .register(BlobConverter)
            .unwrap()
            .register(ShadowBlob)
            .unwrap_err();
        match err {
            EngineError::DuplicateBinding { binding, existing, incoming } => {
                assert_eq!(binding, "blob");
                assert!(existing.ends_with("BlobConverter"), "{existing}");
                assert!(incoming.ends_with("ShadowBlob"), "{incoming}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_kinds_are_none_or_errors() {
        let registry = ConverterRegistry::builder().build();
        assert!(registry.get("smtp").is_none());
        assert!(!registry.has_trigger_support("smtp"));
        assert!(matches!(
            registry.decode("smtp", None, None),
            Err(EngineError::UnknownBinding(kind)) if kind == "smtp"
        ));
    }

    #[test]
    fn dispatches_to_the_converter() {
        let registry = ConverterRegistry::builder()
            .register(QueueMessageOutConverter)
            .unwrap()
            .build();
        assert_eq!(
            registry.encode("queue", Native::Str("m".into()), None).unwrap(),
            Datum::string("m")
        );
        let err = registry.decode("queue", Some(&Datum::string("m")), None).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Convert(ConvertError::NotImplemented { operation: "decode", .. })
        ));
    }
}
