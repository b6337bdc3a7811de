use std::collections::{BTreeMap, HashMap};

use hostbind_api::{Datum, Native, TriggerMetadata};

use crate::decl::{Binding, RETURN_BINDING};
use crate::error::EngineError;
use crate::function::Function;
use crate::registry::ConverterRegistry;

/// Marshals the arguments and results of one function invocation.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    function: &'a Function,
    registry: &'a ConverterRegistry,
}

impl<'a> Invocation<'a> {
    pub fn new(function: &'a Function, registry: &'a ConverterRegistry) -> Self {
        Self { function, registry }
    }

    pub fn function(&self) -> &'a Function {
        self.function
    }

    /// Decode every input binding, keyed by binding name.
    ///
    /// Trigger metadata is passed to the trigger binding only. A binding the
    /// host sent no datum for is decoded from `None`; converters decide
    /// whether that is an empty value or an error.
    pub fn decode_args(
        &self,
        inputs: &HashMap<String, Datum>,
        metadata: Option<&TriggerMetadata>,
    ) -> Result<BTreeMap<String, Option<Native>>, EngineError> {
        let mut args = BTreeMap::new();
        for binding in self
            .function
            .bindings()
            .iter()
            .filter(|b| b.direction().is_input())
        {
            let meta = if binding.is_trigger() { metadata } else { None };
            let value = self
                .registry
                .decode(binding.binding_type(), inputs.get(binding.name()), meta)
                .map_err(|e| self.context(e, binding))?;
            args.insert(binding.name().to_string(), value);
        }
        tracing::debug!(function = %self.function.name(), args = args.len(), "decoded arguments");
        Ok(args)
    }

    /// Encode a value written to the output binding `name`.
    pub fn encode_output(&self, name: &str, value: Native) -> Result<Datum, EngineError> {
        let binding = self
            .function
            .binding(name)
            .filter(|b| b.direction().is_output())
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "function '{}' has no output binding '{name}'",
                    self.function.name()
                ))
            })?;
        self.encode_with(binding, value)
    }

    /// Encode the function's return value.
    ///
    /// Goes to the `$return` binding when declared, otherwise to a trigger
    /// with implicit output.
    pub fn encode_return(&self, value: Native) -> Result<Datum, EngineError> {
        let binding = self.function.return_target(self.registry).ok_or_else(|| {
            EngineError::Config(format!(
                "function '{}' has no '{RETURN_BINDING}' binding and its trigger has no implicit output",
                self.function.name()
            ))
        })?;
        self.encode_with(binding, value)
    }

    fn encode_with(&self, binding: &Binding, value: Native) -> Result<Datum, EngineError> {
        self.registry
            .encode(binding.binding_type(), value, None)
            .map_err(|e| self.context(e, binding))
    }

    fn context(&self, err: EngineError, binding: &Binding) -> EngineError {
        err.with_context(format!("binding '{}'", binding.name()))
            .with_context(format!("function '{}'", self.function.name()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hostbind_api::durable::CustomTypes;
    use hostbind_api::queue::QueueMessage;
    use hostbind_api::rows::Row;
    use hostbind_api::{ConvertError, DatumType};

    use super::*;
    use crate::bindings::{activity_trigger, queue_trigger, sql_input, table_output};
    use crate::bootstrap::default_registry;

    fn registry() -> ConverterRegistry {
        default_registry(Arc::new(CustomTypes::new())).unwrap()
    }

    fn worker() -> Function {
        let mut f = Function::new("worker");
        f.add_trigger(queue_trigger("msg", "jobs", "Storage")).unwrap();
        f.add_binding(sql_input("items", "SELECT 1", "Sql")).unwrap();
        f.add_binding(table_output("audit", "Audit", "Storage")).unwrap();
        f
    }

    #[test]
    fn metadata_goes_to_the_trigger_only() {
        let registry = registry();
        let function = worker();
        let inv = Invocation::new(&function, &registry);

        let mut inputs = HashMap::new();
        inputs.insert("msg".to_string(), Datum::string("job-1"));
        inputs.insert("items".to_string(), Datum::json(r#"[{"id": 1}]"#));
        let mut meta = TriggerMetadata::new();
        meta.insert("Id".into(), Datum::string("q-1"));

        let args = inv.decode_args(&inputs, Some(&meta)).unwrap();
        assert_eq!(args.len(), 2);
        let Some(Some(Native::QueueMessage(msg))) = args.get("msg") else {
            panic!("expected a queue message");
        };
        assert_eq!(msg, &{
            let mut expected = QueueMessage::new(b"job-1".to_vec());
            expected.id = Some("q-1".into());
            expected
        });
        assert_eq!(
            args["items"],
            Some(Native::Rows(vec![Some(Row::new().with("id", 1))]))
        );
        assert!(!args.contains_key("audit"));
    }

    #[test]
    fn decode_failures_name_function_and_binding() {
        let registry = registry();
        let function = worker();
        let err = Invocation::new(&function, &registry)
            .decode_args(&HashMap::new(), None)
            .unwrap_err();
        assert!(err.to_string().starts_with("function 'worker': binding 'msg': "), "{err}");
        assert!(matches!(
            err.convert_error(),
            Some(ConvertError::MissingPayload { binding: "queueTrigger" })
        ));
    }

    #[test]
    fn outputs_are_encoded_by_name() {
        let registry = registry();
        let function = worker();
        let inv = Invocation::new(&function, &registry);
        let datum = inv
            .encode_output("audit", Native::Row(Row::new().with("PartitionKey", "p")))
            .unwrap();
        assert_eq!(datum.datum_type(), &DatumType::Json);
        assert!(inv.encode_output("items", Native::Str("x".into())).is_err());
        assert!(inv.encode_return(Native::Str("x".into())).is_err());
    }

    #[test]
    fn implicit_output_receives_the_return_value() {
        let registry = registry();
        let mut function = Function::new("act");
        function.add_trigger(activity_trigger("input")).unwrap();
        let datum = Invocation::new(&function, &registry)
            .encode_return(Native::Int(5))
            .unwrap();
        assert_eq!(datum, Datum::json("5"));
    }
}
