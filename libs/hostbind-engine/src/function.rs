use hostbind_api::NativeType;
use serde_json::{Map, Value};

use crate::decl::{Binding, BindingDirection, RETURN_BINDING};
use crate::error::EngineError;
use crate::registry::ConverterRegistry;

/// A hosted function and its ordered bindings.
///
/// The trigger is stored in the binding list like every other binding, so
/// the manifest lists it alongside the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    name: String,
    script_file: Option<String>,
    trigger: Option<usize>,
    bindings: Vec<Binding>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script_file: None,
            trigger: None,
            bindings: Vec::new(),
        }
    }

    pub fn with_script_file(mut self, script_file: impl Into<String>) -> Self {
        self.script_file = Some(script_file.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script_file(&self) -> Option<&str> {
        self.script_file.as_deref()
    }

    /// Set the trigger. A function has exactly one.
    pub fn add_trigger(&mut self, trigger: Binding) -> Result<(), EngineError> {
        if let Some(existing) = self.trigger() {
            return Err(EngineError::MultipleTriggers {
                function: self.name.clone(),
                existing: existing.name().to_string(),
                incoming: trigger.name().to_string(),
            });
        }
        self.trigger = Some(self.bindings.len());
        self.bindings.push(trigger);
        Ok(())
    }

    /// Append a binding; trigger declarations go through [`Function::add_trigger`].
    pub fn add_binding(&mut self, binding: Binding) -> Result<(), EngineError> {
        if binding.is_trigger() {
            return self.add_trigger(binding);
        }
        self.bindings.push(binding);
        Ok(())
    }

    pub fn trigger(&self) -> Option<&Binding> {
        self.trigger.and_then(|i| self.bindings.get(i))
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name() == name)
    }

    pub fn return_binding(&self) -> Option<&Binding> {
        self.binding(RETURN_BINDING)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.trigger.is_none() {
            return Err(EngineError::MissingTrigger(self.name.clone()));
        }
        Ok(())
    }

    /// `function.json` content: `{"scriptFile", "bindings"}`.
    pub fn dict_repr(&self) -> Value {
        let mut repr = Map::new();
        if let Some(script_file) = &self.script_file {
            repr.insert("scriptFile".into(), Value::from(script_file.clone()));
        }
        repr.insert(
            "bindings".into(),
            Value::Array(self.bindings.iter().map(Binding::dict_repr).collect()),
        );
        Value::Object(repr)
    }

    pub fn function_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(&self.dict_repr())?)
    }

    /// One serialized manifest entry per binding, in declaration order.
    pub fn raw_bindings(&self) -> Vec<String> {
        self.bindings.iter().map(Binding::to_json).collect()
    }

    /// Check declared parameter and return annotations against the registered converters.
    ///
    /// `NativeType::Any` means "not annotated" and is never rejected.
    pub fn check_types(
        &self,
        registry: &ConverterRegistry,
        params: &[(&str, NativeType)],
        return_type: Option<&NativeType>,
    ) -> Result<(), EngineError> {
        for (param, ty) in params {
            let binding = self.binding(param).ok_or_else(|| {
                EngineError::Config(format!(
                    "function '{}': parameter '{param}' has no binding",
                    self.name
                ))
            })?;
            if *ty == NativeType::Any {
                continue;
            }
            let (accepted, direction) = match binding.direction() {
                BindingDirection::Out => (registry.check_output_type(binding.binding_type(), ty)?, "output"),
                BindingDirection::In | BindingDirection::Inout => {
                    (registry.check_input_type(binding.binding_type(), ty)?, "input")
                }
            };
            if !accepted {
                return Err(type_mismatch(binding, direction, ty));
            }
        }

        let Some(ty) = return_type.filter(|t| **t != NativeType::Any) else {
            return Ok(());
        };
        let target = self.return_target(registry).ok_or_else(|| {
            EngineError::Config(format!(
                "function '{}' returns a value but has no '{RETURN_BINDING}' binding",
                self.name
            ))
        })?;
        if !registry.check_output_type(target.binding_type(), ty)? {
            return Err(type_mismatch(target, "return", ty));
        }
        Ok(())
    }

    /// Binding that receives the return value: `$return`, else an implicit-output trigger.
    pub fn return_target(&self, registry: &ConverterRegistry) -> Option<&Binding> {
        self.return_binding().or_else(|| {
            self.trigger()
                .filter(|t| registry.has_implicit_output(t.binding_type()))
        })
    }
}

fn type_mismatch(binding: &Binding, direction: &'static str, ty: &NativeType) -> EngineError {
    EngineError::TypeMismatch {
        binding: binding.name().to_string(),
        binding_type: binding.binding_type().to_string(),
        direction,
        declared: format!("{ty:?}"),
    }
}
