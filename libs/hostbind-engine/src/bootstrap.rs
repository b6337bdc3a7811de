use std::collections::BTreeMap;
use std::sync::Arc;

use hostbind_api::durable::CustomTypes;
use hostbind_converters::{
    ActivityTriggerConverter, AuthenticationEventsTriggerConverter, BlobConverter,
    DurableClientConverter, EntityTriggerConverter, EventGridEventInConverter,
    EventGridEventOutConverter, EventHubConverter, EventHubTriggerConverter, HttpRequestConverter,
    HttpResponseConverter, KafkaConverter, KafkaTriggerConverter, OrchestrationTriggerConverter,
    QueueMessageInConverter, QueueMessageOutConverter, RowsConverter,
    ServiceBusMessageInConverter, ServiceBusMessageOutConverter, TimerRequestConverter,
};
use serde_json::{Map, Value};

use crate::bindings::AuthLevel;
use crate::config::{AppConfig, BindingConfig, FunctionConfig};
use crate::decl::{Binding, BindingDirection, BindingRole, RETURN_BINDING};
use crate::error::EngineError;
use crate::function::Function;
use crate::invoke::Invocation;
use crate::registry::ConverterRegistry;

/// The built-in converter table.
///
/// `types` lists the custom objects that activity and authentication-event
/// payloads may carry.
pub fn default_registry(types: Arc<CustomTypes>) -> Result<ConverterRegistry, EngineError> {
    Ok(ConverterRegistry::builder()
        .register(HttpRequestConverter)?
        .register(HttpResponseConverter)?
        .register(BlobConverter)?
        .register(QueueMessageInConverter)?
        .register(QueueMessageOutConverter)?
        .register(EventHubConverter)?
        .register(EventHubTriggerConverter)?
        .register(KafkaConverter)?
        .register(KafkaTriggerConverter)?
        .register(ServiceBusMessageInConverter)?
        .register(ServiceBusMessageOutConverter)?
        .register(RowsConverter::sql())?
        .register(RowsConverter::sql_trigger())?
        .register(RowsConverter::mysql())?
        .register(RowsConverter::mysql_trigger())?
        .register(RowsConverter::cosmos_db())?
        .register(RowsConverter::cosmos_db_trigger())?
        .register(RowsConverter::table())?
        .register(TimerRequestConverter)?
        .register(EventGridEventInConverter)?
        .register(EventGridEventOutConverter)?
        .register(OrchestrationTriggerConverter)?
        .register(EntityTriggerConverter)?
        .register(ActivityTriggerConverter::new(Arc::clone(&types)))?
        .register(DurableClientConverter)?
        .register(AuthenticationEventsTriggerConverter::new(types))?
        .build())
}

/// A validated function app: every function has one trigger and only
/// registered binding kinds.
#[derive(Debug)]
pub struct FunctionApp {
    registry: Arc<ConverterRegistry>,
    functions: Vec<Function>,
}

impl FunctionApp {
    /// Build the app against the default converter table.
    pub fn bootstrap(config: &AppConfig) -> Result<Self, EngineError> {
        let registry = default_registry(Arc::new(CustomTypes::new()))?;
        Self::with_registry(config, Arc::new(registry))
    }

    pub fn with_registry(
        config: &AppConfig,
        registry: Arc<ConverterRegistry>,
    ) -> Result<Self, EngineError> {
        let mut functions = Vec::with_capacity(config.functions.len());
        for fn_cfg in &config.functions {
            let ctx = format!("function '{}'", fn_cfg.name);
            let function = build_function(fn_cfg, config.script_file.as_deref(), &registry)
                .map_err(|e| e.with_context(&ctx))?;
            if functions.iter().any(|f: &Function| f.name() == function.name()) {
                return Err(EngineError::Config(format!("{ctx}: declared twice")));
            }
            tracing::info!(
                function = %function.name(),
                trigger = function.trigger().map_or("", |t| t.binding_type()),
                bindings = function.bindings().len(),
                "loaded function"
            );
            functions.push(function);
        }
        Ok(Self {
            registry,
            functions,
        })
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name() == name)
    }

    /// Marshalling context for one invocation of `name`.
    pub fn invocation(&self, name: &str) -> Result<Invocation<'_>, EngineError> {
        let function = self
            .function(name)
            .ok_or_else(|| EngineError::Config(format!("unknown function '{name}'")))?;
        Ok(Invocation::new(function, &self.registry))
    }

    /// `{<function name>: <function.json>}` for every function.
    pub fn manifest(&self) -> Value {
        let functions: BTreeMap<_, _> = self
            .functions
            .iter()
            .map(|f| (f.name().to_string(), f.dict_repr()))
            .collect();
        Value::Object(functions.into_iter().collect::<Map<_, _>>())
    }
}

fn build_function(
    cfg: &FunctionConfig,
    default_script: Option<&str>,
    registry: &ConverterRegistry,
) -> Result<Function, EngineError> {
    let mut function = Function::new(&cfg.name);
    if let Some(script) = cfg.script_file.as_deref().or(default_script) {
        function = function.with_script_file(script);
    }
    for binding_cfg in &cfg.bindings {
        let mut binding = build_binding(binding_cfg, registry)
            .map_err(|e| e.with_context(format!("binding '{}'", binding_cfg.name)))?;
        if binding.binding_type() == "httpTrigger" && binding.setting("auth_level").is_none() {
            let level = cfg.auth_level.unwrap_or(AuthLevel::Function);
            binding.set("auth_level", level.as_str());
        }
        function.add_binding(binding)?;
    }
    function.validate()?;
    Ok(function)
}

fn build_binding(cfg: &BindingConfig, registry: &ConverterRegistry) -> Result<Binding, EngineError> {
    registry.converter(&cfg.binding_type)?;

    let (role, direction) = if registry.is_trigger(&cfg.binding_type) {
        (BindingRole::Trigger, cfg.direction.unwrap_or(BindingDirection::In))
    } else {
        let default = if cfg.name == RETURN_BINDING {
            BindingDirection::Out
        } else {
            BindingDirection::In
        };
        let direction = cfg.direction.unwrap_or(default);
        let role = if direction == BindingDirection::Out {
            BindingRole::Output
        } else {
            BindingRole::Input
        };
        (role, direction)
    };
    if role == BindingRole::Trigger && direction != BindingDirection::In {
        return Err(EngineError::Config(format!(
            "trigger '{}' must have direction 'in'",
            cfg.binding_type
        )));
    }

    let mut binding = Binding::new(&cfg.binding_type, &cfg.name, role, direction);
    if let Some(data_type) = cfg.data_type {
        binding = binding.with_data_type(data_type);
    }
    for (key, value) in &cfg.settings {
        binding.set(key, value.clone());
    }
    Ok(binding)
}
