//! Registration sinks: where closure decisions end up.
//!
//! The registrar does not know what consumes its registrations. A sink can
//! record them for inspection ([`RecordingSink`]) or fold them into the
//! reachability-config entries an AOT toolchain reads ([`ConfigSink`]).

use std::collections::HashMap;

use keepsake_types::{
    CONSTRUCTOR_NAME, ConfigField, ConfigMethod, ReflectConfigEntry, RegistrationRequest, TypeId,
};

/// Receives registration requests from the closure registrar.
///
/// Sinks may assume requests are already deduplicated per type: the session's
/// visited set guarantees each type's members are registered at most once per
/// run.
pub trait RegistrationSink {
    fn register_type(&mut self, id: &TypeId);
    fn register_constructor(&mut self, id: &TypeId, params: &[TypeId]);
    fn register_field(&mut self, id: &TypeId, field: &str);
    fn register_method(&mut self, id: &TypeId, method: &str, params: &[TypeId]);
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Appends every request in call order. Test fixture and debug-dump surface.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Vec<RegistrationRequest>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests received so far, in emission order.
    pub fn requests(&self) -> &[RegistrationRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<RegistrationRequest> {
        self.requests
    }
}

impl RegistrationSink for RecordingSink {
    fn register_type(&mut self, id: &TypeId) {
        self.requests.push(RegistrationRequest::Type { id: id.clone() });
    }

    fn register_constructor(&mut self, id: &TypeId, params: &[TypeId]) {
        self.requests.push(RegistrationRequest::Constructor {
            id: id.clone(),
            params: params.to_vec(),
        });
    }

    fn register_field(&mut self, id: &TypeId, field: &str) {
        self.requests.push(RegistrationRequest::Field {
            id: id.clone(),
            field: field.to_string(),
        });
    }

    fn register_method(&mut self, id: &TypeId, method: &str, params: &[TypeId]) {
        self.requests.push(RegistrationRequest::Method {
            id: id.clone(),
            method: method.to_string(),
            params: params.to_vec(),
        });
    }
}

// ============================================================================
// Config Sink
// ============================================================================

/// Folds registrations into one [`ReflectConfigEntry`] per type.
///
/// Entries keep the order in which their types were first registered, so the
/// emitted config is stable across runs for the same roots.
#[derive(Debug, Default)]
pub struct ConfigSink {
    entries: Vec<ReflectConfigEntry>,
    index: HashMap<TypeId, usize>,
}

impl ConfigSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The accumulated config entries, in first-registration order.
    pub fn into_entries(self) -> Vec<ReflectConfigEntry> {
        self.entries
    }

    fn entry_mut(&mut self, id: &TypeId) -> &mut ReflectConfigEntry {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => {
                self.entries.push(ReflectConfigEntry::new(id.clone()));
                let idx = self.entries.len() - 1;
                self.index.insert(id.clone(), idx);
                idx
            }
        };
        &mut self.entries[idx]
    }
}

impl RegistrationSink for ConfigSink {
    fn register_type(&mut self, id: &TypeId) {
        self.entry_mut(id);
    }

    fn register_constructor(&mut self, id: &TypeId, params: &[TypeId]) {
        self.entry_mut(id).methods.push(ConfigMethod {
            name: CONSTRUCTOR_NAME.to_string(),
            parameter_types: params.to_vec(),
        });
    }

    fn register_field(&mut self, id: &TypeId, field: &str) {
        self.entry_mut(id).fields.push(ConfigField {
            name: field.to_string(),
        });
    }

    fn register_method(&mut self, id: &TypeId, method: &str, params: &[TypeId]) {
        self.entry_mut(id).methods.push(ConfigMethod {
            name: method.to_string(),
            parameter_types: params.to_vec(),
        });
    }
}
