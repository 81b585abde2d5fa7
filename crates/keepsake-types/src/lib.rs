//! Shared metadata model for Keepsake closure computation.
//!
//! This crate defines the read-only type descriptors the closure engine walks,
//! the registration requests it emits, the on-disk metadata snapshot the CLI
//! loads, and the reachability-config entries it writes out.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Identity
// ============================================================================

/// The fully qualified name of a type, used as its unique identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ============================================================================
// Type Descriptors
// ============================================================================

/// What kind of type a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// An ordinary, instantiable class.
    Class,
    /// An interface; has no constructors of its own.
    Interface,
    /// An anonymous class; cannot be instantiated by name.
    Anonymous,
    Array,
    Primitive,
}

/// Visibility of a member as declared in the source type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A constructor as declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorInfo {
    /// Parameter types in declaration order.
    pub params: Vec<TypeId>,
    pub visibility: Visibility,
}

impl ConstructorInfo {
    pub fn is_no_arg(&self) -> bool {
        self.params.is_empty()
    }
}

/// A field as declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    /// The field's declared type, which may be the declaring type itself.
    pub ty: TypeId,
    pub visibility: Visibility,
}

/// A method as declared on a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    /// Parameter types in declaration order.
    pub params: Vec<TypeId>,
    pub visibility: Visibility,
}

/// Read-only structural facts about one type.
///
/// All member lists are in the declaration order reported by the source type
/// system; "public" views are visibility-filtered subsets of the declared
/// lists. The closure engine never mutates a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub kind: TypeKind,
    #[serde(default)]
    pub constructors: Vec<ConstructorInfo>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    /// Types declared nested inside this one.
    #[serde(default)]
    pub nested_types: Vec<TypeId>,
}

impl TypeDescriptor {
    /// A descriptor with the given identity and kind and no members.
    pub fn new(id: impl Into<TypeId>, kind: TypeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested_types: Vec::new(),
        }
    }

    /// Whether instantiating this type by name can make sense at all.
    pub fn is_instantiable(&self) -> bool {
        !matches!(self.kind, TypeKind::Interface | TypeKind::Anonymous)
    }

    /// The declared zero-parameter constructor, regardless of visibility.
    pub fn no_arg_constructor(&self) -> Option<&ConstructorInfo> {
        self.constructors.iter().find(|c| c.is_no_arg())
    }

    /// Public constructors in declaration order.
    pub fn public_constructors(&self) -> impl Iterator<Item = &ConstructorInfo> {
        self.constructors.iter().filter(|c| c.visibility.is_public())
    }

    /// Public methods in declaration order.
    pub fn public_methods(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.visibility.is_public())
    }
}

// ============================================================================
// Registration Requests
// ============================================================================

/// One instruction to the registration sink.
///
/// Produced transiently during traversal; serializable so test fixtures and
/// debug dumps stay diffable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistrationRequest {
    /// Keep the type itself reflectively reachable.
    Type { id: TypeId },
    /// Keep one specific constructor reachable.
    Constructor { id: TypeId, params: Vec<TypeId> },
    /// Keep one field reachable by name.
    Field { id: TypeId, field: String },
    /// Keep one method reachable by signature.
    Method {
        id: TypeId,
        method: String,
        params: Vec<TypeId>,
    },
}

// ============================================================================
// Metadata Snapshot
// ============================================================================

/// A loadable table of every type the build knows about.
///
/// This is the input the CLI feeds the engine: a JSON file mapping fully
/// qualified names to descriptors, produced by whatever extracted metadata
/// from the host type system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    /// Name of the build or module this snapshot was taken from.
    pub name: String,
    /// Descriptors keyed by fully qualified name.
    pub types: HashMap<TypeId, TypeDescriptor>,
}

impl MetadataSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: HashMap::new(),
        }
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a snapshot from a reader (e.g. an open file).
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }

    /// Add a descriptor, keyed by its own identity.
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.id.clone(), descriptor);
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ============================================================================
// Emitted Reachability Config
// ============================================================================

/// One entry in the emitted reachability-metadata config.
///
/// Matches the JSON shape AOT toolchains consume: constructors appear under
/// `methods` with the name `<init>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectConfigEntry {
    pub name: TypeId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<ConfigMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ConfigField>,
}

impl ReflectConfigEntry {
    pub fn new(name: TypeId) -> Self {
        Self {
            name,
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }
}

/// Name reachability configs use for constructors.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMethod {
    pub name: String,
    pub parameter_types: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigField {
    pub name: String,
}
