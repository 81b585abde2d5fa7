//! # 📌 Keepsake - Reflection Metadata Closure for AOT Compilation
//!
//! Ahead-of-time toolchains strip whatever static analysis cannot prove
//! reachable. Code that uses reflection breaks under that rule: the analysis
//! cannot see that a type, constructor, field, or method is accessed
//! dynamically, so the metadata must be registered explicitly at build time.
//!
//! Keepsake computes that registration set. Given root types and a traversal
//! policy, it walks the type graph and decides, for each discovered type,
//! which members to keep reachable and which referenced types to expand next.
//! The walk is cycle-safe and registers every type at most once, no matter
//! how deeply or cyclically types reference each other.
//!
//! ## ✨ Quick Start
//!
//! ```
//! use keepsake::{
//!     ClosureRegistrar, ConfigSink, MetadataSnapshot, Session, TraversalPolicy, TypeDescriptor,
//!     TypeId, TypeKind,
//! };
//!
//! // Type metadata normally arrives as a JSON snapshot; build one by hand here.
//! let mut snapshot = MetadataSnapshot::new("game");
//! snapshot.insert(TypeDescriptor::new("com.example.Player", TypeKind::Class));
//!
//! let mut sink = ConfigSink::new();
//! let mut session = Session::new();
//! ClosureRegistrar::new(&snapshot, &mut sink).register_closure(
//!     &mut session,
//!     &TraversalPolicy::FullInstantiationClosure {
//!         follow_constructor_params: false,
//!     },
//!     &[TypeId::from("com.example.Player")],
//! );
//!
//! let entries = sink.into_entries();
//! assert_eq!(entries.len(), 1);
//! ```
//!
//! ## 🏗️ Architecture
//!
//! - **[`keepsake_types`]**: the read-only metadata model, loadable snapshots,
//!   and the emitted config entries
//! - **[`keepsake_engine`]**: the policy-driven traversal engine, sessions,
//!   and registration sinks
//! - **`keepsake-cli`**: one-shot binary that turns a snapshot plus roots into
//!   `reflect-config.json` / `jni-config.json`
//!
//! ## 🎯 Policies
//!
//! - [`TraversalPolicy::NoArgConstructorOnly`]: roots only, no fan-out
//! - [`TraversalPolicy::FullInstantiationClosure`]: the conservative default,
//!   expanding fields, nested types, and optionally constructor parameters
//! - [`TraversalPolicy::SerializationFieldClosure`]: field-reachable types
//!   only, for field-based serialization

// Re-export the traversal engine
pub use keepsake_engine::{
    ClosureRegistrar, ConfigSink, Diagnostic, Error, RecordingSink, RegistrationSink, Result,
    Session, TraversalPolicy, TypeGraphSource,
};

// Re-export the metadata model
pub use keepsake_types::{
    CONSTRUCTOR_NAME, ConfigField, ConfigMethod, ConstructorInfo, FieldInfo, MetadataSnapshot,
    MethodInfo, ReflectConfigEntry, RegistrationRequest, TypeDescriptor, TypeId, TypeKind,
    Visibility,
};
