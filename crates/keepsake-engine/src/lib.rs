//! Policy-driven type-closure traversal for AOT reflection metadata.
//!
//! Given a set of root types and a [`TraversalPolicy`], the engine walks the
//! type graph exposed by a [`TypeGraphSource`], decides which members of each
//! discovered type to keep, and emits registration calls to a
//! [`RegistrationSink`]. A [`Session`] guarantees that every type is expanded
//! at most once, so traversal terminates on cyclic and diamond-shaped graphs.
//!
//! # Example
//!
//! ```
//! use keepsake_engine::{ClosureRegistrar, RecordingSink, Session, TraversalPolicy};
//! use keepsake_types::{MetadataSnapshot, TypeDescriptor, TypeId, TypeKind};
//!
//! let mut snapshot = MetadataSnapshot::new("example");
//! snapshot.insert(TypeDescriptor::new("com.example.Player", TypeKind::Class));
//!
//! let mut sink = RecordingSink::new();
//! let mut session = Session::new();
//! ClosureRegistrar::new(&snapshot, &mut sink).register_closure(
//!     &mut session,
//!     &TraversalPolicy::FullInstantiationClosure {
//!         follow_constructor_params: false,
//!     },
//!     &[TypeId::from("com.example.Player")],
//! );
//!
//! assert_eq!(sink.requests().len(), 1);
//! ```

use keepsake_types::{MetadataSnapshot, TypeDescriptor, TypeId};

pub mod closure;
pub mod sink;

pub use closure::{ClosureRegistrar, Diagnostic, Session, TraversalPolicy};
pub use sink::{ConfigSink, RecordingSink, RegistrationSink};

/// Errors that can occur while resolving type metadata.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("type `{0}` could not be resolved in the type metadata")]
    UnresolvedType(TypeId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Capability abstraction over wherever type metadata comes from.
///
/// The traversal engine is fully decoupled from how structural facts about
/// types are obtained; any table of descriptors can back a closure run.
pub trait TypeGraphSource {
    /// Look up the descriptor for a type identity.
    fn describe(&self, id: &TypeId) -> Result<&TypeDescriptor>;
}

impl TypeGraphSource for MetadataSnapshot {
    fn describe(&self, id: &TypeId) -> Result<&TypeDescriptor> {
        self.get(id).ok_or_else(|| Error::UnresolvedType(id.clone()))
    }
}
