//! The closure traversal itself: session state, policies, and the registrar.
//!
//! The walk is synchronous and depth-first. Roots are processed in the order
//! they are supplied and members in declaration order, so the sink call
//! sequence is stable across runs and usable as a diffable fixture.

use std::collections::HashSet;
use std::fmt;

use keepsake_types::{TypeDescriptor, TypeId};

use crate::sink::RegistrationSink;
use crate::{Error, TypeGraphSource};

// ============================================================================
// Diagnostics
// ============================================================================

/// A non-fatal condition observed during traversal.
///
/// Diagnostics never abort the closure computation; they are collected on the
/// [`Session`] and mirrored to the `log` facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A policy wanted a zero-parameter constructor the type does not declare.
    MissingNoArgConstructor { id: TypeId },
    /// A referenced type identity could not be resolved; its branch of the
    /// traversal was skipped.
    UnresolvedType {
        id: TypeId,
        /// The type whose member referenced the unresolved identity, or
        /// `None` when the identity was itself a root.
        referenced_from: Option<TypeId>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingNoArgConstructor { id } => {
                write!(
                    f,
                    "tried to register the no-arg constructor of `{id}`, but it does not have one"
                )
            }
            Diagnostic::UnresolvedType {
                id,
                referenced_from: Some(from),
            } => {
                write!(f, "type `{id}` referenced from `{from}` could not be resolved; skipping its branch")
            }
            Diagnostic::UnresolvedType {
                id,
                referenced_from: None,
            } => {
                write!(f, "root type `{id}` could not be resolved; skipping it")
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// State for one closure computation: the visited set plus diagnostics.
///
/// Marking a type visited is the sole termination mechanism for cyclic and
/// self-referential type graphs, and the sole dedup guard for diamond-shaped
/// ones. Sessions are monotonic and never cleared; run several independent
/// closures by creating several sessions.
#[derive(Debug, Default)]
pub struct Session {
    visited: HashSet<TypeId>,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as visited. Returns `true` if it had not been seen before;
    /// `false` (with no state change) if it had.
    pub fn mark_and_check(&mut self, id: &TypeId) -> bool {
        self.visited.insert(id.clone())
    }

    pub fn is_visited(&self, id: &TypeId) -> bool {
        self.visited.contains(id)
    }

    /// Number of types expanded so far, across all invocations in this session.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Diagnostics collected so far, in the order they were observed.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

// ============================================================================
// Traversal Policies
// ============================================================================

/// Which members of a discovered type are registered, and which referenced
/// types the walk recurses into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalPolicy {
    /// Register the type and its declared no-arg constructor, nothing else.
    ///
    /// Performs no graph expansion: each root is handled independently, with
    /// no fan-out through fields, constructor parameters, or nested types. A
    /// missing no-arg constructor is a diagnostic, not an error.
    NoArgConstructorOnly,

    /// Register the type together with its public constructors, public
    /// methods, and declared fields, then recurse into every declared field's
    /// type and every declared nested type.
    ///
    /// When `follow_constructor_params` is set, every public constructor's
    /// parameter types are expanded as well, with the flag preserved at every
    /// depth. This is the default, most aggressive closure and knowingly
    /// over-registers: missing metadata causes runtime failures that are hard
    /// to diagnose, surplus metadata only costs binary size.
    FullInstantiationClosure { follow_constructor_params: bool },

    /// Register the type, its no-arg constructor (diagnostic if absent), and
    /// every declared field, then recurse into each field's type.
    ///
    /// Constructor parameter types and nested types are never followed: only
    /// field-reachable types matter for field-based serialization.
    SerializationFieldClosure,
}

// ============================================================================
// Registrar
// ============================================================================

/// Drives the recursive walk over a [`TypeGraphSource`], emitting registration
/// calls to a [`RegistrationSink`].
pub struct ClosureRegistrar<'a, G, S> {
    source: &'a G,
    sink: &'a mut S,
}

impl<'a, G: TypeGraphSource, S: RegistrationSink> ClosureRegistrar<'a, G, S> {
    pub fn new(source: &'a G, sink: &'a mut S) -> Self {
        Self { source, sink }
    }

    /// Compute the closure of `roots` under `policy`.
    ///
    /// Idempotent within a session: a type that was already expanded by an
    /// earlier invocation is skipped entirely, even if the earlier invocation
    /// used a different policy. An unresolvable identity aborts only its own
    /// branch; every other root still completes.
    pub fn register_closure(
        &mut self,
        session: &mut Session,
        policy: &TraversalPolicy,
        roots: &[TypeId],
    ) {
        for root in roots {
            expand(self.source, self.sink, session, policy, root, None);
        }
    }
}

fn expand<G: TypeGraphSource, S: RegistrationSink>(
    source: &G,
    sink: &mut S,
    session: &mut Session,
    policy: &TraversalPolicy,
    id: &TypeId,
    referenced_from: Option<&TypeId>,
) {
    if !session.mark_and_check(id) {
        log::trace!("type `{id}` already processed, skipping");
        return;
    }

    let desc = match source.describe(id) {
        Ok(desc) => desc,
        Err(Error::UnresolvedType(_)) => {
            session.report(Diagnostic::UnresolvedType {
                id: id.clone(),
                referenced_from: referenced_from.cloned(),
            });
            return;
        }
    };

    log::debug!("registering `{id}` under {policy:?}");

    match policy {
        TraversalPolicy::NoArgConstructorOnly => {
            sink.register_type(&desc.id);
            register_no_arg_constructor(sink, session, desc);
        }

        TraversalPolicy::FullInstantiationClosure {
            follow_constructor_params,
        } => {
            sink.register_type(&desc.id);
            for ctor in desc.public_constructors() {
                sink.register_constructor(&desc.id, &ctor.params);
            }
            for method in desc.public_methods() {
                sink.register_method(&desc.id, &method.name, &method.params);
            }
            for field in &desc.fields {
                sink.register_field(&desc.id, &field.name);
            }

            if *follow_constructor_params {
                for ctor in desc.public_constructors() {
                    for param in &ctor.params {
                        expand(source, sink, session, policy, param, Some(&desc.id));
                    }
                }
            }
            for field in &desc.fields {
                expand(source, sink, session, policy, &field.ty, Some(&desc.id));
            }
            for nested in &desc.nested_types {
                expand(source, sink, session, policy, nested, Some(&desc.id));
            }
        }

        TraversalPolicy::SerializationFieldClosure => {
            sink.register_type(&desc.id);
            register_no_arg_constructor(sink, session, desc);
            for field in &desc.fields {
                sink.register_field(&desc.id, &field.name);
            }
            for field in &desc.fields {
                expand(source, sink, session, policy, &field.ty, Some(&desc.id));
            }
        }
    }
}

/// Register the declared zero-parameter constructor of `desc`, if any.
///
/// Interfaces and anonymous classes cannot be instantiated by name, so the
/// lookup is skipped for them without a diagnostic.
fn register_no_arg_constructor<S: RegistrationSink>(
    sink: &mut S,
    session: &mut Session,
    desc: &TypeDescriptor,
) {
    if !desc.is_instantiable() {
        log::debug!("`{}` is not instantiable by name, no constructor to register", desc.id);
        return;
    }
    match desc.no_arg_constructor() {
        Some(ctor) => sink.register_constructor(&desc.id, &ctor.params),
        None => session.report(Diagnostic::MissingNoArgConstructor {
            id: desc.id.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use keepsake_types::{
        ConstructorInfo, FieldInfo, MetadataSnapshot, RegistrationRequest, TypeKind, Visibility,
    };

    fn class(id: &str) -> TypeDescriptor {
        TypeDescriptor::new(id, TypeKind::Class)
    }

    fn public_ctor(params: &[&str]) -> ConstructorInfo {
        ConstructorInfo {
            params: params.iter().map(|p| TypeId::from(*p)).collect(),
            visibility: Visibility::Public,
        }
    }

    fn public_field(name: &str, ty: &str) -> FieldInfo {
        FieldInfo {
            name: name.to_string(),
            ty: TypeId::from(ty),
            visibility: Visibility::Public,
        }
    }

    fn full(follow_constructor_params: bool) -> TraversalPolicy {
        TraversalPolicy::FullInstantiationClosure {
            follow_constructor_params,
        }
    }

    /// The identities of all `Type` registrations, in emission order.
    fn registered_types(sink: &RecordingSink) -> Vec<&str> {
        sink.requests()
            .iter()
            .filter_map(|r| match r {
                RegistrationRequest::Type { id } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    fn run(
        snapshot: &MetadataSnapshot,
        session: &mut Session,
        policy: &TraversalPolicy,
        roots: &[&str],
    ) -> RecordingSink {
        let roots: Vec<TypeId> = roots.iter().map(|r| TypeId::from(*r)).collect();
        let mut sink = RecordingSink::new();
        ClosureRegistrar::new(snapshot, &mut sink).register_closure(session, policy, &roots);
        sink
    }

    #[test]
    fn test_cycle_terminates_and_registers_each_type_once() {
        let mut snapshot = MetadataSnapshot::new("cycle");
        let mut a = class("A");
        a.fields.push(public_field("b", "B"));
        let mut b = class("B");
        b.fields.push(public_field("a", "A"));
        snapshot.insert(a);
        snapshot.insert(b);

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["A"]);

        assert_eq!(registered_types(&sink), vec!["A", "B"]);
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_self_referential_field_terminates() {
        let mut snapshot = MetadataSnapshot::new("self");
        let mut node = class("Node");
        node.fields.push(public_field("next", "Node"));
        snapshot.insert(node);

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["Node"]);

        assert_eq!(registered_types(&sink), vec!["Node"]);
    }

    #[test]
    fn test_diamond_registers_shared_type_once() {
        let mut snapshot = MetadataSnapshot::new("diamond");
        let mut a = class("A");
        a.fields.push(public_field("shared", "Shared"));
        let mut b = class("B");
        b.fields.push(public_field("shared", "Shared"));
        snapshot.insert(a);
        snapshot.insert(b);
        snapshot.insert(class("Shared"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["A", "B"]);

        assert_eq!(registered_types(&sink), vec!["A", "Shared", "B"]);
    }

    #[test]
    fn test_second_invocation_emits_nothing() {
        let mut snapshot = MetadataSnapshot::new("idempotent");
        let mut a = class("A");
        a.fields.push(public_field("b", "B"));
        snapshot.insert(a);
        snapshot.insert(class("B"));

        let mut session = Session::new();
        let first = run(&snapshot, &mut session, &full(false), &["A"]);
        assert!(!first.requests().is_empty());

        let second = run(&snapshot, &mut session, &full(false), &["A"]);
        assert!(second.requests().is_empty());
    }

    #[test]
    fn test_revisit_with_different_policy_is_dropped() {
        let mut snapshot = MetadataSnapshot::new("policies");
        let mut a = class("A");
        a.constructors.push(public_ctor(&[]));
        a.fields.push(public_field("b", "B"));
        snapshot.insert(a);
        snapshot.insert(class("B"));

        let mut session = Session::new();
        run(
            &snapshot,
            &mut session,
            &TraversalPolicy::NoArgConstructorOnly,
            &["A"],
        );

        // A was fully processed above; the aggressive policy must not re-open it.
        let second = run(&snapshot, &mut session, &full(true), &["A"]);
        assert!(second.requests().is_empty());
        assert!(!session.is_visited(&TypeId::from("B")));
    }

    #[test]
    fn test_constructor_params_followed_only_when_flagged() {
        let mut snapshot = MetadataSnapshot::new("params");
        let mut c = class("C");
        c.constructors.push(public_ctor(&["D"]));
        snapshot.insert(c);
        snapshot.insert(class("D"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["C"]);
        assert_eq!(registered_types(&sink), vec!["C"]);

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(true), &["C"]);
        assert_eq!(registered_types(&sink), vec!["C", "D"]);
    }

    #[test]
    fn test_serialization_closure_excludes_constructor_params() {
        let mut snapshot = MetadataSnapshot::new("serialization");
        let mut t = class("T");
        t.constructors.push(public_ctor(&[]));
        t.constructors.push(public_ctor(&["F"]));
        t.fields.push(public_field("e", "E"));
        snapshot.insert(t);
        let mut e = class("E");
        e.constructors.push(public_ctor(&[]));
        snapshot.insert(e);
        snapshot.insert(class("F"));

        let mut session = Session::new();
        let sink = run(
            &snapshot,
            &mut session,
            &TraversalPolicy::SerializationFieldClosure,
            &["T"],
        );

        assert_eq!(registered_types(&sink), vec!["T", "E"]);
        assert!(!session.is_visited(&TypeId::from("F")));
    }

    #[test]
    fn test_serialization_closure_ignores_nested_types() {
        let mut snapshot = MetadataSnapshot::new("nested");
        let mut outer = class("Outer");
        outer.constructors.push(public_ctor(&[]));
        outer.nested_types.push(TypeId::from("Outer$Inner"));
        snapshot.insert(outer);
        snapshot.insert(class("Outer$Inner"));

        let mut session = Session::new();
        let sink = run(
            &snapshot,
            &mut session,
            &TraversalPolicy::SerializationFieldClosure,
            &["Outer"],
        );
        assert_eq!(registered_types(&sink), vec!["Outer"]);

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["Outer"]);
        assert_eq!(registered_types(&sink), vec!["Outer", "Outer$Inner"]);
    }

    #[test]
    fn test_no_arg_policy_does_not_fan_out() {
        let mut snapshot = MetadataSnapshot::new("no-fan-out");
        let mut a = class("A");
        a.constructors.push(public_ctor(&[]));
        a.fields.push(public_field("b", "B"));
        a.nested_types.push(TypeId::from("A$Inner"));
        snapshot.insert(a);
        snapshot.insert(class("B"));
        snapshot.insert(class("A$Inner"));

        let mut session = Session::new();
        let sink = run(
            &snapshot,
            &mut session,
            &TraversalPolicy::NoArgConstructorOnly,
            &["A"],
        );

        assert_eq!(registered_types(&sink), vec!["A"]);
        assert_eq!(
            sink.requests()[1],
            RegistrationRequest::Constructor {
                id: TypeId::from("A"),
                params: vec![],
            }
        );
    }

    #[test]
    fn test_missing_no_arg_constructor_is_non_fatal() {
        let mut snapshot = MetadataSnapshot::new("diagnostics");
        let mut no_ctor = class("NoCtor");
        no_ctor.constructors.push(public_ctor(&["X"]));
        snapshot.insert(no_ctor);
        let mut next = class("Next");
        next.constructors.push(public_ctor(&[]));
        snapshot.insert(next);
        snapshot.insert(class("X"));

        let mut session = Session::new();
        let sink = run(
            &snapshot,
            &mut session,
            &TraversalPolicy::NoArgConstructorOnly,
            &["NoCtor", "Next"],
        );

        // The later root is still processed in full.
        assert_eq!(registered_types(&sink), vec!["NoCtor", "Next"]);
        assert_eq!(
            session.diagnostics(),
            &[Diagnostic::MissingNoArgConstructor {
                id: TypeId::from("NoCtor"),
            }]
        );
    }

    #[test]
    fn test_interface_skips_constructor_lookup_without_diagnostic() {
        let mut snapshot = MetadataSnapshot::new("interface");
        snapshot.insert(TypeDescriptor::new("Drawable", TypeKind::Interface));

        let mut session = Session::new();
        let sink = run(
            &snapshot,
            &mut session,
            &TraversalPolicy::NoArgConstructorOnly,
            &["Drawable"],
        );

        assert_eq!(
            sink.requests(),
            &[RegistrationRequest::Type {
                id: TypeId::from("Drawable"),
            }]
        );
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_unresolved_reference_aborts_only_its_branch() {
        let mut snapshot = MetadataSnapshot::new("unresolved");
        let mut a = class("A");
        a.fields.push(public_field("missing", "Missing"));
        a.fields.push(public_field("good", "Good"));
        snapshot.insert(a);
        snapshot.insert(class("Good"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["A"]);

        assert_eq!(registered_types(&sink), vec!["A", "Good"]);
        assert_eq!(
            session.diagnostics(),
            &[Diagnostic::UnresolvedType {
                id: TypeId::from("Missing"),
                referenced_from: Some(TypeId::from("A")),
            }]
        );
    }

    #[test]
    fn test_unresolved_root_does_not_stop_later_roots() {
        let mut snapshot = MetadataSnapshot::new("unresolved-root");
        snapshot.insert(class("Present"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["Ghost", "Present"]);

        assert_eq!(registered_types(&sink), vec!["Present"]);
        assert_eq!(
            session.diagnostics(),
            &[Diagnostic::UnresolvedType {
                id: TypeId::from("Ghost"),
                referenced_from: None,
            }]
        );
    }

    #[test]
    fn test_roots_processed_in_supplied_order() {
        let mut snapshot = MetadataSnapshot::new("ordering");
        let mut x = class("X");
        x.fields.push(public_field("inner", "X1"));
        let mut y = class("Y");
        y.fields.push(public_field("inner", "Y1"));
        snapshot.insert(x);
        snapshot.insert(y);
        snapshot.insert(class("X1"));
        snapshot.insert(class("Y1"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["X", "Y"]);

        // Depth-first: everything reachable from X precedes anything from Y.
        assert_eq!(registered_types(&sink), vec!["X", "X1", "Y", "Y1"]);
    }

    #[test]
    fn test_full_closure_registers_members_in_declaration_order() {
        let mut snapshot = MetadataSnapshot::new("members");
        let mut t = class("T");
        t.constructors.push(public_ctor(&[]));
        t.constructors.push(ConstructorInfo {
            params: vec![TypeId::from("int")],
            visibility: Visibility::Private,
        });
        t.methods.push(keepsake_types::MethodInfo {
            name: "update".to_string(),
            params: vec![],
            visibility: Visibility::Public,
        });
        t.methods.push(keepsake_types::MethodInfo {
            name: "internal".to_string(),
            params: vec![],
            visibility: Visibility::Private,
        });
        t.fields.push(public_field("first", "int"));
        t.fields.push(FieldInfo {
            name: "second".to_string(),
            ty: TypeId::from("int"),
            visibility: Visibility::Private,
        });
        snapshot.insert(t);
        snapshot.insert(class("int"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(false), &["T"]);

        // Private constructors and methods are not registered; all declared
        // fields are, in declaration order.
        assert_eq!(
            &sink.requests()[..5],
            &[
                RegistrationRequest::Type {
                    id: TypeId::from("T"),
                },
                RegistrationRequest::Constructor {
                    id: TypeId::from("T"),
                    params: vec![],
                },
                RegistrationRequest::Method {
                    id: TypeId::from("T"),
                    method: "update".to_string(),
                    params: vec![],
                },
                RegistrationRequest::Field {
                    id: TypeId::from("T"),
                    field: "first".to_string(),
                },
                RegistrationRequest::Field {
                    id: TypeId::from("T"),
                    field: "second".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_flag_preserved_through_recursion() {
        // C -> (ctor param) D -> (ctor param) E: with the flag set, the
        // closure must stay uniformly wide at every depth.
        let mut snapshot = MetadataSnapshot::new("deep-params");
        let mut c = class("C");
        c.constructors.push(public_ctor(&["D"]));
        let mut d = class("D");
        d.constructors.push(public_ctor(&["E"]));
        snapshot.insert(c);
        snapshot.insert(d);
        snapshot.insert(class("E"));

        let mut session = Session::new();
        let sink = run(&snapshot, &mut session, &full(true), &["C"]);

        assert_eq!(registered_types(&sink), vec!["C", "D", "E"]);
    }
}
