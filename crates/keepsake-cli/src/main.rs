//! Keepsake command line front end.
//!
//! Loads a type metadata snapshot, computes the reflection closure for the
//! supplied roots under the chosen policy, and writes the resulting
//! reachability configs:
//!
//! - `reflect-config.json` for the `--root` set
//! - `jni-config.json` for the `--jni-root` set, computed in its own session
//!   so the two closures stay independent
//!
//! Missing no-arg constructors and unresolvable type references are reported
//! as warnings and never fail the run; only I/O, JSON, and argument errors do.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use keepsake_engine::{ClosureRegistrar, ConfigSink, Session, TraversalPolicy};
use keepsake_types::{MetadataSnapshot, ReflectConfigEntry, TypeId};

/// CLI arguments for the Keepsake closure generator.
#[derive(Parser, Debug)]
#[command(name = "keepsake")]
#[command(about = "Compute AOT reachability metadata from a type snapshot")]
struct Args {
    /// Path to the metadata snapshot JSON
    #[arg(short, long)]
    metadata: PathBuf,

    /// Traversal policy applied to the reflection roots
    #[arg(short, long, value_enum, default_value = "full")]
    policy: PolicyArg,

    /// Root type for reflection registration (repeatable)
    #[arg(short, long = "root")]
    roots: Vec<String>,

    /// Root type for native-call (JNI) access registration (repeatable)
    #[arg(long = "jni-root")]
    jni_roots: Vec<String>,

    /// Directory the config files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Policies selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PolicyArg {
    /// Register each root and its no-arg constructor only, no fan-out
    NoArg,
    /// Full instantiation closure through fields and nested types
    Full,
    /// Full closure, additionally following constructor parameter types
    FullFollowParams,
    /// Field-reachable closure for serialization
    Serialization,
}

impl PolicyArg {
    fn to_policy(self) -> TraversalPolicy {
        match self {
            PolicyArg::NoArg => TraversalPolicy::NoArgConstructorOnly,
            PolicyArg::Full => TraversalPolicy::FullInstantiationClosure {
                follow_constructor_params: false,
            },
            PolicyArg::FullFollowParams => TraversalPolicy::FullInstantiationClosure {
                follow_constructor_params: true,
            },
            PolicyArg::Serialization => TraversalPolicy::SerializationFieldClosure,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    if let Err(e) = run(&args) {
        eprintln!("[keepsake] Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    if args.roots.is_empty() && args.jni_roots.is_empty() {
        anyhow::bail!("no roots supplied; pass --root and/or --jni-root");
    }

    let file = File::open(&args.metadata)
        .with_context(|| format!("failed to open snapshot {:?}", args.metadata))?;
    let snapshot = MetadataSnapshot::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse snapshot {:?}", args.metadata))?;
    log::info!(
        "loaded snapshot `{}` with {} types",
        snapshot.name,
        snapshot.len()
    );

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    if !args.roots.is_empty() {
        let entries = compute(&snapshot, &args.policy.to_policy(), &args.roots, "reflection");
        write_config(&args.out_dir.join("reflect-config.json"), &entries)?;
    }

    if !args.jni_roots.is_empty() {
        // JNI access registration is flat: methods and fields of the roots'
        // closure, never constructor-parameter fan-out.
        let policy = TraversalPolicy::FullInstantiationClosure {
            follow_constructor_params: false,
        };
        let entries = compute(&snapshot, &policy, &args.jni_roots, "jni");
        write_config(&args.out_dir.join("jni-config.json"), &entries)?;
    }

    Ok(())
}

/// Run one independent closure session over `roots` and collect its entries.
fn compute(
    snapshot: &MetadataSnapshot,
    policy: &TraversalPolicy,
    roots: &[String],
    label: &str,
) -> Vec<ReflectConfigEntry> {
    let roots: Vec<TypeId> = roots.iter().map(|r| TypeId::from(r.as_str())).collect();

    let mut sink = ConfigSink::new();
    let mut session = Session::new();
    ClosureRegistrar::new(snapshot, &mut sink).register_closure(&mut session, policy, &roots);

    log::info!(
        "{label}: {} roots expanded to {} registered types ({} diagnostics)",
        roots.len(),
        sink.len(),
        session.diagnostics().len()
    );
    sink.into_entries()
}

fn write_config(path: &Path, entries: &[ReflectConfigEntry]) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create config file {path:?}"))?;
    serde_json::to_writer_pretty(file, entries)
        .with_context(|| format!("failed to write config file {path:?}"))?;
    log::info!("wrote {} entries to {path:?}", entries.len());
    Ok(())
}
