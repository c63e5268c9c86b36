//! Paramtree Inspect - build a tree from a schema and show its state
//!
//! Loads a YAML tree schema, restores saved state from the state directory,
//! applies command-line assignments, then prints the control list and the
//! current values.
//!
//! ## Usage
//!
//! ```text
//! paramtree-inspect <schema.yaml> [--state-dir DIR] [--set path=value ...] [--save]
//! ```
//!
//! - `--state-dir DIR`: where saved state and `persistence.yaml` live
//!   (default: `<data_dir>/paramtree`)
//! - `--set path=value`: assign a leaf; numbers are parsed, anything else is
//!   taken as a color string
//! - `--save`: write the resulting values back to the state directory

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use paramtree_core::{controls, load_schema, ParamGroup, Value};
use paramtree_persist::{
    paths, FileStorage, PersistenceConfig, PersistencePlugin, PERSISTENCE_NAME,
};

#[derive(Debug, Default, PartialEq)]
struct Args {
    schema: PathBuf,
    state_dir: Option<PathBuf>,
    assignments: Vec<(String, Value)>,
    save: bool,
}

fn parse_value(raw: &str) -> Value {
    match raw.parse::<f64>() {
        Ok(v) => Value::Number(v),
        Err(_) => Value::Color(raw.to_string()),
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut schema = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--state-dir" => {
                let dir = iter.next().context("--state-dir needs a directory")?;
                parsed.state_dir = Some(PathBuf::from(dir));
            }
            "--set" => {
                let assignment = iter.next().context("--set needs path=value")?;
                let Some((path, value)) = assignment.split_once('=') else {
                    bail!("Invalid assignment '{}', expected path=value", assignment);
                };
                parsed.assignments.push((path.to_string(), parse_value(value)));
            }
            "--save" => parsed.save = true,
            other if other.starts_with("--") => bail!("Unknown flag '{}'", other),
            other => {
                if schema.is_some() {
                    bail!("Unexpected argument '{}'", other);
                }
                schema = Some(PathBuf::from(other));
            }
        }
    }

    parsed.schema = schema.context("Usage: paramtree-inspect <schema.yaml> [--state-dir DIR] [--set path=value ...] [--save]")?;
    Ok(parsed)
}

fn attach_persistence(tree: &ParamGroup, state_dir: PathBuf) -> Result<()> {
    let mut config = PersistenceConfig::load(&paths::config_path(&state_dir));
    config.restore_on_attach = true;

    let storage = FileStorage::new(state_dir).with_extension(config.format.extension());
    log::info!("Using state directory {:?}", storage.dir());
    tree.register(Box::new(PersistencePlugin::new(storage, config)))?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let tree = schema.build()?;
    log::info!("Built tree with {} top-level entries from {:?}", tree.len(), args.schema);

    let state_dir = args.state_dir.unwrap_or_else(paths::default_state_dir);
    attach_persistence(&tree, state_dir)?;

    for (path, value) in args.assignments {
        if !tree.set(&path, value.clone()) {
            log::warn!("Could not assign {} = {}", path, value);
        }
    }

    println!("Controls:");
    for control in controls(&tree) {
        println!("  {}", control);
    }
    println!();
    println!("Values:");
    print!("{}", serde_yaml::to_string(&tree.values()).context("Failed to encode values")?);

    if args.save {
        if let Some(persistence) = tree.extension::<PersistencePlugin>(PERSISTENCE_NAME) {
            persistence.save()?;
            log::info!("State saved");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Set RUST_LOG=debug for per-change output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    run(args)
}
