use std::io::Read;

use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tripod::error::{Result, TripodError};
use tripod::persist::{PersistenceMode, SqliteStore};
use tripod::query::Engine;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = Config::builder()
        .add_source(config::File::with_name("tripod").required(false))
        .add_source(config::Environment::with_prefix("TRIPOD").separator("__"))
        .build()?;
    let filter = settings
        .get_string("logging.filter")
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    // an empty path keeps all facts in memory for the duration of the run
    let database_path = settings.get_string("database.path").unwrap_or_default();
    let mode = if database_path.is_empty() {
        PersistenceMode::InMemory
    } else {
        PersistenceMode::File(database_path)
    };
    info!(?mode, "opening fact store");
    let store = SqliteStore::new(mode)?;
    let engine = Engine::new(&store);

    let arguments: Vec<String> = std::env::args().skip(1).collect();
    let script = if arguments.is_empty() {
        let mut buffered = String::new();
        std::io::stdin()
            .read_to_string(&mut buffered)
            .map_err(|e| TripodError::Execution(e.to_string()))?;
        buffered
    } else {
        arguments.join(" ")
    };
    execute(&engine, &script)
}

/// One command per line: `add <clauses>`, `remove <clauses>`, `clear`, or a
/// bare conjunction to query. Query rows are printed as JSON objects mapping
/// variables to values.
fn execute(engine: &Engine<'_>, script: &str) -> Result<()> {
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(clauses) = line.strip_prefix("add ") {
            for fact in engine.insert(clauses)? {
                println!("added {fact}");
            }
        } else if let Some(clauses) = line.strip_prefix("remove ") {
            for fact in engine.remove(clauses)? {
                println!("removed {fact}");
            }
        } else if line == "clear" {
            engine.clear()?;
            println!("cleared");
        } else {
            for bindings in engine.query(line)? {
                let row = serde_json::to_string(&bindings)
                    .map_err(|e| TripodError::Execution(e.to_string()))?;
                println!("{row}");
            }
        }
    }
    Ok(())
}
