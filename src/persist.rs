// used for persistence
use rusqlite::{Connection, params, params_from_iter};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::construct::{Binding, Bindings, Triple, is_variable};
use crate::error::{Result, TripodError};

// ------------- FactStore -------------
/// The contract a fact store backend fulfils. The core stays agnostic to how
/// enumeration is computed; it only consumes the resulting bindings and
/// interprets insert/remove outcomes as booleans.
pub trait FactStore {
    /// Enumerate every bindings set that satisfies the pattern conjunction
    /// against currently stored facts. The backend executes the
    /// multi-pattern join itself.
    fn enumerate(&self, patterns: &[Triple]) -> Result<Vec<Bindings>>;
    /// Persist a fully-concrete fact. True iff the fact was newly added.
    fn insert(&self, fact: &Triple) -> Result<bool>;
    /// Delete a fully-concrete fact. True iff the fact was present.
    fn remove(&self, fact: &Triple) -> Result<bool>;
    /// Whether the fact is currently stored.
    fn contains(&self, fact: &Triple) -> Result<bool>;
    /// Remove all facts.
    fn clear(&self) -> Result<()>;
}

/// Where the store keeps its facts.
#[derive(Debug, Clone)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

// ------------- SqliteStore -------------
/// A fact store on top of SQLite. Pattern conjunctions are translated into a
/// single select whose per-pattern aliases and equality predicates express
/// literal constraints and repeated-variable joins, so the join runs inside
/// SQLite rather than in this process.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

const SLOT_COLUMNS: [&str; 3] = ["Fact_Id", "Fact_Predicate", "Fact_Object"];

impl SqliteStore {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let connection = match mode {
            PersistenceMode::InMemory => Connection::open_in_memory()?,
            PersistenceMode::File(path) => Connection::open(path)?,
        };
        // Slots are stored normalized, and nocase collation keeps comparisons
        // case-insensitive even for values that bypassed normalization.
        connection.execute_batch(
            "
            create table if not exists Fact (
                Fact_Id text not null collate nocase,
                Fact_Predicate text not null collate nocase,
                Fact_Object text not null collate nocase,
                constraint unique_Fact unique (
                    Fact_Id,
                    Fact_Predicate,
                    Fact_Object
                )
            );
            create index if not exists Fact_Predicate_Index on Fact (
                Fact_Predicate
            );
            create index if not exists Fact_Object_Index on Fact (
                Fact_Object
            );
            ",
        )?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| TripodError::Lock(e.to_string()))
    }

    fn slot_pairs(pattern: &Triple) -> [(&'static str, &str); 3] {
        [
            (SLOT_COLUMNS[0], pattern.id()),
            (SLOT_COLUMNS[1], pattern.predicate()),
            (SLOT_COLUMNS[2], pattern.object()),
        ]
    }

    /// Translate a pattern conjunction into one select statement. Each
    /// pattern gets its own table alias. A literal slot becomes a
    /// parameterized equality; the first occurrence of a variable names the
    /// column it projects, and every later occurrence becomes an equality
    /// predicate against that first column, which is what joins the patterns.
    fn compile(patterns: &[Triple]) -> (String, Vec<String>, Vec<(String, String)>) {
        let mut variables: Vec<(String, String)> = Vec::new();
        let mut conditions: Vec<String> = Vec::new();
        let mut parameters: Vec<String> = Vec::new();
        for (index, pattern) in patterns.iter().enumerate() {
            for (column, slot) in Self::slot_pairs(pattern) {
                let qualified = format!("f{index}.{column}");
                if is_variable(slot) {
                    let first = variables
                        .iter()
                        .find(|(variable, _)| variable.as_str() == slot)
                        .map(|(_, column)| column.clone());
                    match first {
                        Some(first) => conditions.push(format!("{qualified} = {first}")),
                        None => variables.push((slot.to_string(), qualified)),
                    }
                } else {
                    parameters.push(slot.to_string());
                    conditions.push(format!("{qualified} = ?"));
                }
            }
        }
        let projection = if variables.is_empty() {
            "1".to_string()
        } else {
            variables
                .iter()
                .map(|(_, column)| column.clone())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let from = (0..patterns.len())
            .map(|index| format!("Fact f{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("select {projection} from {from}");
        if !conditions.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&conditions.join(" and "));
        }
        (sql, parameters, variables)
    }

    fn require_concrete(fact: &Triple, operation: &str) -> Result<()> {
        if fact.is_pattern() {
            return Err(TripodError::Execution(format!(
                "cannot {operation} {fact}: only concrete facts are persisted"
            )));
        }
        Ok(())
    }
}

impl FactStore for SqliteStore {
    fn enumerate(&self, patterns: &[Triple]) -> Result<Vec<Bindings>> {
        if patterns.is_empty() {
            return Err(TripodError::MissingArgument("patterns".to_string()));
        }
        let (sql, parameters, variables) = Self::compile(patterns);
        debug!(%sql, "enumerating patterns");
        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params_from_iter(parameters.iter()))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            let mut bound = Vec::with_capacity(variables.len());
            for (index, (variable, _)) in variables.iter().enumerate() {
                let value: String = row.get(index)?;
                bound.push(Binding::new(variable, &value));
            }
            results.push(Bindings::from_bindings(bound));
        }
        Ok(results)
    }

    fn insert(&self, fact: &Triple) -> Result<bool> {
        Self::require_concrete(fact, "insert")?;
        let connection = self.lock()?;
        let mut statement = connection.prepare_cached(
            "
            insert or ignore into Fact (
                Fact_Id,
                Fact_Predicate,
                Fact_Object
            ) values (?, ?, ?)
        ",
        )?;
        let added = statement.execute(params![fact.id(), fact.predicate(), fact.object()])?;
        Ok(added > 0)
    }

    fn remove(&self, fact: &Triple) -> Result<bool> {
        Self::require_concrete(fact, "remove")?;
        let connection = self.lock()?;
        let mut statement = connection.prepare_cached(
            "
            delete from Fact
                where Fact_Id = ?
                and Fact_Predicate = ?
                and Fact_Object = ?
        ",
        )?;
        let deleted = statement.execute(params![fact.id(), fact.predicate(), fact.object()])?;
        Ok(deleted > 0)
    }

    fn contains(&self, fact: &Triple) -> Result<bool> {
        Self::require_concrete(fact, "check")?;
        let connection = self.lock()?;
        let mut statement = connection.prepare_cached(
            "
            select 1 from Fact
                where Fact_Id = ?
                and Fact_Predicate = ?
                and Fact_Object = ?
        ",
        )?;
        let found = statement.exists(params![fact.id(), fact.predicate(), fact.object()])?;
        Ok(found)
    }

    fn clear(&self) -> Result<()> {
        let connection = self.lock()?;
        connection.execute("delete from Fact", [])?;
        Ok(())
    }
}
