
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::construct::{Bindings, Triple};
use crate::error::{Result, TripodError};
use crate::persist::FactStore;

/// The literal clause separator. Queries received from external callers use
/// this exact format, so it must not change.
pub const CLAUSE_SEPARATOR: &str = " . ";

lazy_static! {
    // a quoted span counts as one token; anything else splits on whitespace
    static ref TOKEN: Regex = Regex::new(r#""[^"]*"|'[^']*'|\S+"#).unwrap();
}

/// Parse a conjunctive query into its patterns, one triple per clause,
/// preserving clause order. Clause order matters: it decides which pattern
/// fixes a variable first when bindings are merged.
pub fn parse_clauses(text: &str) -> Result<Vec<Triple>> {
    if text.trim().is_empty() {
        return Err(TripodError::MissingArgument("query text".to_string()));
    }
    let lowered = text.to_lowercase();
    let mut clauses = Vec::new();
    for clause in lowered.split(CLAUSE_SEPARATOR) {
        let clause = clause.trim();
        let tokens: Vec<&str> = TOKEN.find_iter(clause).map(|m| m.as_str()).collect();
        if tokens.len() != 3 {
            return Err(TripodError::Format(format!(
                "malformed query: clause '{clause}' has {} tokens where exactly three are required",
                tokens.len()
            )));
        }
        clauses.push(Triple::new(tokens[0], tokens[1], tokens[2])?);
    }
    Ok(clauses)
}

// ------------- Engine -------------
/// Runs parsed queries and commands against a fact store. The store owns
/// enumeration and the multi-pattern join; the engine parses, checks that
/// commands act on concrete facts, and materializes the facts a command
/// touched so callers can report them.
pub struct Engine<'store> {
    store: &'store dyn FactStore,
}

impl<'store> Engine<'store> {
    pub fn new(store: &'store dyn FactStore) -> Self {
        Self { store }
    }

    /// Parse the query text and enumerate every set of bindings that
    /// satisfies the conjunction against currently stored facts.
    pub fn query(&self, text: &str) -> Result<Vec<Bindings>> {
        let patterns = parse_clauses(text)?;
        debug!(clauses = patterns.len(), "enumerating query");
        self.store.enumerate(&patterns)
    }

    /// Apply a bindings set to each pattern, yielding the concrete facts the
    /// conjunction stands for under those bindings.
    pub fn materialize(&self, patterns: &[Triple], bindings: &Bindings) -> Vec<Triple> {
        patterns
            .iter()
            .map(|pattern| pattern.substitute(bindings))
            .collect()
    }

    /// Insert the facts described by the text. Every clause must be concrete
    /// after substitution. Returns the facts that were newly added; facts
    /// already present are skipped.
    pub fn insert(&self, text: &str) -> Result<Vec<Triple>> {
        self.insert_with(text, &Bindings::new())
    }

    pub fn insert_with(&self, text: &str, bindings: &Bindings) -> Result<Vec<Triple>> {
        let patterns = parse_clauses(text)?;
        let mut inserted = Vec::new();
        for pattern in &patterns {
            let fact = pattern.substitute(bindings);
            if fact.is_pattern() {
                return Err(TripodError::Execution(format!(
                    "cannot insert {fact}: an unbound variable remains"
                )));
            }
            if self.store.insert(&fact)? {
                inserted.push(fact);
            }
        }
        info!(inserted = inserted.len(), "insert complete");
        Ok(inserted)
    }

    /// Remove the facts described by the text. Every clause must be concrete
    /// after substitution. Returns the facts that were actually present and
    /// got removed.
    pub fn remove(&self, text: &str) -> Result<Vec<Triple>> {
        self.remove_with(text, &Bindings::new())
    }

    pub fn remove_with(&self, text: &str, bindings: &Bindings) -> Result<Vec<Triple>> {
        let patterns = parse_clauses(text)?;
        let mut removed = Vec::new();
        for pattern in &patterns {
            let fact = pattern.substitute(bindings);
            if fact.is_pattern() {
                return Err(TripodError::Execution(format!(
                    "cannot remove {fact}: an unbound variable remains"
                )));
            }
            // containment first, so only facts that were really present are
            // reported; the store serializes the read and the write
            if self.store.contains(&fact)? && self.store.remove(&fact)? {
                removed.push(fact);
            }
        }
        info!(removed = removed.len(), "remove complete");
        Ok(removed)
    }

    /// Remove all stored facts.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}
