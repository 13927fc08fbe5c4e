//! Tripod – a small matching engine for subject–predicate–object facts.
//!
//! Tripod centers on the *triple* concept: an ordered proposition
//! `(id, predicate, object)` whose slots are normalized, case-insensitive
//! primitives. A slot carrying the reserved `?` prefix is a variable, which
//! makes the triple a *pattern*; a triple without variables is a concrete
//! *fact*. Matching a pattern against facts produces [`construct::Bindings`],
//! immutable variable-to-value mappings that merge across the clauses of a
//! conjunctive query with earlier-clause precedence.
//!
//! ## Modules
//! * [`construct`] – Primitive normalization, variable recognition, the
//!   [`construct::Triple`] pattern/fact model, matching, binding derivation
//!   and substitution.
//! * [`query`] – The clause parser (clauses separated by `" . "`, three
//!   tokens each) and an [`query::Engine`] running queries and commands
//!   against a fact store.
//! * [`persist`] – The [`persist::FactStore`] backend contract and a SQLite
//!   implementation that executes the multi-pattern join as a single select.
//! * [`error`] – The crate-wide error taxonomy.
//!
//! ## Quick Start
//! ```
//! use tripod::persist::{PersistenceMode, SqliteStore};
//! use tripod::query::Engine;
//! let store = SqliteStore::new(PersistenceMode::InMemory).unwrap();
//! let engine = Engine::new(&store);
//! engine.insert("alice likes cake . bob likes alice").unwrap();
//! let rows = engine.query("?who likes cake").unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].lookup("who"), Some("alice"));
//! ```
//!
//! Malformed input fails fast: a primitive that is empty, punctuation-only or
//! carries an unmatched quote, and a clause without exactly three tokens, all
//! raise a format error at construction. A pattern that simply matches
//! nothing is not an error; enumeration just yields no bindings.

pub mod construct;
pub mod error;
pub mod persist;
pub mod query;
