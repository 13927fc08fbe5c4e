use core::hash::{BuildHasherDefault, Hasher};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;

// we will use a fast hashing algo for maps whose keys are primitives or variable names
use seahash::SeaHasher;

use serde::Serialize;

use crate::error::{Result, TripodError};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Primitive -------------
/// The reserved character that turns an otherwise ordinary token into a variable.
pub const VARIABLE_PREFIX: char = '?';

const QUOTE_MARKS: [char; 2] = ['"', '\''];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// The whole domain is case-insensitive, so comparisons fold case rather than
// relying on every slot having passed through normalize.
fn eq_ci(left: &str, right: &str) -> bool {
    left == right || left.to_lowercase() == right.to_lowercase()
}

/// Turn a raw token into a normalized primitive.
///
/// Trims, unquotes, and lowercases. Quoted tokens must carry a matching
/// closing quote; the interior is trimmed as well. A token that has nothing
/// but non-word characters left after unquoting is rejected, so `...` and
/// `""` fail while `?a` passes. Normalization is idempotent: feeding an
/// already-normalized primitive back in returns it unchanged.
pub fn normalize(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TripodError::Format(
            "primitive may not be empty or whitespace".to_string(),
        ));
    }
    let unquoted = match trimmed.chars().next() {
        Some(quote) if QUOTE_MARKS.contains(&quote) => {
            if trimmed.len() < 2 || !trimmed.ends_with(quote) {
                return Err(TripodError::Format(format!(
                    "malformed quoted primitive {trimmed}"
                )));
            }
            trimmed[quote.len_utf8()..trimmed.len() - quote.len_utf8()].trim()
        }
        _ => trimmed,
    };
    let normalized = unquoted.to_lowercase();
    if !normalized.chars().any(is_word_char) {
        return Err(TripodError::Format(format!(
            "primitive {trimmed} contains no word characters"
        )));
    }
    Ok(normalized)
}

/// A trimmed token is a variable iff it starts with the reserved prefix.
pub fn is_variable(token: &str) -> bool {
    token.trim().starts_with(VARIABLE_PREFIX)
}

/// Canonicalize a variable name: trimmed, lowercased, carrying the reserved
/// prefix. Callers may say either `name` or `?name`; stored keys always use
/// the prefixed form.
pub fn as_variable(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with(VARIABLE_PREFIX) {
        trimmed.to_lowercase()
    } else {
        let mut canonical = String::with_capacity(trimmed.len() + 1);
        canonical.push(VARIABLE_PREFIX);
        canonical.push_str(&trimmed.to_lowercase());
        canonical
    }
}

// ------------- Triple -------------
/// An ordered (id, predicate, object) proposition. With a variable in any
/// slot it is a pattern; with none it is a concrete fact. Slots are
/// normalized at construction and the triple is immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Triple {
    id: String,
    predicate: String,
    object: String,
    is_pattern: bool,
}

impl Triple {
    pub fn new(id: &str, predicate: &str, object: &str) -> Result<Self> {
        for (slot, raw) in [("id", id), ("predicate", predicate), ("object", object)] {
            if raw.trim().is_empty() {
                return Err(TripodError::Format(format!(
                    "{slot} may not be empty or whitespace"
                )));
            }
        }
        let id = normalize(id)?;
        let predicate = normalize(predicate)?;
        let object = normalize(object)?;
        let is_pattern = is_variable(&id) || is_variable(&predicate) || is_variable(&object);
        Ok(Self {
            id,
            predicate,
            object,
            is_pattern,
        })
    }

    // It's intentional to encapsulate the slots in the struct and only expose
    // them using getters, because this yields true immutability after creation.
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn predicate(&self) -> &str {
        &self.predicate
    }
    pub fn object(&self) -> &str {
        &self.object
    }
    pub fn is_pattern(&self) -> bool {
        self.is_pattern
    }

    fn slots(&self) -> [&str; 3] {
        [&self.id, &self.predicate, &self.object]
    }

    /// Decide whether this pattern matches the given fact, using a freshly
    /// allocated scratch table.
    pub fn matches_fact(&self, fact: &Triple) -> bool {
        let mut scratch = MatchScratch::new();
        self.matches_fact_with(fact, &mut scratch)
    }

    /// Decide whether this pattern matches the given fact, reusing a
    /// caller-owned scratch table across many facts. The table is cleared at
    /// entry, so no state leaks between unrelated attempts.
    ///
    /// Slot pairs are checked in id, predicate, object order and the first
    /// failure short-circuits. A variable slot binds the corresponding fact
    /// slot in the scratch table; a repeated variable must see
    /// case-insensitively equal fact slots or the match fails. A literal slot
    /// matches iff it equals the fact slot, case-insensitively.
    pub fn matches_fact_with(&self, fact: &Triple, scratch: &mut MatchScratch) -> bool {
        scratch.clear();
        for (pattern_slot, fact_slot) in self.slots().into_iter().zip(fact.slots()) {
            if is_variable(pattern_slot) {
                match scratch.table.entry(pattern_slot.to_string()) {
                    Entry::Occupied(bound) => {
                        if !eq_ci(bound.get(), fact_slot) {
                            return false;
                        }
                    }
                    Entry::Vacant(unbound) => {
                        unbound.insert(fact_slot.to_string());
                    }
                }
            } else if !eq_ci(pattern_slot, fact_slot) {
                return false;
            }
        }
        true
    }

    /// Match this pattern against a fact and, on success, return `existing`
    /// layered under the bindings the variable slots imply. Existing keys
    /// always win, so a binding fixed by an earlier pattern in a conjunction
    /// is never overwritten. `None` iff the match fails.
    pub fn derive_bindings(&self, fact: &Triple, existing: &Bindings) -> Option<Bindings> {
        let mut scratch = MatchScratch::new();
        self.derive_bindings_with(fact, existing, &mut scratch)
    }

    pub fn derive_bindings_with(
        &self,
        fact: &Triple,
        existing: &Bindings,
        scratch: &mut MatchScratch,
    ) -> Option<Bindings> {
        if !self.matches_fact_with(fact, scratch) {
            return None;
        }
        let mut additions = Vec::new();
        for (pattern_slot, fact_slot) in self.slots().into_iter().zip(fact.slots()) {
            if is_variable(pattern_slot) && !existing.contains(pattern_slot) {
                additions.push(Binding::new(pattern_slot, fact_slot));
            }
        }
        Some(existing.layer(additions))
    }

    /// Replace every bound variable slot with its value. Bound values are
    /// trusted to be normalized already and are not re-validated. When no
    /// slot changes the original triple is returned unchanged.
    pub fn substitute(&self, bindings: &Bindings) -> Triple {
        fn resolve<'a>(slot: &'a str, bindings: &'a Bindings) -> &'a str {
            if is_variable(slot) {
                bindings.lookup(slot).unwrap_or(slot)
            } else {
                slot
            }
        }
        let id = resolve(&self.id, bindings);
        let predicate = resolve(&self.predicate, bindings);
        let object = resolve(&self.object, bindings);
        if eq_ci(id, &self.id) && eq_ci(predicate, &self.predicate) && eq_ci(object, &self.object)
        {
            return self.clone();
        }
        let id = id.to_string();
        let predicate = predicate.to_string();
        let object = object.to_string();
        let is_pattern = is_variable(&id) || is_variable(&predicate) || is_variable(&object);
        Triple {
            id,
            predicate,
            object,
            is_pattern,
        }
    }
}

impl PartialEq for Triple {
    fn eq(&self, other: &Self) -> bool {
        eq_ci(&self.id, &other.id)
            && eq_ci(&self.predicate, &other.predicate)
            && eq_ci(&self.object, &other.object)
    }
}
impl Eq for Triple {}
impl Hash for Triple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.to_lowercase().hash(state);
        self.predicate.to_lowercase().hash(state);
        self.object.to_lowercase().hash(state);
    }
}
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.predicate, self.object)
    }
}

// ------------- MatchScratch -------------
/// Caller-owned workspace for one matching attempt. Reusing one table across
/// a stream of candidate facts avoids an allocation per fact; it is cleared
/// at the start of every match, never assumed empty.
#[derive(Debug, Default)]
pub struct MatchScratch {
    table: HashMap<String, String, OtherHasher>,
}

impl MatchScratch {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn clear(&mut self) {
        self.table.clear();
    }
}

// ------------- Binding -------------
/// One (variable, value) pair. The variable name is canonicalized to carry
/// the reserved prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    variable: String,
    value: String,
}

impl Binding {
    pub fn new(variable: &str, value: &str) -> Self {
        Self {
            variable: as_variable(variable),
            value: value.to_string(),
        }
    }
    pub fn variable(&self) -> &str {
        &self.variable
    }
    pub fn value(&self) -> &str {
        &self.value
    }
}
impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}", self.variable, self.value)
    }
}

// ------------- Bindings -------------
/// A mapping from canonical variable names to values, built once and never
/// mutated afterwards. Layering builds a new set; the base keeps its own
/// entries and remains independently valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bindings {
    kept: HashMap<String, String, OtherHasher>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a raw collection. Duplicate keys keep the first
    /// occurrence; later duplicates are dropped silently.
    pub fn from_bindings(bindings: impl IntoIterator<Item = Binding>) -> Self {
        let mut kept = HashMap::default();
        for binding in bindings {
            kept.entry(binding.variable).or_insert(binding.value);
        }
        Self { kept }
    }

    /// Build a new set with this one as the base and `additions` on top.
    /// Two phases: copy the base entries, then insert additions only for
    /// absent keys, which makes the first-write-wins precedence explicit.
    pub fn layer(&self, additions: impl IntoIterator<Item = Binding>) -> Bindings {
        let mut kept = self.kept.clone();
        for binding in additions {
            if let Entry::Vacant(unbound) = kept.entry(binding.variable) {
                unbound.insert(binding.value);
            }
        }
        Bindings { kept }
    }

    /// Look a variable up by name; the name is canonicalized first, so
    /// `lookup("a")` and `lookup("?A")` find the same entry.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.kept.get(&as_variable(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kept.contains_key(&as_variable(name))
    }

    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.kept
            .iter()
            .map(|(variable, value)| (variable.as_str(), value.as_str()))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .kept
            .iter()
            .map(|(variable, value)| format!("{variable} = {value}"))
            .collect();
        pairs.sort();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Fold a pattern list against the facts that matched them, left to right,
/// starting from `existing`. Earlier patterns take precedence over later
/// ones; the first pattern that fails against its fact halts derivation for
/// the whole list. The lists must pair up one to one.
pub fn derive_conjunction(
    patterns: &[Triple],
    facts: &[Triple],
    existing: &Bindings,
) -> Option<Bindings> {
    if patterns.len() != facts.len() {
        return None;
    }
    let mut scratch = MatchScratch::new();
    let mut accumulated = existing.clone();
    for (pattern, fact) in patterns.iter().zip(facts) {
        accumulated = pattern.derive_bindings_with(fact, &accumulated, &mut scratch)?;
    }
    Some(accumulated)
}
