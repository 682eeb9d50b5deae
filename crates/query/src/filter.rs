//! Event filters
//!
//! A filter is a disjunction of clauses, each clause a conjunction of
//! `field = value` / `field != value` terms:
//!
//! ```text
//! (f1 = a AND f2 != b) OR (f3 = c)
//! ```
//!
//! Terms are resolved against a store's dictionary once, at compile time.
//! A term naming an unknown field or value cannot be satisfied when
//! positive, and is trivially satisfied when negated. Compiled filters are
//! immutable and shared between cursors through `Arc<EventFilter>`.

use tracing::debug;
use trailstore_core::{Dictionary, ItemId};

/// One `field = value` or `field != value` test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTerm {
    field: String,
    value: Vec<u8>,
    negated: bool,
}

impl FilterTerm {
    /// Match events whose `field` holds `value`
    pub fn eq(field: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Self {
            field: field.into(),
            value: value.as_ref().to_vec(),
            negated: false,
        }
    }

    /// Match events whose `field` does not hold `value`
    pub fn ne(field: impl Into<String>, value: impl AsRef<[u8]>) -> Self {
        Self {
            negated: true,
            ..Self::eq(field, value)
        }
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Raw value
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Check if this is a `!=` term
    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

#[derive(Debug, Clone, Copy)]
struct CompiledTerm {
    item: ItemId,
    /// Position among user fields
    index: usize,
    negated: bool,
}

impl CompiledTerm {
    #[inline]
    fn matches_items(&self, items: &[ItemId]) -> bool {
        items.contains(&self.item) != self.negated
    }

    #[inline]
    fn matches_values(&self, values: &[u32]) -> bool {
        let present = values.get(self.index) == Some(&self.item.value_of());
        present != self.negated
    }
}

#[derive(Debug, Clone)]
enum CompiledClause {
    /// Empty, or holds a positive term that cannot be satisfied
    Never,
    /// Every remaining term must hold; no terms means always true
    All(Vec<CompiledTerm>),
}

/// Compiled disjunction of conjunctive clauses
#[derive(Debug, Clone)]
pub struct EventFilter {
    clauses: Vec<CompiledClause>,
}

impl EventFilter {
    /// Resolve `clauses` against `dictionary`
    ///
    /// Never fails: unknown fields and values degrade to terms that are
    /// always false (positive) or always true (negated).
    ///
    /// # Example
    ///
    /// ```
    /// use trailstore_core::DictionaryBuilder;
    /// use trailstore_query::{EventFilter, FilterTerm};
    ///
    /// let mut dict = DictionaryBuilder::new(&["action"]).unwrap();
    /// let click = dict.intern_at(0, b"click").unwrap();
    /// let dict = dict.finish();
    ///
    /// let filter = EventFilter::compile(&dict, &[vec![FilterTerm::eq("action", "click")]]);
    /// assert!(filter.matches_values(&[click]));
    /// assert!(!filter.matches_values(&[0]));
    /// ```
    pub fn compile(dictionary: &Dictionary, clauses: &[Vec<FilterTerm>]) -> Self {
        let compiled: Vec<CompiledClause> = clauses
            .iter()
            .map(|clause| Self::compile_clause(dictionary, clause))
            .collect();

        debug!(
            clauses = compiled.len(),
            never = compiled
                .iter()
                .filter(|c| matches!(c, CompiledClause::Never))
                .count(),
            "Compiled event filter"
        );
        Self { clauses: compiled }
    }

    fn compile_clause(dictionary: &Dictionary, terms: &[FilterTerm]) -> CompiledClause {
        if terms.is_empty() {
            return CompiledClause::Never;
        }
        let mut compiled = Vec::with_capacity(terms.len());
        for term in terms {
            let resolved = dictionary
                .item_by_name(&term.field, &term.value)
                .and_then(|item| item.field_of().user_index().map(|index| (item, index)));
            match resolved {
                Some((item, index)) => compiled.push(CompiledTerm {
                    item,
                    index,
                    negated: term.negated,
                }),
                None if term.negated => {}
                None => return CompiledClause::Never,
            }
        }
        CompiledClause::All(compiled)
    }

    /// Number of clauses
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Evaluate against an arbitrary item set
    pub fn matches(&self, items: &[ItemId]) -> bool {
        self.clauses.iter().any(|clause| match clause {
            CompiledClause::Never => false,
            CompiledClause::All(terms) => terms.iter().all(|t| t.matches_items(items)),
        })
    }

    /// Evaluate against decoded value indexes, one per user field
    ///
    /// Equivalent to [`EventFilter::matches`] on the event's items, without
    /// materializing them.
    #[inline]
    pub fn matches_values(&self, values: &[u32]) -> bool {
        self.clauses.iter().any(|clause| match clause {
            CompiledClause::Never => false,
            CompiledClause::All(terms) => terms.iter().all(|t| t.matches_values(values)),
        })
    }
}
