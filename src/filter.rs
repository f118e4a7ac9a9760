//! Record filtering.
//!
//! `RecordFilter` wraps a source and an ordered list of predicates and yields
//! only the records every predicate accepts, in source order. It is itself a
//! [`RecordSource`], so a filtered corpus can be sampled over and over.
//!
//! Predicates run in insertion order and stop at the first rejection. A
//! predicate error is yielded in place of the record it was evaluating.

use std::fmt;

use tracing::trace;

use crate::source::RecordSource;

/// A boxed record predicate that may fail with the source's error type.
pub type Predicate<'p, R, E> = Box<dyn Fn(&R) -> Result<bool, E> + 'p>;

/// A source that drops records failing any of its predicates.
pub struct RecordFilter<'p, S: RecordSource> {
    source: S,
    predicates: Vec<Predicate<'p, S::Record, S::Error>>,
}

impl<'p, S: RecordSource> RecordFilter<'p, S> {
    /// Build a filter from a source and an ordered list of predicates.
    pub fn new(source: S, predicates: Vec<Predicate<'p, S::Record, S::Error>>) -> Self {
        Self { source, predicates }
    }

    /// A filter with no predicates; passes every record through.
    pub fn pass_through(source: S) -> Self {
        Self::new(source, Vec::new())
    }

    /// Append an infallible predicate.
    pub fn with<P>(self, predicate: P) -> Self
    where
        P: Fn(&S::Record) -> bool + 'p,
    {
        self.with_fallible(move |r| Ok(predicate(r)))
    }

    /// Append a predicate whose evaluation may fail.
    pub fn with_fallible<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&S::Record) -> Result<bool, S::Error> + 'p,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Number of predicates applied to each record.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// True when no predicates are installed.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    fn accepts(&self, record: &S::Record) -> Result<bool, S::Error> {
        for predicate in &self.predicates {
            if !predicate(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<S: RecordSource + fmt::Debug> fmt::Debug for RecordFilter<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFilter")
            .field("source", &self.source)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

impl<'p, S: RecordSource> RecordSource for RecordFilter<'p, S> {
    type Record = S::Record;
    type Error = S::Error;
    type Records<'a>
        = Filtered<'a, 'p, S>
    where
        Self: 'a;

    fn records(&self) -> Self::Records<'_> {
        Filtered {
            filter: self,
            inner: self.source.records(),
            skipped: 0,
        }
    }
}

/// One pass over a [`RecordFilter`].
pub struct Filtered<'a, 'p, S: RecordSource + 'a> {
    filter: &'a RecordFilter<'p, S>,
    inner: S::Records<'a>,
    skipped: usize,
}

impl<'a, 'p, S: RecordSource + 'a> Filtered<'a, 'p, S> {
    /// Records rejected so far in this pass.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a, 'p, S: RecordSource + 'a> Iterator for Filtered<'a, 'p, S> {
    type Item = Result<S::Record, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.inner.next()? {
                Ok(r) => r,
                Err(e) => return Some(Err(e)),
            };
            match self.filter.accepts(&record) {
                Ok(true) => return Some(Ok(record)),
                Ok(false) => {
                    self.skipped += 1;
                    trace!(skipped = self.skipped, "record rejected by filter");
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
