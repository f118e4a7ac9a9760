//! Record sources.
//!
//! A source is something that can be opened for a single pass, producing a
//! pull-based sequence of records (`Iterator::next` is "give me the next record
//! or tell me the stream is over"). Opening it again re-reads from scratch.
//!
//! Records are opaque here: nothing in this crate inspects their fields except
//! through caller-supplied closures.

use std::convert::Infallible;
use std::iter::{Cloned, Map};
use std::slice;

/// A re-openable, single-pass record stream.
pub trait RecordSource {
    /// The record type produced by each pass.
    type Record;
    /// The failure type of pulling the next record.
    type Error;
    /// The iterator for one pass.
    type Records<'a>: Iterator<Item = Result<Self::Record, Self::Error>>
    where
        Self: 'a;

    /// Open a fresh pass over the source.
    fn records(&self) -> Self::Records<'_>;
}

type CloneOk<'a, T> = Map<Cloned<slice::Iter<'a, T>>, fn(T) -> Result<T, Infallible>>;

impl<T: Clone> RecordSource for [T] {
    type Record = T;
    type Error = Infallible;
    type Records<'a>
        = CloneOk<'a, T>
    where
        Self: 'a;

    fn records(&self) -> Self::Records<'_> {
        self.iter().cloned().map(Ok as fn(T) -> Result<T, Infallible>)
    }
}

impl<T: Clone> RecordSource for Vec<T> {
    type Record = T;
    type Error = Infallible;
    type Records<'a>
        = CloneOk<'a, T>
    where
        Self: 'a;

    fn records(&self) -> Self::Records<'_> {
        self.as_slice().records()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    type Record = S::Record;
    type Error = S::Error;
    type Records<'a>
        = S::Records<'a>
    where
        Self: 'a;

    fn records(&self) -> Self::Records<'_> {
        (**self).records()
    }
}

/// A source backed by a closure that reopens the underlying corpus.
///
/// ```
/// use jobsample::source::{FnSource, RecordSource};
///
/// let src = FnSource::new(|| (0..3).map(Ok::<_, std::io::Error>));
/// let first: Vec<i32> = src.records().map(Result::unwrap).collect();
/// let again: Vec<i32> = src.records().map(Result::unwrap).collect();
/// assert_eq!(first, again);
/// ```
#[derive(Debug, Clone)]
pub struct FnSource<F> {
    open: F,
}

impl<F> FnSource<F> {
    /// Wrap a closure returning a fresh record stream on each call.
    pub fn new(open: F) -> Self {
        Self { open }
    }
}

impl<F, I, R, E> RecordSource for FnSource<F>
where
    F: Fn() -> I,
    I: IntoIterator<Item = Result<R, E>>,
{
    type Record = R;
    type Error = E;
    type Records<'a>
        = I::IntoIter
    where
        Self: 'a;

    fn records(&self) -> Self::Records<'_> {
        (self.open)().into_iter()
    }
}
