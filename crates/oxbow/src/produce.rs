use crate::SeqError;

/// A single-pass, ordered element source. `Ok(None)` is natural completion;
/// after an `Err` the producer is dead and never retried.
pub trait Producer<T> {
    fn pull(&mut self) -> Result<Option<T>, SeqError>;
}

pub(crate) type BoxProducer<T> = Box<dyn Producer<T>>;

/// Pull-state machine recorded next to a producer's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PullState {
    NotStarted,
    /// Suspended between elements; holds the index of the next pull.
    Suspended(usize),
    Completed,
    Failed,
}

pub struct FnProducer<F> {
    func: F,
}

pub fn from_fn<T, F>(func: F) -> FnProducer<F>
where
    F: FnMut() -> Result<Option<T>, SeqError>,
{
    FnProducer { func }
}

impl<T, F> Producer<T> for FnProducer<F>
where
    F: FnMut() -> Result<Option<T>, SeqError>,
{
    fn pull(&mut self) -> Result<Option<T>, SeqError> {
        (self.func)()
    }
}

pub struct IterProducer<I> {
    iter: I,
}

pub fn from_iter<I: IntoIterator>(iter: I) -> IterProducer<I::IntoIter> {
    IterProducer {
        iter: iter.into_iter(),
    }
}

impl<I: Iterator> Producer<I::Item> for IterProducer<I> {
    fn pull(&mut self) -> Result<Option<I::Item>, SeqError> {
        Ok(self.iter.next())
    }
}
