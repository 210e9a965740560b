use std::hash::Hash;
use std::rc::Rc;

use im::{HashMap, Vector};

use crate::cleanup::{CleanupScope, ScopeGuard};
use crate::collections::{SeqMap, SeqSet};
use crate::produce::Producer;
use crate::tape::Tape;
use crate::SeqError;

mod sources;

use self::sources::{
    ChainLeaf, FactoryLeaf, FilterStageFactory, FlatMapLeaf, MapStageFactory, Pipeline,
    SkipStageFactory, Stream, TakeStageFactory, TapeLeaf, VecStream, ZipLeaf,
};

/// An immutable sequence, materialized or streamed. Transformations never
/// pull; terminals drive the chain.
pub struct Sequence<T> {
    repr: Repr<T>,
}

enum Repr<T> {
    Materialized(Vector<T>),
    Streamed(Pipeline),
}

impl<T: Clone> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Materialized(items) => Repr::Materialized(items.clone()),
            Repr::Streamed(pipeline) => Repr::Streamed(pipeline.clone()),
        };
        Sequence { repr }
    }
}

impl<T: Clone + 'static> Sequence<T> {
    pub fn empty() -> Self {
        Sequence::from_vector(Vector::new())
    }

    pub fn of(items: impl IntoIterator<Item = T>) -> Self {
        Sequence::from_vector(items.into_iter().collect())
    }

    pub fn from_vector(items: Vector<T>) -> Self {
        Sequence {
            repr: Repr::Materialized(items),
        }
    }

    /// Backed by a one-shot producer, driven at most once; every derived
    /// view and repeated read replays the shared tape.
    pub fn deferred(producer: impl Producer<T> + 'static) -> Self {
        let tape = Rc::new(Tape::new(Box::new(producer)));
        Sequence::streamed(Pipeline::from_leaf(TapeLeaf::new(tape)))
    }

    /// Backed by a producer factory, invoked afresh per traversal; the
    /// factory may register a release action on the traversal's scope.
    pub fn lazy(
        factory: impl Fn(&CleanupScope) -> Box<dyn Producer<T>> + 'static,
    ) -> Self {
        Sequence::streamed(Pipeline::from_leaf(FactoryLeaf::new(factory)))
    }

    fn streamed(pipeline: Pipeline) -> Self {
        Sequence {
            repr: Repr::Streamed(pipeline),
        }
    }

    pub(crate) fn open_stream(&self, scope: &CleanupScope) -> Box<dyn Stream<T>> {
        match &self.repr {
            Repr::Materialized(items) => Box::new(VecStream::new(items.clone())),
            Repr::Streamed(pipeline) => Box::new(pipeline.open::<T>(scope)),
        }
    }

    // ---- transformations -------------------------------------------------

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(T) -> U + 'static) -> Sequence<U> {
        match &self.repr {
            Repr::Materialized(items) => {
                Sequence::from_vector(items.iter().map(|item| func(item.clone())).collect())
            }
            Repr::Streamed(pipeline) => {
                Sequence::streamed(pipeline.with(MapStageFactory::new(func)))
            }
        }
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Sequence<T> {
        match &self.repr {
            Repr::Materialized(items) => Sequence::from_vector(
                items.iter().filter(|item| pred(*item)).cloned().collect(),
            ),
            Repr::Streamed(pipeline) => {
                Sequence::streamed(pipeline.with(FilterStageFactory::new(pred)))
            }
        }
    }

    /// Lazy regardless of representation: inner sequences are opened only
    /// when the traversal reaches them.
    pub fn flat_map<U: Clone + 'static>(
        &self,
        func: impl Fn(T) -> Sequence<U> + 'static,
    ) -> Sequence<U> {
        Sequence::streamed(Pipeline::from_leaf(FlatMapLeaf::new(self.clone(), func)))
    }

    pub fn take(&self, count: usize) -> Sequence<T> {
        match &self.repr {
            Repr::Materialized(items) => {
                Sequence::from_vector(items.iter().take(count).cloned().collect())
            }
            Repr::Streamed(pipeline) => {
                Sequence::streamed(pipeline.with(TakeStageFactory::new(count)))
            }
        }
    }

    pub fn skip(&self, count: usize) -> Sequence<T> {
        match &self.repr {
            Repr::Materialized(items) => {
                Sequence::from_vector(items.iter().skip(count).cloned().collect())
            }
            Repr::Streamed(pipeline) => {
                Sequence::streamed(pipeline.with(SkipStageFactory::new(count)))
            }
        }
    }

    pub fn append(&self, item: T) -> Sequence<T> {
        match &self.repr {
            Repr::Materialized(items) => {
                let mut out = items.clone();
                out.push_back(item);
                Sequence::from_vector(out)
            }
            Repr::Streamed(_) => self.chain(&Sequence::of(std::iter::once(item))),
        }
    }

    pub fn chain(&self, other: &Sequence<T>) -> Sequence<T> {
        match (&self.repr, &other.repr) {
            (Repr::Materialized(left), Repr::Materialized(right)) => {
                let mut out = left.clone();
                out.append(right.clone());
                Sequence::from_vector(out)
            }
            _ => Sequence::streamed(Pipeline::from_leaf(ChainLeaf::new(
                self.clone(),
                other.clone(),
            ))),
        }
    }

    pub fn zip<U: Clone + 'static>(&self, other: &Sequence<U>) -> Sequence<(T, U)> {
        match (&self.repr, &other.repr) {
            (Repr::Materialized(left), Repr::Materialized(right)) => Sequence::from_vector(
                left.iter()
                    .cloned()
                    .zip(right.iter().cloned())
                    .collect(),
            ),
            _ => Sequence::streamed(Pipeline::from_leaf(ZipLeaf::new(
                self.clone(),
                other.clone(),
            ))),
        }
    }

    // ---- terminal operations ---------------------------------------------

    /// Fallible iterator over one traversal. Dropping it before the end
    /// counts as abandonment and fires the scope's cleanup.
    pub fn iter(&self) -> SeqIter<T> {
        let guard = ScopeGuard::enter();
        let stream = self.open_stream(guard.scope());
        SeqIter {
            stream,
            guard: Some(guard),
            finished: false,
        }
    }

    pub fn to_list(&self) -> Result<Vector<T>, SeqError> {
        let mut out = Vector::new();
        for item in self.iter() {
            out.push_back(item?);
        }
        Ok(out)
    }

    pub fn to_vec(&self) -> Result<Vec<T>, SeqError> {
        let mut out = Vec::new();
        for item in self.iter() {
            out.push(item?);
        }
        Ok(out)
    }

    pub fn for_each(&self, mut func: impl FnMut(T)) -> Result<(), SeqError> {
        for item in self.iter() {
            func(item?);
        }
        Ok(())
    }

    pub fn fold<A>(&self, init: A, mut func: impl FnMut(A, T) -> A) -> Result<A, SeqError> {
        let mut acc = init;
        for item in self.iter() {
            acc = func(acc, item?);
        }
        Ok(acc)
    }

    pub fn reduce(&self, mut func: impl FnMut(T, T) -> T) -> Result<Option<T>, SeqError> {
        let mut acc: Option<T> = None;
        for item in self.iter() {
            let item = item?;
            acc = Some(match acc {
                Some(current) => func(current, item),
                None => item,
            });
        }
        Ok(acc)
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Result<Option<T>, SeqError> {
        for item in self.iter() {
            let item = item?;
            if pred(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    pub fn count(&self) -> Result<usize, SeqError> {
        let mut count = 0;
        for item in self.iter() {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn min(&self) -> Result<Option<T>, SeqError>
    where
        T: Ord,
    {
        self.reduce(|a, b| if b < a { b } else { a })
    }

    pub fn max(&self) -> Result<Option<T>, SeqError>
    where
        T: Ord,
    {
        self.reduce(|a, b| if b > a { b } else { a })
    }

    /// Element-wise equality, forcing both sides as far as the first
    /// difference.
    pub fn equals(&self, other: &Sequence<T>) -> Result<bool, SeqError>
    where
        T: PartialEq,
    {
        let mut left = self.iter();
        let mut right = other.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ok(true),
                (Some(a), Some(b)) => {
                    if a? != b? {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            }
        }
    }

    /// Forces the whole chain once and freezes the result.
    pub fn memoize(&self) -> Result<Sequence<T>, SeqError> {
        Ok(Sequence::from_vector(self.to_list()?))
    }

    // ---- eager reshaping (these force) -----------------------------------

    pub fn sorted(&self) -> Result<Sequence<T>, SeqError>
    where
        T: Ord,
    {
        let mut items = self.to_vec()?;
        items.sort();
        Ok(Sequence::of(items))
    }

    pub fn reversed(&self) -> Result<Sequence<T>, SeqError> {
        let mut items = self.to_vec()?;
        items.reverse();
        Ok(Sequence::of(items))
    }

    /// Keeps the first occurrence of each element, in encounter order.
    pub fn distinct(&self) -> Result<Sequence<T>, SeqError>
    where
        T: Hash + Eq,
    {
        let mut seen = im::HashSet::new();
        let mut out = Vector::new();
        for item in self.iter() {
            let item = item?;
            if !seen.contains(&item) {
                seen.insert(item.clone());
                out.push_back(item);
            }
        }
        Ok(Sequence::from_vector(out))
    }

    pub fn partition(
        &self,
        pred: impl Fn(&T) -> bool,
    ) -> Result<(Sequence<T>, Sequence<T>), SeqError> {
        let mut matched = Vector::new();
        let mut rest = Vector::new();
        for item in self.iter() {
            let item = item?;
            if pred(&item) {
                matched.push_back(item);
            } else {
                rest.push_back(item);
            }
        }
        Ok((
            Sequence::from_vector(matched),
            Sequence::from_vector(rest),
        ))
    }

    pub fn group_by<K>(
        &self,
        key: impl Fn(&T) -> K,
    ) -> Result<SeqMap<K, Sequence<T>>, SeqError>
    where
        K: Hash + Eq + Clone + 'static,
    {
        let mut groups: HashMap<K, Vector<T>> = HashMap::new();
        for item in self.iter() {
            let item = item?;
            let k = key(&item);
            let mut bucket = groups.get(&k).cloned().unwrap_or_else(Vector::new);
            bucket.push_back(item);
            groups.insert(k, bucket);
        }
        Ok(SeqMap::from_entries(
            groups
                .into_iter()
                .map(|(k, items)| (k, Sequence::from_vector(items))),
        ))
    }

    pub fn to_set(&self) -> Result<SeqSet<T>, SeqError>
    where
        T: Hash + Eq,
    {
        SeqSet::from_sequence(self)
    }
}

pub struct SeqIter<T> {
    stream: Box<dyn Stream<T>>,
    guard: Option<ScopeGuard>,
    finished: bool,
}

impl<T: Clone + 'static> Iterator for SeqIter<T> {
    type Item = Result<T, SeqError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.stream.next() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.finished = true;
                if let Some(guard) = self.guard.take() {
                    guard.complete();
                }
                None
            }
            Err(fault) => {
                // The guard stays armed; dropping the iterator releases the
                // traversal's resources.
                self.finished = true;
                Some(Err(fault))
            }
        }
    }
}
