use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

use im::Vector;

use crate::cleanup::CleanupScope;
use crate::produce::BoxProducer;
use crate::tape::{Cursor, Tape};
use crate::SeqError;

use super::Sequence;

pub(crate) trait Stream<T> {
    fn next(&mut self) -> Result<Option<T>, SeqError>;
}

/// A streamed sequence kept flat: one leaf plus a vector of element-wise
/// stages. Deriving a sequence appends a stage; it never nests a stream
/// inside another, so driving the chain costs no stack depth per stage.
#[derive(Clone)]
pub(super) struct Pipeline {
    leaf: Rc<dyn Leaf>,
    stages: Vector<Rc<dyn StageFactory>>,
}

impl Pipeline {
    pub(super) fn from_leaf(leaf: impl Leaf + 'static) -> Self {
        Pipeline {
            leaf: Rc::new(leaf),
            stages: Vector::new(),
        }
    }

    pub(super) fn with(&self, stage: impl StageFactory + 'static) -> Self {
        let mut stages = self.stages.clone();
        stages.push_back(Rc::new(stage));
        Pipeline {
            leaf: self.leaf.clone(),
            stages,
        }
    }

    pub(super) fn open<T: 'static>(&self, scope: &CleanupScope) -> PipelineStream<T> {
        let stages: Vec<Box<dyn Stage>> = self.stages.iter().map(|stage| stage.open()).collect();
        let done = stages.iter().any(|stage| stage.finished());
        PipelineStream {
            base: self.leaf.open(scope),
            stages,
            done,
            _marker: PhantomData,
        }
    }
}

/// Pipeline elements carry type-erased values; the stages re-establish the
/// concrete types they were built with.
pub(super) trait Leaf {
    fn open(&self, scope: &CleanupScope) -> Box<dyn LeafStream>;
}

pub(super) trait LeafStream {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError>;
}

pub(super) enum StepOut {
    Yield(Box<dyn Any>),
    /// Yield this element, then end the traversal without pulling again.
    Last(Box<dyn Any>),
    Skip,
    Stop,
}

pub(super) trait Stage {
    fn apply(&mut self, item: Box<dyn Any>) -> StepOut;
    fn finished(&self) -> bool {
        false
    }
}

pub(super) trait StageFactory {
    fn open(&self) -> Box<dyn Stage>;
}

fn unbox<T: 'static>(item: Box<dyn Any>) -> T {
    match item.downcast::<T>() {
        Ok(value) => *value,
        Err(_) => panic!("pipeline element has the wrong type"),
    }
}

pub(super) struct PipelineStream<T> {
    base: Box<dyn LeafStream>,
    stages: Vec<Box<dyn Stage>>,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Stream<T> for PipelineStream<T> {
    fn next(&mut self) -> Result<Option<T>, SeqError> {
        'pull: while !self.done {
            let mut item = match self.base.next()? {
                Some(item) => item,
                None => break,
            };
            for stage in &mut self.stages {
                match stage.apply(item) {
                    StepOut::Yield(out) => item = out,
                    StepOut::Last(out) => {
                        self.done = true;
                        item = out;
                    }
                    StepOut::Skip => continue 'pull,
                    StepOut::Stop => {
                        self.done = true;
                        continue 'pull;
                    }
                }
            }
            return Ok(Some(unbox(item)));
        }
        self.done = true;
        Ok(None)
    }
}

// ---- leaves ----------------------------------------------------------------

pub(super) struct VecStream<T> {
    items: Vector<T>,
    pos: usize,
}

impl<T> VecStream<T> {
    pub(super) fn new(items: Vector<T>) -> Self {
        VecStream { items, pos: 0 }
    }
}

impl<T: Clone> Stream<T> for VecStream<T> {
    fn next(&mut self) -> Result<Option<T>, SeqError> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        Ok(item)
    }
}

pub(super) struct TapeLeaf<T> {
    tape: Rc<Tape<T>>,
}

impl<T> TapeLeaf<T> {
    pub(super) fn new(tape: Rc<Tape<T>>) -> Self {
        TapeLeaf { tape }
    }
}

impl<T: Clone + 'static> Leaf for TapeLeaf<T> {
    fn open(&self, _scope: &CleanupScope) -> Box<dyn LeafStream> {
        Box::new(TapeStream {
            cursor: Cursor::on_tape(self.tape.clone()),
        })
    }
}

struct TapeStream<T> {
    cursor: Cursor<T>,
}

impl<T: Clone + 'static> LeafStream for TapeStream<T> {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError> {
        let item = self.cursor.current()?;
        if item.is_some() {
            self.cursor.next();
        }
        Ok(item.map(|value| Box::new(value) as Box<dyn Any>))
    }
}

pub(super) struct FactoryLeaf<T> {
    make: Box<dyn Fn(&CleanupScope) -> BoxProducer<T>>,
}

impl<T> FactoryLeaf<T> {
    pub(super) fn new(make: impl Fn(&CleanupScope) -> BoxProducer<T> + 'static) -> Self {
        FactoryLeaf {
            make: Box::new(make),
        }
    }
}

impl<T: 'static> Leaf for FactoryLeaf<T> {
    fn open(&self, scope: &CleanupScope) -> Box<dyn LeafStream> {
        // Each traversal gets its own child scope so one leaf finishing
        // naturally cannot disarm a sibling's cleanup.
        let child = scope.child();
        let producer = (self.make)(&child);
        Box::new(ProducerStream {
            producer,
            scope: child,
            done: false,
        })
    }
}

struct ProducerStream<T> {
    producer: BoxProducer<T>,
    scope: CleanupScope,
    done: bool,
}

impl<T: 'static> LeafStream for ProducerStream<T> {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError> {
        if self.done {
            return Ok(None);
        }
        match self.producer.pull() {
            Ok(Some(value)) => Ok(Some(Box::new(value) as Box<dyn Any>)),
            Ok(None) => {
                self.done = true;
                self.scope.complete();
                Ok(None)
            }
            Err(fault) => {
                self.done = true;
                Err(fault)
            }
        }
    }
}

pub(super) struct FlatMapLeaf<S, T> {
    inner: Sequence<S>,
    func: Rc<dyn Fn(S) -> Sequence<T>>,
}

impl<S, T> FlatMapLeaf<S, T> {
    pub(super) fn new(inner: Sequence<S>, func: impl Fn(S) -> Sequence<T> + 'static) -> Self {
        FlatMapLeaf {
            inner,
            func: Rc::new(func),
        }
    }
}

impl<S: Clone + 'static, T: Clone + 'static> Leaf for FlatMapLeaf<S, T> {
    fn open(&self, scope: &CleanupScope) -> Box<dyn LeafStream> {
        Box::new(FlatMapStream {
            outer: self.inner.open_stream(scope),
            func: self.func.clone(),
            scope: scope.clone(),
            current: None,
        })
    }
}

struct FlatMapStream<S, T> {
    outer: Box<dyn Stream<S>>,
    func: Rc<dyn Fn(S) -> Sequence<T>>,
    scope: CleanupScope,
    current: Option<Box<dyn Stream<T>>>,
}

impl<S: Clone + 'static, T: Clone + 'static> LeafStream for FlatMapStream<S, T> {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError> {
        loop {
            if let Some(stream) = self.current.as_mut() {
                if let Some(value) = stream.next()? {
                    return Ok(Some(Box::new(value) as Box<dyn Any>));
                }
                self.current = None;
            }
            match self.outer.next()? {
                Some(item) => {
                    let inner = (self.func)(item);
                    self.current = Some(inner.open_stream(&self.scope));
                }
                None => return Ok(None),
            }
        }
    }
}

pub(super) struct ChainLeaf<T> {
    first: Sequence<T>,
    second: Sequence<T>,
}

impl<T> ChainLeaf<T> {
    pub(super) fn new(first: Sequence<T>, second: Sequence<T>) -> Self {
        ChainLeaf { first, second }
    }
}

impl<T: Clone + 'static> Leaf for ChainLeaf<T> {
    fn open(&self, scope: &CleanupScope) -> Box<dyn LeafStream> {
        Box::new(ChainStream {
            first: Some(self.first.open_stream(scope)),
            second_seq: self.second.clone(),
            second: None,
            scope: scope.clone(),
        })
    }
}

struct ChainStream<T> {
    first: Option<Box<dyn Stream<T>>>,
    second_seq: Sequence<T>,
    // Opened on demand: the second leg acquires nothing until reached.
    second: Option<Box<dyn Stream<T>>>,
    scope: CleanupScope,
}

impl<T: Clone + 'static> LeafStream for ChainStream<T> {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError> {
        if let Some(first) = self.first.as_mut() {
            if let Some(value) = first.next()? {
                return Ok(Some(Box::new(value) as Box<dyn Any>));
            }
            self.first = None;
        }
        if self.second.is_none() {
            self.second = Some(self.second_seq.open_stream(&self.scope));
        }
        match self.second.as_mut() {
            Some(second) => Ok(second
                .next()?
                .map(|value| Box::new(value) as Box<dyn Any>)),
            None => Ok(None),
        }
    }
}

pub(super) struct ZipLeaf<A, B> {
    left: Sequence<A>,
    right: Sequence<B>,
}

impl<A, B> ZipLeaf<A, B> {
    pub(super) fn new(left: Sequence<A>, right: Sequence<B>) -> Self {
        ZipLeaf { left, right }
    }
}

impl<A: Clone + 'static, B: Clone + 'static> Leaf for ZipLeaf<A, B> {
    fn open(&self, scope: &CleanupScope) -> Box<dyn LeafStream> {
        Box::new(ZipStream {
            left: self.left.open_stream(scope),
            right: self.right.open_stream(scope),
        })
    }
}

struct ZipStream<A, B> {
    left: Box<dyn Stream<A>>,
    right: Box<dyn Stream<B>>,
}

impl<A: Clone + 'static, B: Clone + 'static> LeafStream for ZipStream<A, B> {
    fn next(&mut self) -> Result<Option<Box<dyn Any>>, SeqError> {
        match (self.left.next()?, self.right.next()?) {
            (Some(left), Some(right)) => Ok(Some(Box::new((left, right)) as Box<dyn Any>)),
            _ => Ok(None),
        }
    }
}

// ---- stages ----------------------------------------------------------------

pub(super) struct MapStageFactory<S, T> {
    func: Rc<dyn Fn(S) -> T>,
}

impl<S, T> MapStageFactory<S, T> {
    pub(super) fn new(func: impl Fn(S) -> T + 'static) -> Self {
        MapStageFactory {
            func: Rc::new(func),
        }
    }
}

impl<S: 'static, T: 'static> StageFactory for MapStageFactory<S, T> {
    fn open(&self) -> Box<dyn Stage> {
        Box::new(MapStage {
            func: self.func.clone(),
        })
    }
}

struct MapStage<S, T> {
    func: Rc<dyn Fn(S) -> T>,
}

impl<S: 'static, T: 'static> Stage for MapStage<S, T> {
    fn apply(&mut self, item: Box<dyn Any>) -> StepOut {
        StepOut::Yield(Box::new((self.func)(unbox::<S>(item))))
    }
}

pub(super) struct FilterStageFactory<T> {
    pred: Rc<dyn Fn(&T) -> bool>,
}

impl<T> FilterStageFactory<T> {
    pub(super) fn new(pred: impl Fn(&T) -> bool + 'static) -> Self {
        FilterStageFactory {
            pred: Rc::new(pred),
        }
    }
}

impl<T: 'static> StageFactory for FilterStageFactory<T> {
    fn open(&self) -> Box<dyn Stage> {
        Box::new(FilterStage {
            pred: self.pred.clone(),
        })
    }
}

struct FilterStage<T> {
    pred: Rc<dyn Fn(&T) -> bool>,
}

impl<T: 'static> Stage for FilterStage<T> {
    fn apply(&mut self, item: Box<dyn Any>) -> StepOut {
        let keep = match item.downcast_ref::<T>() {
            Some(value) => (self.pred)(value),
            None => panic!("pipeline element has the wrong type"),
        };
        if keep {
            StepOut::Yield(item)
        } else {
            StepOut::Skip
        }
    }
}

pub(super) struct TakeStageFactory {
    limit: usize,
}

impl TakeStageFactory {
    pub(super) fn new(limit: usize) -> Self {
        TakeStageFactory { limit }
    }
}

impl StageFactory for TakeStageFactory {
    fn open(&self) -> Box<dyn Stage> {
        Box::new(TakeStage {
            remaining: self.limit,
        })
    }
}

struct TakeStage {
    remaining: usize,
}

impl Stage for TakeStage {
    fn apply(&mut self, item: Box<dyn Any>) -> StepOut {
        if self.remaining == 0 {
            return StepOut::Stop;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            // Ending here keeps the element that satisfied the limit from
            // costing one extra pull on the next call.
            StepOut::Last(item)
        } else {
            StepOut::Yield(item)
        }
    }

    fn finished(&self) -> bool {
        self.remaining == 0
    }
}

pub(super) struct SkipStageFactory {
    count: usize,
}

impl SkipStageFactory {
    pub(super) fn new(count: usize) -> Self {
        SkipStageFactory { count }
    }
}

impl StageFactory for SkipStageFactory {
    fn open(&self) -> Box<dyn Stage> {
        Box::new(SkipStage {
            to_skip: self.count,
        })
    }
}

struct SkipStage {
    to_skip: usize,
}

impl Stage for SkipStage {
    fn apply(&mut self, item: Box<dyn Any>) -> StepOut {
        if self.to_skip > 0 {
            self.to_skip -= 1;
            StepOut::Skip
        } else {
            StepOut::Yield(item)
        }
    }
}
