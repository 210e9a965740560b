use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::produce::{BoxProducer, Producer, PullState};
use crate::SeqError;

/// Shared, append-only cache over a one-shot producer; only reads past the
/// high-water mark pull.
pub(crate) struct Tape<T> {
    producer: RefCell<Option<BoxProducer<T>>>,
    cache: RefCell<Vec<T>>,
    state: Cell<PullState>,
    fault: RefCell<Option<SeqError>>,
}

impl<T: Clone> Tape<T> {
    pub(crate) fn new(producer: BoxProducer<T>) -> Self {
        Tape {
            producer: RefCell::new(Some(producer)),
            cache: RefCell::new(Vec::new()),
            state: Cell::new(PullState::NotStarted),
            fault: RefCell::new(None),
        }
    }

    /// A stored fault re-surfaces for every read past the cached prefix; the
    /// prefix itself stays readable.
    pub(crate) fn fetch(&self, pos: usize) -> Result<Option<T>, SeqError> {
        loop {
            let cached = self.cache.borrow().get(pos).cloned();
            if let Some(value) = cached {
                return Ok(Some(value));
            }
            match self.state.get() {
                PullState::Completed => return Ok(None),
                PullState::Failed => {
                    let fault = self.fault.borrow().clone();
                    return Err(fault
                        .unwrap_or_else(|| SeqError::Producer("producer failed".to_string())));
                }
                PullState::NotStarted | PullState::Suspended(_) => self.pull_once()?,
            }
        }
    }

    fn pull_once(&self) -> Result<(), SeqError> {
        let pulled = {
            let mut slot = self.producer.borrow_mut();
            match slot.as_mut() {
                Some(producer) => producer.pull(),
                None => Ok(None),
            }
        };
        match pulled {
            Ok(Some(value)) => {
                let mut cache = self.cache.borrow_mut();
                cache.push(value);
                self.state.set(PullState::Suspended(cache.len()));
                Ok(())
            }
            Ok(None) => {
                self.state.set(PullState::Completed);
                self.producer.borrow_mut().take();
                Ok(())
            }
            Err(fault) => {
                self.state.set(PullState::Failed);
                *self.fault.borrow_mut() = Some(fault.clone());
                self.producer.borrow_mut().take();
                Err(fault)
            }
        }
    }

    pub(crate) fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// Position tracker over a shared tape. Cloning yields an independent
/// position over the same tape.
pub struct Cursor<T> {
    tape: Rc<Tape<T>>,
    pos: usize,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Cursor {
            tape: self.tape.clone(),
            pos: self.pos,
        }
    }
}

impl<T: Clone> Cursor<T> {
    pub fn over(producer: impl Producer<T> + 'static) -> Self {
        Cursor::on_tape(Rc::new(Tape::new(Box::new(producer))))
    }

    pub(crate) fn on_tape(tape: Rc<Tape<T>>) -> Self {
        Cursor { tape, pos: 0 }
    }

    /// `None` past the end.
    pub fn current(&self) -> Result<Option<T>, SeqError> {
        self.tape.fetch(self.pos)
    }

    pub fn key(&self) -> usize {
        self.pos
    }

    pub fn next(&mut self) {
        self.pos += 1;
    }

    /// Resets to the start without re-pulling anything.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    pub fn valid(&self) -> Result<bool, SeqError> {
        Ok(self.current()?.is_some())
    }

    /// Elements recorded on the shared tape so far.
    pub fn cached_len(&self) -> usize {
        self.tape.cached_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::produce::{from_fn, from_iter};
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_producer(
        items: Vec<i64>,
        pulls: Rc<Cell<usize>>,
    ) -> impl Producer<i64> + 'static {
        let mut iter = items.into_iter();
        from_fn(move || {
            pulls.set(pulls.get() + 1);
            Ok(iter.next())
        })
    }

    #[test]
    fn partial_read_then_full_reread_yields_prefix_plus_suffix() {
        let pulls = Rc::new(Cell::new(0));
        let mut cursor = Cursor::over(counting_producer(vec![1, 2, 3, 4, 5], pulls.clone()));

        let mut prefix = Vec::new();
        while cursor.key() < 3 {
            prefix.push(cursor.current().unwrap().unwrap());
            cursor.next();
        }
        assert_eq!(prefix, vec![1, 2, 3]);

        cursor.rewind();
        let mut all = Vec::new();
        while let Some(value) = cursor.current().unwrap() {
            all.push(value);
            cursor.next();
        }
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
        // 5 elements plus the pull that observed completion.
        assert_eq!(pulls.get(), 6);
    }

    #[test]
    fn nested_self_iteration_yields_the_cross_product() {
        let cursor = Cursor::over(from_iter(vec!['a', 'b', 'c']));
        let mut pairs = Vec::new();

        let mut outer = cursor.clone();
        while outer.valid().unwrap() {
            let left = outer.current().unwrap().unwrap();
            let mut inner = cursor.clone();
            while inner.valid().unwrap() {
                pairs.push((left, inner.current().unwrap().unwrap()));
                inner.next();
            }
            outer.next();
        }

        let expected: Vec<(char, char)> = "abc"
            .chars()
            .flat_map(|a| "abc".chars().map(move |b| (a, b)))
            .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn independent_cursors_share_one_monotone_view() {
        let pulls = Rc::new(Cell::new(0));
        let first = Cursor::over(counting_producer(vec![10, 20, 30], pulls.clone()));
        let mut second = first.clone();

        assert_eq!(first.current().unwrap(), Some(10));
        second.next();
        assert_eq!(second.current().unwrap(), Some(20));
        // The first cursor replays from cache.
        assert_eq!(first.current().unwrap(), Some(10));
        assert_eq!(pulls.get(), 2);
        assert_eq!(first.cached_len(), 2);
    }

    #[test]
    fn fault_leaves_cached_prefix_readable() {
        let mut count = 0;
        let mut cursor = Cursor::over(from_fn(move || {
            count += 1;
            match count {
                1 => Ok(Some(1)),
                2 => Ok(Some(2)),
                _ => Err(SeqError::Producer("boom".to_string())),
            }
        }));

        assert_eq!(cursor.current().unwrap(), Some(1));
        cursor.next();
        assert_eq!(cursor.current().unwrap(), Some(2));
        cursor.next();
        assert!(cursor.current().is_err());
        // The fault is stored, not retried: the producer is not pulled again.
        assert!(cursor.current().is_err());

        cursor.rewind();
        assert_eq!(cursor.current().unwrap(), Some(1));
        assert_eq!(cursor.cached_len(), 2);
    }
}
