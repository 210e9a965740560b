use std::cell::RefCell;
use std::rc::Rc;

pub mod either;
pub mod maybe;
pub mod trial;
pub mod validated;

#[cfg(test)]
mod tests;

/// Three variants, one protocol: eager, lazy (recomputed per force), memo
/// (computed at most once). Every wrapper family is a newtype over this.
pub(crate) enum Thunk<A> {
    Eager(A),
    Lazy(Rc<dyn Fn() -> A>),
    Memo {
        make: Rc<dyn Fn() -> A>,
        cell: Rc<RefCell<Option<A>>>,
    },
}

impl<A: Clone> Clone for Thunk<A> {
    fn clone(&self) -> Self {
        match self {
            Thunk::Eager(value) => Thunk::Eager(value.clone()),
            Thunk::Lazy(make) => Thunk::Lazy(make.clone()),
            Thunk::Memo { make, cell } => Thunk::Memo {
                make: make.clone(),
                cell: cell.clone(),
            },
        }
    }
}

impl<A: Clone + 'static> Thunk<A> {
    pub(crate) fn eager(value: A) -> Self {
        Thunk::Eager(value)
    }

    pub(crate) fn lazy(make: impl Fn() -> A + 'static) -> Self {
        Thunk::Lazy(Rc::new(make))
    }

    pub(crate) fn memo(make: impl Fn() -> A + 'static) -> Self {
        Thunk::Memo {
            make: Rc::new(make),
            cell: Rc::new(RefCell::new(None)),
        }
    }

    pub(crate) fn force(&self) -> A {
        match self {
            Thunk::Eager(value) => value.clone(),
            Thunk::Lazy(make) => make(),
            Thunk::Memo { make, cell } => {
                if let Some(value) = cell.borrow().as_ref() {
                    return value.clone();
                }
                let value = make();
                *cell.borrow_mut() = Some(value.clone());
                value
            }
        }
    }

    /// Composition keeps the variant: mapping a memo value yields a memo
    /// value whose factory forces the predecessor, sharing its cell.
    pub(crate) fn map<B: Clone + 'static>(&self, func: impl Fn(A) -> B + 'static) -> Thunk<B> {
        match self {
            Thunk::Eager(value) => Thunk::Eager(func(value.clone())),
            Thunk::Lazy(make) => {
                let make = make.clone();
                Thunk::lazy(move || func(make()))
            }
            Thunk::Memo { .. } => {
                let inner = self.clone();
                Thunk::memo(move || func(inner.force()))
            }
        }
    }

    pub(crate) fn flat_map<B: Clone + 'static>(
        &self,
        func: impl Fn(A) -> Thunk<B> + 'static,
    ) -> Thunk<B> {
        match self {
            Thunk::Eager(value) => func(value.clone()),
            Thunk::Lazy(make) => {
                let make = make.clone();
                Thunk::lazy(move || func(make()).force())
            }
            Thunk::Memo { .. } => {
                let inner = self.clone();
                Thunk::memo(move || func(inner.force()).force())
            }
        }
    }

    /// Forces the chain once, populating every memo cell along it. Idempotent.
    pub(crate) fn memoize(&self) -> Thunk<A> {
        Thunk::Eager(self.force())
    }

    /// Eager meets eager eagerly; anything else defers into a memo cell.
    pub(crate) fn zip_with<B: Clone + 'static, C: Clone + 'static>(
        left: &Thunk<A>,
        right: &Thunk<B>,
        func: impl Fn(A, B) -> C + 'static,
    ) -> Thunk<C> {
        if let (Thunk::Eager(a), Thunk::Eager(b)) = (left, right) {
            return Thunk::Eager(func(a.clone(), b.clone()));
        }
        let left = left.clone();
        let right = right.clone();
        Thunk::memo(move || func(left.force(), right.force()))
    }
}

/// A single plain value behind the laziness protocol.
#[derive(Clone)]
pub struct Deferred<T> {
    thunk: Thunk<T>,
}

impl<T: Clone + 'static> Deferred<T> {
    pub fn eager(value: T) -> Self {
        Deferred {
            thunk: Thunk::eager(value),
        }
    }

    /// Computed at most once, on first observation.
    pub fn of(make: impl Fn() -> T + 'static) -> Self {
        Deferred {
            thunk: Thunk::memo(make),
        }
    }

    /// Recomputed from scratch on every observation.
    pub fn lazy(make: impl Fn() -> T + 'static) -> Self {
        Deferred {
            thunk: Thunk::lazy(make),
        }
    }

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(T) -> U + 'static) -> Deferred<U> {
        Deferred {
            thunk: self.thunk.map(func),
        }
    }

    pub fn flat_map<U: Clone + 'static>(
        &self,
        func: impl Fn(T) -> Deferred<U> + 'static,
    ) -> Deferred<U> {
        Deferred {
            thunk: self.thunk.flat_map(move |value| func(value).thunk),
        }
    }

    pub fn get(&self) -> T {
        self.thunk.force()
    }

    pub fn memoize(&self) -> Deferred<T> {
        Deferred {
            thunk: self.thunk.memoize(),
        }
    }
}
