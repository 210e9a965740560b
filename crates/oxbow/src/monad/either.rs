use super::Thunk;

/// The forced shape of an [`Either`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch<L, R> {
    Left(L),
    Right(R),
}

/// One of two possible branches, right-biased.
#[derive(Clone)]
pub struct Either<L, R> {
    thunk: Thunk<Branch<L, R>>,
}

impl<L: Clone + 'static, R: Clone + 'static> Either<L, R> {
    pub fn left(value: L) -> Self {
        Either {
            thunk: Thunk::eager(Branch::Left(value)),
        }
    }

    pub fn right(value: R) -> Self {
        Either {
            thunk: Thunk::eager(Branch::Right(value)),
        }
    }

    pub fn defer(make: impl Fn() -> Branch<L, R> + 'static) -> Self {
        Either {
            thunk: Thunk::memo(make),
        }
    }

    pub fn lazy(make: impl Fn() -> Branch<L, R> + 'static) -> Self {
        Either {
            thunk: Thunk::lazy(make),
        }
    }

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(R) -> U + 'static) -> Either<L, U> {
        Either {
            thunk: self.thunk.map(move |branch| match branch {
                Branch::Left(left) => Branch::Left(left),
                Branch::Right(right) => Branch::Right(func(right)),
            }),
        }
    }

    pub fn map_left<M: Clone + 'static>(&self, func: impl Fn(L) -> M + 'static) -> Either<M, R> {
        Either {
            thunk: self.thunk.map(move |branch| match branch {
                Branch::Left(left) => Branch::Left(func(left)),
                Branch::Right(right) => Branch::Right(right),
            }),
        }
    }

    pub fn flat_map<U: Clone + 'static>(
        &self,
        func: impl Fn(R) -> Either<L, U> + 'static,
    ) -> Either<L, U> {
        Either {
            thunk: self.thunk.flat_map(move |branch| match branch {
                Branch::Left(left) => Thunk::eager(Branch::Left(left)),
                Branch::Right(right) => func(right).thunk,
            }),
        }
    }

    pub fn swap(&self) -> Either<R, L> {
        Either {
            thunk: self.thunk.map(|branch| match branch {
                Branch::Left(left) => Branch::Right(left),
                Branch::Right(right) => Branch::Left(right),
            }),
        }
    }

    pub fn fold<X>(&self, on_left: impl FnOnce(L) -> X, on_right: impl FnOnce(R) -> X) -> X {
        match self.thunk.force() {
            Branch::Left(left) => on_left(left),
            Branch::Right(right) => on_right(right),
        }
    }

    pub fn to_branch(&self) -> Branch<L, R> {
        self.thunk.force()
    }

    pub fn memoize(&self) -> Either<L, R> {
        Either {
            thunk: self.thunk.memoize(),
        }
    }
}
