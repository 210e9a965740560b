use std::fmt::Debug;

use super::Thunk;

/// Success or failure carried as data; a failure never escapes as a panic
/// until explicitly unwrapped.
#[derive(Clone)]
pub struct Trial<T, E> {
    thunk: Thunk<Result<T, E>>,
}

impl<T: Clone + 'static, E: Clone + 'static> Trial<T, E> {
    pub fn success(value: T) -> Self {
        Trial {
            thunk: Thunk::eager(Ok(value)),
        }
    }

    pub fn failure(error: E) -> Self {
        Trial {
            thunk: Thunk::eager(Err(error)),
        }
    }

    /// Computed at most once, on first observation.
    pub fn of(make: impl Fn() -> Result<T, E> + 'static) -> Self {
        Trial {
            thunk: Thunk::memo(make),
        }
    }

    pub fn lazy(make: impl Fn() -> Result<T, E> + 'static) -> Self {
        Trial {
            thunk: Thunk::lazy(make),
        }
    }

    pub fn from_result(result: Result<T, E>) -> Self {
        Trial {
            thunk: Thunk::eager(result),
        }
    }

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(T) -> U + 'static) -> Trial<U, E> {
        Trial {
            thunk: self.thunk.map(move |result| result.map(&func)),
        }
    }

    pub fn map_err<F: Clone + 'static>(&self, func: impl Fn(E) -> F + 'static) -> Trial<T, F> {
        Trial {
            thunk: self.thunk.map(move |result| result.map_err(&func)),
        }
    }

    pub fn flat_map<U: Clone + 'static>(
        &self,
        func: impl Fn(T) -> Trial<U, E> + 'static,
    ) -> Trial<U, E> {
        Trial {
            thunk: self.thunk.flat_map(move |result| match result {
                Ok(value) => func(value).thunk,
                Err(error) => Thunk::eager(Err(error)),
            }),
        }
    }

    pub fn recover(&self, func: impl Fn(E) -> T + 'static) -> Trial<T, E> {
        Trial {
            thunk: self.thunk.map(move |result| result.or_else(|e| Ok(func(e)))),
        }
    }

    pub fn or_else(&self, func: impl Fn(E) -> Trial<T, E> + 'static) -> Trial<T, E> {
        Trial {
            thunk: self.thunk.flat_map(move |result| match result {
                Ok(value) => Thunk::eager(Ok(value)),
                Err(error) => func(error).thunk,
            }),
        }
    }

    pub fn fold<R>(&self, on_success: impl FnOnce(T) -> R, on_failure: impl FnOnce(E) -> R) -> R {
        match self.thunk.force() {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }
    }

    pub fn to_result(&self) -> Result<T, E> {
        self.thunk.force()
    }

    /// Re-raises the stored failure.
    pub fn unwrap(&self) -> T
    where
        E: Debug,
    {
        match self.thunk.force() {
            Ok(value) => value,
            Err(error) => panic!("called `unwrap` on a failure: {error:?}"),
        }
    }

    pub fn memoize(&self) -> Trial<T, E> {
        Trial {
            thunk: self.thunk.memoize(),
        }
    }
}
