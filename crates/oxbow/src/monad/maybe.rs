use super::Thunk;

/// An optional value. Composition never forces a deferred or lazy instance;
/// only the observations (`fold`, `get_or_else`, `to_option`) do.
#[derive(Clone)]
pub struct Maybe<T> {
    thunk: Thunk<Option<T>>,
}

impl<T: Clone + 'static> Maybe<T> {
    pub fn just(value: T) -> Self {
        Maybe {
            thunk: Thunk::eager(Some(value)),
        }
    }

    pub fn nothing() -> Self {
        Maybe {
            thunk: Thunk::eager(None),
        }
    }

    pub fn from_option(value: Option<T>) -> Self {
        Maybe {
            thunk: Thunk::eager(value),
        }
    }

    /// Computed at most once, on first observation.
    pub fn defer(make: impl Fn() -> Option<T> + 'static) -> Self {
        Maybe {
            thunk: Thunk::memo(make),
        }
    }

    /// Recomputed on every observation.
    pub fn lazy(make: impl Fn() -> Option<T> + 'static) -> Self {
        Maybe {
            thunk: Thunk::lazy(make),
        }
    }

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(T) -> U + 'static) -> Maybe<U> {
        Maybe {
            thunk: self.thunk.map(move |value| value.map(&func)),
        }
    }

    pub fn flat_map<U: Clone + 'static>(
        &self,
        func: impl Fn(T) -> Maybe<U> + 'static,
    ) -> Maybe<U> {
        Maybe {
            thunk: self.thunk.flat_map(move |value| match value {
                Some(value) => func(value).thunk,
                None => Thunk::eager(None),
            }),
        }
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool + 'static) -> Maybe<T> {
        Maybe {
            thunk: self.thunk.map(move |value| value.filter(|v| pred(v))),
        }
    }

    pub fn or_else(&self, alt: impl Fn() -> Maybe<T> + 'static) -> Maybe<T> {
        Maybe {
            thunk: self.thunk.flat_map(move |value| match value {
                Some(value) => Thunk::eager(Some(value)),
                None => alt().thunk,
            }),
        }
    }

    pub fn fold<R>(&self, on_just: impl FnOnce(T) -> R, on_nothing: impl FnOnce() -> R) -> R {
        match self.thunk.force() {
            Some(value) => on_just(value),
            None => on_nothing(),
        }
    }

    pub fn get_or_else(&self, default: T) -> T {
        self.thunk.force().unwrap_or(default)
    }

    pub fn to_option(&self) -> Option<T> {
        self.thunk.force()
    }

    pub fn memoize(&self) -> Maybe<T> {
        Maybe {
            thunk: self.thunk.memoize(),
        }
    }
}
