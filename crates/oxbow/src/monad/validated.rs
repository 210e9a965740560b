use im::Vector;

use super::Thunk;

/// Accumulating validation: `zip_with`/`all` keep every failure across
/// independent values, unlike the short-circuiting [`super::trial::Trial`].
#[derive(Clone)]
pub struct Validated<T, E> {
    thunk: Thunk<Result<T, Vector<E>>>,
}

impl<T: Clone + 'static, E: Clone + 'static> Validated<T, E> {
    pub fn valid(value: T) -> Self {
        Validated {
            thunk: Thunk::eager(Ok(value)),
        }
    }

    pub fn invalid(error: E) -> Self {
        Validated {
            thunk: Thunk::eager(Err(Vector::unit(error))),
        }
    }

    pub fn invalid_all(errors: impl IntoIterator<Item = E>) -> Self {
        Validated {
            thunk: Thunk::eager(Err(errors.into_iter().collect())),
        }
    }

    pub fn defer(make: impl Fn() -> Result<T, E> + 'static) -> Self {
        Validated {
            thunk: Thunk::memo(move || make().map_err(Vector::unit)),
        }
    }

    pub fn lazy(make: impl Fn() -> Result<T, E> + 'static) -> Self {
        Validated {
            thunk: Thunk::lazy(move || make().map_err(Vector::unit)),
        }
    }

    pub fn map<U: Clone + 'static>(&self, func: impl Fn(T) -> U + 'static) -> Validated<U, E> {
        Validated {
            thunk: self.thunk.map(move |result| result.map(&func)),
        }
    }

    /// Short-circuiting bind for dependent steps.
    pub fn and_then<U: Clone + 'static>(
        &self,
        func: impl Fn(T) -> Validated<U, E> + 'static,
    ) -> Validated<U, E> {
        Validated {
            thunk: self.thunk.flat_map(move |result| match result {
                Ok(value) => func(value).thunk,
                Err(errors) => Thunk::eager(Err(errors)),
            }),
        }
    }

    /// Combines two independent validations, accumulating failures in order.
    pub fn zip_with<U: Clone + 'static, R: Clone + 'static>(
        &self,
        other: &Validated<U, E>,
        func: impl Fn(T, U) -> R + 'static,
    ) -> Validated<R, E> {
        Validated {
            thunk: Thunk::zip_with(&self.thunk, &other.thunk, move |left, right| {
                match (left, right) {
                    (Ok(a), Ok(b)) => Ok(func(a, b)),
                    (Err(mut left), Err(right)) => {
                        left.append(right);
                        Err(left)
                    }
                    (Err(errors), Ok(_)) | (Ok(_), Err(errors)) => Err(errors),
                }
            }),
        }
    }

    pub fn all(items: impl IntoIterator<Item = Validated<T, E>>) -> Validated<Vector<T>, E> {
        let mut acc = Validated::<Vector<T>, E>::valid(Vector::new());
        for item in items {
            acc = acc.zip_with(&item, |mut values, value| {
                values.push_back(value);
                values
            });
        }
        acc
    }

    pub fn fold<X>(
        &self,
        on_valid: impl FnOnce(T) -> X,
        on_invalid: impl FnOnce(Vector<E>) -> X,
    ) -> X {
        match self.thunk.force() {
            Ok(value) => on_valid(value),
            Err(errors) => on_invalid(errors),
        }
    }

    pub fn to_result(&self) -> Result<T, Vector<E>> {
        self.thunk.force()
    }

    pub fn memoize(&self) -> Validated<T, E> {
        Validated {
            thunk: self.thunk.memoize(),
        }
    }
}
