use std::cell::Cell;
use std::rc::Rc;

use super::either::{Branch, Either};
use super::maybe::Maybe;
use super::trial::Trial;
use super::validated::Validated;
use super::Deferred;

#[test]
fn deferred_chain_computes_once_across_terminals() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let base: Trial<i64, String> = Trial::of(move || {
        counter.set(counter.get() + 1);
        Ok(21)
    });

    let chain = base
        .map(|v| v * 2)
        .flat_map(Trial::success)
        .recover(|_| -1);

    assert_eq!(runs.get(), 0);
    assert_eq!(chain.to_result(), Ok(42));
    assert_eq!(chain.fold(|v| v, |_| -1), 42);
    assert_eq!(runs.get(), 1);
}

#[test]
fn lazy_chain_recomputes_per_terminal() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let base: Trial<i64, String> = Trial::lazy(move || {
        counter.set(counter.get() + 1);
        Ok(21)
    });

    let chain = base.map(|v| v * 2).recover(|_| -1);
    assert_eq!(chain.to_result(), Ok(42));
    assert_eq!(chain.to_result(), Ok(42));
    assert_eq!(runs.get(), 2);
}

#[test]
fn memoize_is_idempotent() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let value = Deferred::lazy(move || {
        counter.set(counter.get() + 1);
        7
    });

    let frozen = value.memoize();
    let frozen_again = frozen.memoize();
    assert_eq!(frozen.get(), 7);
    assert_eq!(frozen_again.get(), 7);
    assert_eq!(runs.get(), 1);
}

#[test]
fn memoize_populates_every_cell_on_the_chain() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let base = Deferred::of(move || {
        counter.set(counter.get() + 1);
        1
    });
    let chain = base.map(|v| v + 1).map(|v| v * 10);

    let frozen = chain.memoize();
    assert_eq!(frozen.get(), 20);
    // The already-forced portion is reused by both the original chain and
    // further composition on top of it.
    assert_eq!(chain.get(), 20);
    assert_eq!(chain.map(|v| v + 2).get(), 22);
    assert_eq!(runs.get(), 1);
}

#[test]
fn failure_short_circuits_without_invoking_the_mapper() {
    let calls = Rc::new(Cell::new(0));

    let counter = calls.clone();
    let failed: Trial<i64, &'static str> = Trial::failure("nope");
    let mapped = failed.map(move |v| {
        counter.set(counter.get() + 1);
        v + 1
    });
    assert_eq!(mapped.to_result(), Err("nope"));
    assert_eq!(calls.get(), 0);

    let counter = calls.clone();
    let ok: Trial<i64, &'static str> = Trial::success(1);
    let mapped = ok.map(move |v| {
        counter.set(counter.get() + 1);
        v + 1
    });
    assert_eq!(mapped.to_result(), Ok(2));
    assert_eq!(calls.get(), 1);
}

#[test]
fn trial_recover_and_or_else() {
    let failed: Trial<i64, String> = Trial::failure("boom".to_string());
    assert_eq!(failed.recover(|_| 0).to_result(), Ok(0));
    assert_eq!(
        failed.or_else(|e| Trial::failure(format!("{e}!"))).to_result(),
        Err("boom!".to_string())
    );
    assert_eq!(failed.map_err(|e| e.len()).to_result(), Err(4));

    let ok: Trial<i64, String> = Trial::success(3);
    assert_eq!(ok.recover(|_| 0).to_result(), Ok(3));
}

#[test]
#[should_panic(expected = "called `unwrap` on a failure")]
fn unwrap_re_raises_the_stored_failure() {
    let failed: Trial<i64, &'static str> = Trial::failure("nope");
    failed.unwrap();
}

#[test]
fn maybe_defers_until_folded() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let value = Maybe::defer(move || {
        counter.set(counter.get() + 1);
        Some(5)
    });

    let view = value.map(|v| v * 2).filter(|v| *v > 5);
    assert_eq!(runs.get(), 0);
    assert_eq!(view.fold(|v| v, || -1), 10);
    assert_eq!(view.to_option(), Some(10));
    assert_eq!(runs.get(), 1);
}

#[test]
fn maybe_composition() {
    let some = Maybe::just(2);
    assert_eq!(some.flat_map(|v| Maybe::just(v + 1)).to_option(), Some(3));
    assert_eq!(some.filter(|v| *v > 10).to_option(), None);
    assert_eq!(Maybe::<i64>::nothing().get_or_else(9), 9);
    assert_eq!(
        Maybe::<i64>::nothing().or_else(|| Maybe::just(1)).to_option(),
        Some(1)
    );
    assert_eq!(Maybe::from_option(Some(4)).get_or_else(0), 4);
}

#[test]
fn either_is_right_biased() {
    let right: Either<String, i64> = Either::right(10);
    assert_eq!(right.map(|v| v + 1).to_branch(), Branch::Right(11));
    assert_eq!(
        right.flat_map(|v| Either::right(v * 2)).to_branch(),
        Branch::Right(20)
    );

    let left: Either<String, i64> = Either::left("err".to_string());
    assert_eq!(left.map(|v| v + 1).to_branch(), Branch::Left("err".to_string()));
    assert_eq!(
        left.map_left(|e| e.len()).to_branch(),
        Branch::Left(3)
    );
    assert_eq!(left.swap().to_branch(), Branch::Right("err".to_string()));
    assert_eq!(left.fold(|e| e.len() as i64, |v| v), 3);
}

#[test]
fn either_defer_is_computed_once() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let value: Either<String, i64> = Either::defer(move || {
        counter.set(counter.get() + 1);
        Branch::Right(1)
    });
    let chain = value.map(|v| v + 1);
    assert_eq!(chain.to_branch(), Branch::Right(2));
    assert_eq!(chain.fold(|_| 0, |v| v), 2);
    assert_eq!(runs.get(), 1);
}

#[test]
fn validated_accumulates_across_independent_values() {
    let name: Validated<String, String> = Validated::invalid("name is empty".to_string());
    let age: Validated<i64, String> = Validated::invalid("age is negative".to_string());

    let combined = name.zip_with(&age, |name, age| (name, age));
    assert_eq!(
        combined.to_result(),
        Err(im::vector![
            "name is empty".to_string(),
            "age is negative".to_string()
        ])
    );

    let valid = Validated::<String, String>::valid("ada".to_string())
        .zip_with(&Validated::valid(36), |name, age| (name, age));
    assert_eq!(valid.to_result(), Ok(("ada".to_string(), 36)));
}

#[test]
fn validated_all_keeps_every_failure() {
    let items = vec![
        Validated::<i64, String>::valid(1),
        Validated::invalid("two".to_string()),
        Validated::valid(3),
        Validated::invalid("four".to_string()),
    ];
    let all = Validated::all(items);
    assert_eq!(
        all.to_result(),
        Err(im::vector!["two".to_string(), "four".to_string()])
    );

    let ok = Validated::all(vec![
        Validated::<i64, String>::valid(1),
        Validated::valid(2),
    ]);
    assert_eq!(ok.to_result(), Ok(im::vector![1, 2]));
}

#[test]
fn validated_and_then_short_circuits() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();

    let invalid: Validated<i64, String> = Validated::invalid("bad".to_string());
    let out = invalid.and_then(move |v| {
        counter.set(counter.get() + 1);
        Validated::valid(v + 1)
    });
    assert_eq!(out.to_result(), Err(im::vector!["bad".to_string()]));
    assert_eq!(calls.get(), 0);
}

#[test]
fn validated_defer_stays_lazy() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let value: Validated<i64, String> = Validated::defer(move || {
        counter.set(counter.get() + 1);
        Err("late".to_string())
    });
    let mapped = value.map(|v| v + 1);
    assert_eq!(runs.get(), 0);
    assert_eq!(mapped.to_result(), Err(im::vector!["late".to_string()]));
    assert_eq!(runs.get(), 1);
}

#[test]
fn cross_family_composition_keeps_laziness() {
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let source = Deferred::of(move || {
        counter.set(counter.get() + 1);
        4
    });

    let maybe = {
        let source = source.clone();
        Maybe::defer(move || Some(source.get()))
    };
    let trial: Trial<i64, String> = {
        let source = source.clone();
        Trial::of(move || Ok(source.get()))
    };

    assert_eq!(runs.get(), 0);
    assert_eq!(maybe.to_option(), Some(4));
    assert_eq!(trial.to_result(), Ok(4));
    // Both wrappers share the memoized identity underneath.
    assert_eq!(runs.get(), 1);
}
