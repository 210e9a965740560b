use std::cell::{Cell, RefCell};
use std::rc::Rc;

type CleanupFn = Box<dyn FnOnce()>;

/// Scoped release action for an abandoned traversal. Scopes nest; abandoning
/// fires children innermost-first, each action at most once.
#[derive(Clone, Default)]
pub struct CleanupScope {
    inner: Rc<ScopeInner>,
}

#[derive(Default)]
struct ScopeInner {
    action: RefCell<Option<CleanupFn>>,
    children: RefCell<Vec<CleanupScope>>,
    done: Cell<bool>,
}

impl CleanupScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> CleanupScope {
        let child = CleanupScope::new();
        self.inner.children.borrow_mut().push(child.clone());
        child
    }

    /// Registers the release action, replacing any earlier one.
    pub fn on_abandon(&self, action: impl FnOnce() + 'static) {
        *self.inner.action.borrow_mut() = Some(Box::new(action));
    }

    /// Natural completion: this scope's action never fires. Children that
    /// did not complete on their own were abandoned and are still released.
    pub fn complete(&self) {
        if self.inner.done.replace(true) {
            return;
        }
        self.release_children();
        self.inner.action.borrow_mut().take();
    }

    pub fn abandon(&self) {
        if self.inner.done.replace(true) {
            return;
        }
        self.release_children();
        if let Some(action) = self.inner.action.borrow_mut().take() {
            action();
        }
    }

    fn release_children(&self) {
        let children: Vec<CleanupScope> = self.inner.children.borrow_mut().drain(..).collect();
        for child in children.into_iter().rev() {
            child.abandon();
        }
    }
}

/// Guard entered per traversal. Dropping it without calling `complete`
/// counts as abandonment.
pub struct ScopeGuard {
    scope: CleanupScope,
}

impl ScopeGuard {
    pub fn enter() -> Self {
        ScopeGuard {
            scope: CleanupScope::new(),
        }
    }

    pub fn scope(&self) -> &CleanupScope {
        &self.scope
    }

    pub fn complete(self) {
        self.scope.complete();
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.scope.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn abandon_fires_once_and_innermost_first() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let root = CleanupScope::new();
        let outer = root.child();
        let inner = outer.child();

        let log = order.clone();
        outer.on_abandon(move || log.borrow_mut().push("outer"));
        let log = order.clone();
        inner.on_abandon(move || log.borrow_mut().push("inner"));

        root.abandon();
        root.abandon();
        assert_eq!(*order.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn completed_scope_never_fires() {
        let fired = Rc::new(Cell::new(0));
        let scope = CleanupScope::new();
        let count = fired.clone();
        scope.on_abandon(move || count.set(count.get() + 1));

        scope.complete();
        scope.abandon();
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn completing_a_parent_releases_abandoned_children() {
        let fired = Rc::new(Cell::new(0));
        let parent = CleanupScope::new();
        let finished = parent.child();
        let abandoned = parent.child();

        finished.complete();
        let count = fired.clone();
        abandoned.on_abandon(move || count.set(count.get() + 1));

        parent.complete();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn guard_drop_abandons_unless_completed() {
        let fired = Rc::new(Cell::new(0));
        {
            let guard = ScopeGuard::enter();
            let count = fired.clone();
            guard.scope().on_abandon(move || count.set(count.get() + 1));
        }
        assert_eq!(fired.get(), 1);

        {
            let guard = ScopeGuard::enter();
            let count = fired.clone();
            guard.scope().on_abandon(move || count.set(count.get() + 1));
            guard.complete();
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn replacing_the_action_keeps_a_single_firing() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scope = CleanupScope::new();
        let log = order.clone();
        scope.on_abandon(move || log.borrow_mut().push("first"));
        let log = order.clone();
        scope.on_abandon(move || log.borrow_mut().push("second"));

        scope.abandon();
        assert_eq!(*order.borrow(), vec!["second"]);
    }
}
