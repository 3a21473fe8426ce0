//! Observer lists with stable subscription handles.
//!
//! Hooks run synchronously, in registration order, on the thread that calls
//! `notify`. Handles come from one process-wide counter and are never reused,
//! so a handle from one list can not remove a hook from another.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Hook<T> = Box<dyn FnMut(&T)>;

pub struct Observers<T> {
    hooks: Vec<(SubscriptionId, Hook<T>)>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` and return the handle that removes it.
    pub fn subscribe<F>(&mut self, hook: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        self.hooks.push((id, Box::new(hook)));
        id
    }

    /// Remove the hook registered under `id`. Returns false for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|(hid, _)| *hid != id);
        self.hooks.len() != before
    }

    pub fn notify(&mut self, value: &T) {
        for (_, hook) in self.hooks.iter_mut() {
            hook(value);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl<T> std::fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notify_runs_hooks_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut obs: Observers<u32> = Observers::new();

        let s1 = seen.clone();
        obs.subscribe(move |v| s1.borrow_mut().push(("first", *v)));
        let s2 = seen.clone();
        obs.subscribe(move |v| s2.borrow_mut().push(("second", *v)));

        obs.notify(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribe_removes_only_the_given_handle() {
        let count = Rc::new(RefCell::new(0));
        let mut obs: Observers<()> = Observers::new();

        let c1 = count.clone();
        let a = obs.subscribe(move |_| *c1.borrow_mut() += 1);
        let c2 = count.clone();
        let b = obs.subscribe(move |_| *c2.borrow_mut() += 10);
        assert_ne!(a, b);

        assert!(obs.unsubscribe(a));
        assert!(!obs.unsubscribe(a));
        obs.notify(&());
        assert_eq!(*count.borrow(), 10);
        assert_eq!(obs.len(), 1);
    }

    #[test]
    fn handles_are_not_reused_after_removal() {
        let mut obs: Observers<()> = Observers::new();
        let a = obs.subscribe(|_| {});
        obs.unsubscribe(a);
        let b = obs.subscribe(|_| {});
        assert_ne!(a, b);
    }

    #[test]
    fn handles_from_separate_lists_do_not_collide() {
        let mut first: Observers<()> = Observers::new();
        let mut second: Observers<()> = Observers::new();
        let a = first.subscribe(|_| {});
        let b = second.subscribe(|_| {});
        assert_ne!(a, b);
        assert!(!first.unsubscribe(b));
        assert_eq!(first.len(), 1);
    }
}
