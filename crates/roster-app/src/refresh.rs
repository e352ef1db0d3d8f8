// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cell::RefCell;
use std::rc::Weak;
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    RecordCreated,
    RecordUpdated,
    RecordDeleted,
}

impl Notification {
    pub const fn name(self) -> &'static str {
        match self {
            Self::RecordCreated => "record-created",
            Self::RecordUpdated => "record-updated",
            Self::RecordDeleted => "record-deleted",
        }
    }
}

/// Sending half handed to child view-models.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<Notification>,
}

impl Notifier {
    pub fn emit(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!(
                notification = notification.name(),
                "coordinator gone, notification dropped"
            );
        }
    }
}

/// Anything a coordinator can ask to reload.
pub trait Refresh {
    fn refresh(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interest {
    Created,
    AnyChange,
}

impl Interest {
    fn matches(self, notification: Notification) -> bool {
        match self {
            Self::Created => notification == Notification::RecordCreated,
            Self::AnyChange => true,
        }
    }
}

/// Outcome of handing a notification to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Done,
    Busy,
}

struct Subscription {
    interest: Interest,
    handler: Box<dyn FnMut(Notification) -> Delivery>,
}

/// Bridges a mutation in one view to a reload in another.
///
/// Children emit through a [`Notifier`]; nothing runs until the owner calls
/// [`RefreshCoordinator::pump`], so a handler never re-enters the view that
/// emitted the notification. A target that is borrowed when its turn comes
/// is retried on the following pump.
pub struct RefreshCoordinator {
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
    subscriptions: Vec<Subscription>,
    deferred: Vec<(usize, Notification)>,
    dispatched: u64,
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            subscriptions: Vec::new(),
            deferred: Vec::new(),
            dispatched: 0,
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier {
            tx: self.tx.clone(),
        }
    }

    pub fn on_child_created(&mut self, mut handler: impl FnMut(Notification) + 'static) {
        self.subscribe(Interest::Created, move |notification| {
            handler(notification);
            Delivery::Done
        });
    }

    pub fn on_record_changed(&mut self, mut handler: impl FnMut(Notification) + 'static) {
        self.subscribe(Interest::AnyChange, move |notification| {
            handler(notification);
            Delivery::Done
        });
    }

    pub fn refresh_on_created<T: Refresh + 'static>(&mut self, target: Weak<RefCell<T>>) {
        self.subscribe(Interest::Created, move |notification| {
            refresh_target(&target, notification)
        });
    }

    pub fn refresh_on_change<T: Refresh + 'static>(&mut self, target: Weak<RefCell<T>>) {
        self.subscribe(Interest::AnyChange, move |notification| {
            refresh_target(&target, notification)
        });
    }

    /// Retries deferred refreshes, then dispatches every queued notification.
    /// Returns how many queued notifications were drained.
    pub fn pump(&mut self) -> usize {
        for (index, notification) in std::mem::take(&mut self.deferred) {
            self.deliver(index, notification);
        }

        let mut drained = 0;
        while let Ok(notification) = self.rx.try_recv() {
            drained += 1;
            self.dispatched += 1;
            let mut matched = 0;
            for index in 0..self.subscriptions.len() {
                if self.subscriptions[index].interest.matches(notification) {
                    self.deliver(index, notification);
                    matched += 1;
                }
            }
            debug!(
                notification = notification.name(),
                handlers = matched,
                "notification dispatched"
            );
        }
        drained
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Refreshes waiting for a busy target.
    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    fn subscribe(
        &mut self,
        interest: Interest,
        handler: impl FnMut(Notification) -> Delivery + 'static,
    ) {
        self.subscriptions.push(Subscription {
            interest,
            handler: Box::new(handler),
        });
    }

    /// One pending retry per subscription covers any number of notifications.
    fn deliver(&mut self, index: usize, notification: Notification) {
        let Some(subscription) = self.subscriptions.get_mut(index) else {
            return;
        };
        if (subscription.handler)(notification) == Delivery::Busy
            && !self.deferred.iter().any(|(waiting, _)| *waiting == index)
        {
            self.deferred.push((index, notification));
        }
    }
}

fn refresh_target<T: Refresh>(target: &Weak<RefCell<T>>, notification: Notification) -> Delivery {
    let Some(target) = target.upgrade() else {
        debug!(
            notification = notification.name(),
            "refresh target not mounted, skipping"
        );
        return Delivery::Done;
    };
    let Ok(mut target) = target.try_borrow_mut() else {
        warn!(
            notification = notification.name(),
            "refresh target busy, retrying on next pump"
        );
        return Delivery::Busy;
    };
    target.refresh();
    Delivery::Done
}

#[cfg(test)]
mod tests {
    use super::{Notification, Refresh, RefreshCoordinator};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter {
        refreshes: usize,
    }

    impl Refresh for Counter {
        fn refresh(&mut self) {
            self.refreshes += 1;
        }
    }

    #[test]
    fn created_handler_ignores_other_mutations() {
        let mut coordinator = RefreshCoordinator::new();
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        coordinator.on_child_created(move |_| seen.set(seen.get() + 1));

        let notifier = coordinator.notifier();
        notifier.emit(Notification::RecordUpdated);
        notifier.emit(Notification::RecordCreated);

        assert_eq!(coordinator.pump(), 2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn nothing_runs_until_pumped() {
        let mut coordinator = RefreshCoordinator::new();
        let target = Rc::new(RefCell::new(Counter::default()));
        coordinator.refresh_on_change(Rc::downgrade(&target));

        coordinator.notifier().emit(Notification::RecordDeleted);
        assert_eq!(target.borrow().refreshes, 0);

        coordinator.pump();
        assert_eq!(target.borrow().refreshes, 1);
    }

    #[test]
    fn unmounted_target_is_a_no_op() {
        let mut coordinator = RefreshCoordinator::new();
        let target = Rc::new(RefCell::new(Counter::default()));
        coordinator.refresh_on_created(Rc::downgrade(&target));
        drop(target);

        coordinator.notifier().emit(Notification::RecordCreated);
        assert_eq!(coordinator.pump(), 1);
        assert_eq!(coordinator.dispatched(), 1);
    }

    #[test]
    fn busy_target_is_refreshed_on_the_next_pump() {
        let mut coordinator = RefreshCoordinator::new();
        let target = Rc::new(RefCell::new(Counter::default()));
        coordinator.refresh_on_created(Rc::downgrade(&target));

        let guard = target.borrow_mut();
        let notifier = coordinator.notifier();
        notifier.emit(Notification::RecordCreated);
        notifier.emit(Notification::RecordCreated);
        assert_eq!(coordinator.pump(), 2);
        assert_eq!(coordinator.pending(), 1);
        assert_eq!(coordinator.pump(), 0);
        assert_eq!(coordinator.pending(), 1);
        drop(guard);

        assert_eq!(target.borrow().refreshes, 0);
        assert_eq!(coordinator.pump(), 0);
        assert_eq!(target.borrow().refreshes, 1);
        assert_eq!(coordinator.pending(), 0);
        coordinator.pump();
        assert_eq!(target.borrow().refreshes, 1);
    }

    #[test]
    fn deferred_refresh_is_dropped_once_target_unmounts() {
        let mut coordinator = RefreshCoordinator::new();
        let target = Rc::new(RefCell::new(Counter::default()));
        coordinator.refresh_on_change(Rc::downgrade(&target));

        let guard = target.borrow_mut();
        coordinator.notifier().emit(Notification::RecordUpdated);
        coordinator.pump();
        drop(guard);
        drop(target);

        coordinator.pump();
        assert_eq!(coordinator.pending(), 0);
    }

    #[test]
    fn repeated_pumps_are_harmless() {
        let mut coordinator = RefreshCoordinator::new();
        let target = Rc::new(RefCell::new(Counter::default()));
        coordinator.refresh_on_created(Rc::downgrade(&target));

        coordinator.notifier().emit(Notification::RecordCreated);
        assert_eq!(coordinator.pump(), 1);
        assert_eq!(coordinator.pump(), 0);
        assert_eq!(coordinator.pump(), 0);
        assert_eq!(target.borrow().refreshes, 1);
    }

    #[test]
    fn notification_names() {
        assert_eq!(Notification::RecordCreated.name(), "record-created");
        assert_eq!(Notification::RecordDeleted.name(), "record-deleted");
    }
}
