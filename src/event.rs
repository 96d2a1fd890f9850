/*
 * Fire-and-forget event primitives: an ordered list of handlers with
 * support for one-shot subscriptions and stable detach handles.
 *
 * Handler slots are nulled on detach rather than removed, so handles stay
 * valid and publication can iterate by index even while handlers detach
 * themselves or each other mid-dispatch. Publication is synchronous and
 * re-entrancy tolerant, but not thread-safe; all of this runs on the UI
 * thread.
 */

use std::cell::RefCell;
use std::rc::Rc;

/// Identifies an attached handler so it can later be detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle(pub(crate) usize);

struct HandlerSlot<H: ?Sized> {
    handler: Option<Rc<H>>,
    once: bool,
}

/// Shared slot storage behind both `Event` handles and their publisher.
pub(crate) struct HandlerList<H: ?Sized> {
    slots: RefCell<Vec<HandlerSlot<H>>>,
}

impl<H: ?Sized> HandlerList<H> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn attach(&self, handler: Rc<H>, once: bool) -> EventHandle {
        let mut slots = self.slots.borrow_mut();

        // Reuse a nulled slot when available so the list does not grow
        // unboundedly across attach/detach cycles.
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.handler.is_none() {
                *slot = HandlerSlot {
                    handler: Some(handler),
                    once,
                };
                return EventHandle(i);
            }
        }

        slots.push(HandlerSlot {
            handler: Some(handler),
            once,
        });
        EventHandle(slots.len() - 1)
    }

    pub(crate) fn detach(&self, handle: EventHandle) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(handle.0) {
            slot.handler = None;
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Snapshots slot `i` without holding the borrow, so the handler can be
    /// invoked while other handlers attach or detach.
    pub(crate) fn get(&self, i: usize) -> Option<(Rc<H>, bool)> {
        let slots = self.slots.borrow();
        let slot = slots.get(i)?;
        Some((Rc::clone(slot.handler.as_ref()?), slot.once))
    }
}

/// An event that handlers can subscribe to. Cloning yields another handle to
/// the same underlying handler list.
#[derive(Clone)]
pub struct Event {
    inner: Rc<HandlerList<dyn Fn()>>,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            inner: Rc::new(HandlerList::new()),
        }
    }
}

impl Event {
    /// Subscribes `handler`; it will be invoked on every publication until
    /// detached. Returns a handle for use with `detach`.
    pub fn attach(&self, handler: impl Fn() + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), false)
    }

    /// Removes the handler identified by `handle`. Safe to call during
    /// publication; a handler not yet reached will be skipped.
    pub fn detach(&self, handle: EventHandle) {
        self.inner.detach(handle);
    }

    /// Subscribes `handler` as a one-shot occurrence; it is automatically
    /// detached after its first invocation.
    pub fn once(&self, handler: impl Fn() + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), true)
    }
}

/// The publishing side of an `Event`. Owned by whatever component raises
/// the event; consumers only ever see the `Event` handle.
#[derive(Default)]
pub struct EventPublisher {
    event: Event,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtains a subscription handle to the event associated with this
    /// publisher.
    pub fn event(&self) -> Event {
        self.event.clone()
    }

    /// Invokes all attached handlers in attachment order. Handlers attached
    /// during publication are not invoked until the next publication.
    pub fn publish(&self) {
        let len = self.event.inner.len();
        for i in 0..len {
            let Some((handler, once)) = self.event.inner.get(i) else {
                continue;
            };

            handler();

            if once {
                self.event.inner.detach(EventHandle(i));
            }
        }
    }
}

/// An event whose handlers receive an argument of type `T`.
pub struct GenericEvent<T> {
    inner: Rc<HandlerList<dyn Fn(&T)>>,
}

impl<T> Clone for GenericEvent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for GenericEvent<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(HandlerList::new()),
        }
    }
}

impl<T> GenericEvent<T> {
    pub fn attach(&self, handler: impl Fn(&T) + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), false)
    }

    pub fn detach(&self, handle: EventHandle) {
        self.inner.detach(handle);
    }

    pub fn once(&self, handler: impl Fn(&T) + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), true)
    }
}

/// The publishing side of a `GenericEvent<T>`.
pub struct GenericEventPublisher<T> {
    event: GenericEvent<T>,
}

impl<T> Default for GenericEventPublisher<T> {
    fn default() -> Self {
        Self {
            event: GenericEvent::default(),
        }
    }
}

impl<T> GenericEventPublisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&self) -> GenericEvent<T> {
        self.event.clone()
    }

    pub fn publish(&self, param: &T) {
        let len = self.event.inner.len();
        for i in 0..len {
            let Some((handler, once)) = self.event.inner.get(i) else {
                continue;
            };

            handler(param);

            if once {
                self.event.inner.detach(EventHandle(i));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn handlers_run_in_attachment_order() {
        let publisher = EventPublisher::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            publisher.event().attach(move || order.borrow_mut().push(tag));
        }

        publisher.publish();
        assert_eq!(*order.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn once_handlers_detach_after_first_publication() {
        let publisher = EventPublisher::new();
        let count = Rc::new(RefCell::new(0));
        {
            let count = Rc::clone(&count);
            publisher.event().once(move || *count.borrow_mut() += 1);
        }

        publisher.publish();
        publisher.publish();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn handler_detached_mid_publication_is_not_invoked() {
        let publisher = EventPublisher::new();
        let event = publisher.event();
        let hits = Rc::new(RefCell::new(Vec::new()));

        // Handler 1 detaches handler 2 before it is reached.
        let second = Rc::new(RefCell::new(None::<EventHandle>));
        {
            let event = event.clone();
            let second = Rc::clone(&second);
            let hits = Rc::clone(&hits);
            event.clone().attach(move || {
                hits.borrow_mut().push(1);
                if let Some(handle) = *second.borrow() {
                    event.detach(handle);
                }
            });
        }
        {
            let hits = Rc::clone(&hits);
            let handle = event.attach(move || hits.borrow_mut().push(2));
            *second.borrow_mut() = Some(handle);
        }

        publisher.publish();
        assert_eq!(*hits.borrow(), [1]);
    }

    #[test]
    fn detached_slots_are_reused_by_later_attachments() {
        let publisher = EventPublisher::new();
        let event = publisher.event();

        let first = event.attach(|| {});
        event.detach(first);
        let second = event.attach(|| {});
        assert_eq!(first, second);
    }

    #[test]
    fn generic_event_passes_the_argument_to_each_handler() {
        let publisher = GenericEventPublisher::<i32>::new();
        let sum = Rc::new(RefCell::new(0));
        for _ in 0..2 {
            let sum = Rc::clone(&sum);
            publisher.event().attach(move |v| *sum.borrow_mut() += *v);
        }

        publisher.publish(&21);
        assert_eq!(*sum.borrow(), 42);
    }
}
