/*
 * Vetoable event primitives. Handlers return a bool; publication walks the
 * handler list in order and stops at the first handler that returns false,
 * so a single veto aborts the remaining handlers and the operation being
 * gated.
 *
 * Slot management is shared with the fire-and-forget events in event.rs.
 */

use std::rc::Rc;

use crate::event::{EventHandle, HandlerList};

/// A vetoable event. Each handler decides whether the gated operation may
/// proceed; cloning yields another handle to the same handler list.
#[derive(Clone)]
pub struct ProceedEvent {
    inner: Rc<HandlerList<dyn Fn() -> bool>>,
}

impl Default for ProceedEvent {
    fn default() -> Self {
        Self {
            inner: Rc::new(HandlerList::new()),
        }
    }
}

impl ProceedEvent {
    /// Subscribes `handler`. Returning false from it vetoes the operation.
    pub fn attach(&self, handler: impl Fn() -> bool + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), false)
    }

    pub fn detach(&self, handle: EventHandle) {
        self.inner.detach(handle);
    }

    /// Subscribes `handler` as a one-shot occurrence; it is detached after
    /// its first invocation, whether or not it vetoes.
    pub fn once(&self, handler: impl Fn() -> bool + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), true)
    }
}

/// The publishing side of a `ProceedEvent`.
#[derive(Default)]
pub struct ProceedEventPublisher {
    event: ProceedEvent,
}

impl ProceedEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&self) -> ProceedEvent {
        self.event.clone()
    }

    /// Invokes handlers in attachment order until one returns false. Returns
    /// true iff every handler agreed to proceed (trivially true with no
    /// handlers attached).
    pub fn publish(&self) -> bool {
        let len = self.event.inner.len();
        for i in 0..len {
            let Some((handler, once)) = self.event.inner.get(i) else {
                continue;
            };

            let proceed = handler();

            if once {
                self.event.inner.detach(EventHandle(i));
            }
            if !proceed {
                return false;
            }
        }
        true
    }
}

/// A vetoable event whose handlers receive an argument of type `T`.
pub struct ProceedWithArgEvent<T> {
    inner: Rc<HandlerList<dyn Fn(&T) -> bool>>,
}

impl<T> Clone for ProceedWithArgEvent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ProceedWithArgEvent<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(HandlerList::new()),
        }
    }
}

impl<T> ProceedWithArgEvent<T> {
    pub fn attach(&self, handler: impl Fn(&T) -> bool + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), false)
    }

    pub fn detach(&self, handle: EventHandle) {
        self.inner.detach(handle);
    }

    pub fn once(&self, handler: impl Fn(&T) -> bool + 'static) -> EventHandle {
        self.inner.attach(Rc::new(handler), true)
    }
}

/// The publishing side of a `ProceedWithArgEvent<T>`.
pub struct ProceedWithArgEventPublisher<T> {
    event: ProceedWithArgEvent<T>,
}

impl<T> Default for ProceedWithArgEventPublisher<T> {
    fn default() -> Self {
        Self {
            event: ProceedWithArgEvent::default(),
        }
    }
}

impl<T> ProceedWithArgEventPublisher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(&self) -> ProceedWithArgEvent<T> {
        self.event.clone()
    }

    pub fn publish(&self, param: &T) -> bool {
        let len = self.event.inner.len();
        for i in 0..len {
            let Some((handler, once)) = self.event.inner.get(i) else {
                continue;
            };

            let proceed = handler(param);

            if once {
                self.event.inner.detach(EventHandle(i));
            }
            if !proceed {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn all_handlers_agreeing_yields_true() {
        let publisher = ProceedEventPublisher::new();
        let count = Rc::new(RefCell::new(0));
        for _ in 0..3 {
            let count = Rc::clone(&count);
            publisher.event().attach(move || {
                *count.borrow_mut() += 1;
                true
            });
        }

        assert!(publisher.publish());
        assert_eq!(*count.borrow(), 3);
    }

    #[test]
    fn first_veto_stops_the_remaining_handlers() {
        let publisher = ProceedEventPublisher::new();
        let hits = Rc::new(RefCell::new(Vec::new()));

        for (tag, proceed) in [(1, true), (2, false), (3, true)] {
            let hits = Rc::clone(&hits);
            publisher.event().attach(move || {
                hits.borrow_mut().push(tag);
                proceed
            });
        }

        assert!(!publisher.publish());
        assert_eq!(*hits.borrow(), [1, 2]);
    }

    #[test]
    fn publication_with_no_handlers_proceeds() {
        assert!(ProceedEventPublisher::new().publish());
    }

    #[test]
    fn once_handler_is_detached_even_when_it_vetoes() {
        let publisher = ProceedEventPublisher::new();
        let count = Rc::new(RefCell::new(0));
        {
            let count = Rc::clone(&count);
            publisher.event().once(move || {
                *count.borrow_mut() += 1;
                false
            });
        }

        assert!(!publisher.publish());
        assert!(publisher.publish());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn arg_variant_forwards_the_argument() {
        let publisher = ProceedWithArgEventPublisher::<String>::new();
        let seen = Rc::new(RefCell::new(String::new()));
        {
            let seen = Rc::clone(&seen);
            publisher.event().attach(move |s| {
                seen.borrow_mut().push_str(s);
                s.len() < 10
            });
        }

        assert!(publisher.publish(&"short".to_string()));
        assert_eq!(*seen.borrow(), "short");
    }
}
