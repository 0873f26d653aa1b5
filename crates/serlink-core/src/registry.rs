//! Listener dispatch registry.
//!
//! Three fixed-capacity tables route a completed frame to exactly one
//! consumer: ID listeners (request/response correlation) are scanned first,
//! then type listeners, then generic listeners. A handler returning `true`
//! claims the frame and stops the scan; an unclaimed frame is silently
//! dropped after the generic tier.
//!
//! Slots are never reordered: removal frees a slot in place, and a
//! high-water mark per table bounds the scan length, shrinking only when
//! the freed slot was the highest occupied one.

use tracing::trace;

use crate::codec::{Frame, FrameId, FrameType};
use crate::config::Config;
use crate::session::Responder;

/// A frame handler. Returns `true` to claim the frame and stop dispatch.
///
/// The [`Responder`] argument is the outbound half of the session, so a
/// handler can send or reply while the frame it is reading is still
/// borrowed from the parser.
pub type Listener<W> = Box<dyn FnMut(&mut Responder<'_, W>, Frame<'_>) -> bool>;

struct IdEntry<W> {
    id: FrameId,
    listener: Listener<W>,
}

struct TypeEntry<W> {
    frame_type: FrameType,
    listener: Listener<W>,
}

pub struct Registry<W> {
    id_slots: Box<[Option<IdEntry<W>>]>,
    type_slots: Box<[Option<TypeEntry<W>>]>,
    generic_slots: Box<[Option<Listener<W>>]>,
    id_high: usize,
    type_high: usize,
    generic_high: usize,
}

fn empty_slots<T>(capacity: usize) -> Box<[Option<T>]> {
    (0..capacity).map(|_| None).collect()
}

impl<W> Registry<W> {
    pub fn new(config: &Config) -> Self {
        Self {
            id_slots: empty_slots(config.id_listeners),
            type_slots: empty_slots(config.type_listeners),
            generic_slots: empty_slots(config.generic_listeners),
            id_high: 0,
            type_high: 0,
            generic_high: 0,
        }
    }

    /// Register a listener for one frame ID. `false` when the table is full.
    pub fn add_id_listener(&mut self, id: FrameId, listener: Listener<W>) -> bool {
        for i in 0..self.id_slots.len() {
            if self.id_slots[i].is_none() {
                self.id_slots[i] = Some(IdEntry { id, listener });
                if i >= self.id_high {
                    self.id_high = i + 1;
                }
                return true;
            }
        }
        false
    }

    /// Register a listener for one message type. `false` when full.
    pub fn add_type_listener(&mut self, frame_type: FrameType, listener: Listener<W>) -> bool {
        for i in 0..self.type_slots.len() {
            if self.type_slots[i].is_none() {
                self.type_slots[i] = Some(TypeEntry {
                    frame_type,
                    listener,
                });
                if i >= self.type_high {
                    self.type_high = i + 1;
                }
                return true;
            }
        }
        false
    }

    /// Register a catch-all listener. `false` when full.
    pub fn add_generic_listener(&mut self, listener: Listener<W>) -> bool {
        for i in 0..self.generic_slots.len() {
            if self.generic_slots[i].is_none() {
                self.generic_slots[i] = Some(listener);
                if i >= self.generic_high {
                    self.generic_high = i + 1;
                }
                return true;
            }
        }
        false
    }

    /// Remove the listener registered for `id`. `false` if none is.
    pub fn remove_id_listener(&mut self, id: FrameId) -> bool {
        for i in 0..self.id_high {
            if matches!(&self.id_slots[i], Some(entry) if entry.id == id) {
                self.free_id_slot(i);
                return true;
            }
        }
        false
    }

    /// Remove the listener registered for `frame_type`. `false` if none is.
    pub fn remove_type_listener(&mut self, frame_type: FrameType) -> bool {
        for i in 0..self.type_high {
            if matches!(&self.type_slots[i], Some(entry) if entry.frame_type == frame_type) {
                self.type_slots[i] = None;
                if i + 1 == self.type_high {
                    self.type_high -= 1;
                }
                return true;
            }
        }
        false
    }

    /// Remove the oldest registered generic listener. `false` if none is.
    ///
    /// Boxed handlers have no identity to remove by, so generic listeners
    /// are freed in registration order.
    pub fn remove_generic_listener(&mut self) -> bool {
        for i in 0..self.generic_high {
            if self.generic_slots[i].is_some() {
                self.generic_slots[i] = None;
                if i + 1 == self.generic_high {
                    self.generic_high -= 1;
                }
                return true;
            }
        }
        false
    }

    fn free_id_slot(&mut self, i: usize) {
        self.id_slots[i] = None;
        if i + 1 == self.id_high {
            self.id_high -= 1;
        }
    }

    /// Route a completed frame to the first claiming handler.
    ///
    /// An ID listener that claims its frame is removed afterwards: ID
    /// correlations are one-shot. Type and generic listeners persist.
    pub fn dispatch(&mut self, responder: &mut Responder<'_, W>, frame: Frame<'_>) {
        for i in 0..self.id_high {
            if let Some(entry) = self.id_slots[i].as_mut() {
                if entry.id == frame.id && (entry.listener)(responder, frame) {
                    self.free_id_slot(i);
                    return;
                }
            }
        }

        for i in 0..self.type_high {
            if let Some(entry) = self.type_slots[i].as_mut() {
                if entry.frame_type == frame.frame_type && (entry.listener)(responder, frame) {
                    return;
                }
            }
        }

        for i in 0..self.generic_high {
            if let Some(listener) = self.generic_slots[i].as_mut() {
                if listener(responder, frame) {
                    return;
                }
            }
        }

        trace!(
            id = frame.id,
            frame_type = frame.frame_type,
            "frame not claimed by any listener"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::Config;
    use crate::session::NullWire;

    fn small_registry() -> Registry<NullWire> {
        Registry::new(&Config {
            id_listeners: 2,
            type_listeners: 2,
            generic_listeners: 2,
            ..Config::default()
        })
    }

    fn claiming(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener<NullWire> {
        let log = Rc::clone(log);
        Box::new(move |_, _| {
            log.borrow_mut().push(tag);
            true
        })
    }

    fn declining(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Listener<NullWire> {
        let log = Rc::clone(log);
        Box::new(move |_, _| {
            log.borrow_mut().push(tag);
            false
        })
    }

    fn dispatch(registry: &mut Registry<NullWire>, id: FrameId, frame_type: FrameType) {
        let config = Config::default();
        let mut ids = crate::id::IdGen::new(config.peer);
        let mut staging = bytes::BytesMut::new();
        let mut wire = NullWire;
        let mut responder = Responder::new(&config, &mut ids, &mut staging, &mut wire);
        registry.dispatch(
            &mut responder,
            Frame {
                id,
                frame_type,
                payload: b"x",
            },
        );
    }

    #[test]
    fn id_listeners_take_priority() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, claiming(&log, "id")));
        assert!(registry.add_type_listener(9, claiming(&log, "type")));
        assert!(registry.add_generic_listener(claiming(&log, "generic")));

        dispatch(&mut registry, 1, 9);
        assert_eq!(*log.borrow(), vec!["id"]);
    }

    #[test]
    fn unclaimed_frame_falls_through_tiers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, declining(&log, "id")));
        assert!(registry.add_type_listener(9, declining(&log, "type")));
        assert!(registry.add_generic_listener(claiming(&log, "generic")));

        dispatch(&mut registry, 1, 9);
        assert_eq!(*log.borrow(), vec!["id", "type", "generic"]);
    }

    #[test]
    fn non_matching_listeners_are_not_invoked() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, claiming(&log, "id")));
        assert!(registry.add_type_listener(9, claiming(&log, "type")));

        dispatch(&mut registry, 2, 8);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn claiming_id_listener_is_one_shot() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, claiming(&log, "id")));

        dispatch(&mut registry, 1, 0);
        dispatch(&mut registry, 1, 0);
        assert_eq!(*log.borrow(), vec!["id"]);
        assert!(!registry.remove_id_listener(1));
    }

    #[test]
    fn declining_id_listener_stays_registered() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, declining(&log, "id")));

        dispatch(&mut registry, 1, 0);
        dispatch(&mut registry, 1, 0);
        assert_eq!(*log.borrow(), vec!["id", "id"]);
    }

    #[test]
    fn full_table_rejects_without_disturbing_entries() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_type_listener(1, declining(&log, "first")));
        assert!(registry.add_type_listener(1, declining(&log, "second")));
        assert!(!registry.add_type_listener(1, claiming(&log, "third")));

        dispatch(&mut registry, 0, 1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn removing_missing_entries_reports_failure() {
        let mut registry = small_registry();
        assert!(!registry.remove_id_listener(7));
        assert!(!registry.remove_type_listener(7));
        assert!(!registry.remove_generic_listener());
    }

    #[test]
    fn freed_slot_is_reused() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_id_listener(1, claiming(&log, "one")));
        assert!(registry.add_id_listener(2, claiming(&log, "two")));
        assert!(registry.remove_id_listener(1));
        assert!(registry.add_id_listener(3, claiming(&log, "three")));

        dispatch(&mut registry, 3, 0);
        assert_eq!(*log.borrow(), vec!["three"]);
    }

    #[test]
    fn removal_in_the_middle_keeps_later_entries_reachable() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_type_listener(5, declining(&log, "a")));
        assert!(registry.add_type_listener(5, claiming(&log, "b")));
        assert!(registry.remove_type_listener(5)); // removes "a", the first match

        dispatch(&mut registry, 0, 5);
        assert_eq!(*log.borrow(), vec!["b"]);
    }

    #[test]
    fn generic_listeners_removed_oldest_first() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = small_registry();
        assert!(registry.add_generic_listener(claiming(&log, "old")));
        assert!(registry.add_generic_listener(claiming(&log, "new")));
        assert!(registry.remove_generic_listener());

        dispatch(&mut registry, 0, 0);
        assert_eq!(*log.borrow(), vec!["new"]);
    }
}
