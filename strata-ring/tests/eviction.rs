//! The streaming workflow: values flow through a full ring while a
//! skip list keeps them ordered. Before each wrapping append the stale
//! index is removed from the list, then the reused slot is re-inserted
//! under its new value.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use strata_index::SkipList;
use strata_ring::Ring;

#[test]
fn ordered_view_survives_slot_reuse() {
    const CAPACITY: usize = 8;
    const STREAM: usize = 40;

    let ring: Rc<RefCell<Ring<u32>>> = Rc::new(RefCell::new(Ring::with_capacity(CAPACITY)));
    let cmp = {
        let ring = Rc::clone(&ring);
        move |a: u32, b: u32| {
            let ring = ring.borrow();
            ring.get(a).unwrap().cmp(ring.get(b).unwrap())
        }
    };
    let mut by_value = SkipList::new(CAPACITY, 0.25, SmallRng::seed_from_u64(3), cmp);

    let mut rng = SmallRng::seed_from_u64(17);
    for step in 0..STREAM {
        let value = rng.next_u32() % 100;

        if ring.borrow().is_full() {
            let stale = ring.borrow().oldest().unwrap();
            by_value.remove(stale);
        }
        let (index, displaced) = ring.borrow_mut().append(value);
        assert_eq!(displaced.is_some(), step >= CAPACITY);
        by_value.insert(index);

        // The ordered view always covers exactly the live slots,
        // in non-decreasing value order.
        let ring_ref = ring.borrow();
        assert_eq!(by_value.len(), ring_ref.len());

        let ordered: Vec<u32> = by_value.iter().collect();
        for pair in ordered.windows(2) {
            assert!(ring_ref.get(pair[0]).unwrap() <= ring_ref.get(pair[1]).unwrap());
        }

        let mut live: Vec<u32> = ring_ref.iter().map(|(i, _)| i).collect();
        let mut indexed = ordered.clone();
        live.sort_unstable();
        indexed.sort_unstable();
        assert_eq!(indexed, live);
    }
}
