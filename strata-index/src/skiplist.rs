//! Skip list over caller-owned indices - a probabilistic ordered index
//! backed by flat link lanes.
//!
//! The list never stores keys or values. The caller appends a record to
//! its own container, receives an integer slot index, and submits that
//! index to [`SkipList::insert`]. Ordering comes entirely from a
//! comparator over indices supplied at construction, which typically
//! dereferences into the caller's container.
//!
//! # Design
//!
//! All link state lives in parallel flat arrays sized at construction:
//! one forward lane per level (a contiguous row-major block), a single
//! backward lane at level 0 for reverse iteration, and per-level
//! head/tail/size metadata. A node's forward link at level `l` is the
//! cell at position `index` in lane `l`, so inserting an element touches
//! no allocator.
//!
//! ```text
//! Level 2:  heads[2] ──────────────► 7 ─────────────────► tails[2]
//!                                    │
//! Level 1:  heads[1] ──► 4 ────────► 7 ──► 12 ──────────► tails[1]
//!                        │           │      │
//! Level 0:  heads[0] ──► 4 ◄─► 5 ◄─► 7 ◄─► 12 ◄─► 19 ──► tails[0]
//! ```
//!
//! Lane cells for indices not currently threaded at a level hold stale
//! values; they are never read because every traversal starts at a head
//! and stops at the corresponding tail, and empty levels are skipped by
//! their size.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use strata_index::SkipList;
//!
//! // Values live outside the list; the comparator reads them by index.
//! let prices = [40u64, 10, 30, 20];
//! let rng = SmallRng::seed_from_u64(7);
//! let mut by_price = SkipList::new(prices.len(), 0.5, rng, |a: u32, b: u32| {
//!     prices[a as usize].cmp(&prices[b as usize])
//! });
//!
//! for slot in 0..prices.len() as u32 {
//!     by_price.insert(slot);
//! }
//!
//! let ordered: Vec<u32> = by_price.iter().collect();
//! assert_eq!(ordered, vec![1, 3, 2, 0]);
//! ```

use core::cmp::Ordering;
use core::fmt;

use rand_core::RngCore;

use crate::index::Index;

// ============================================================================
// Geometry
// ============================================================================

/// Number of lanes for a given capacity and promotion ratio.
///
/// The usable height of a skip list is `log_{1/ratio}(capacity)`; one
/// lane beyond that stops paying for itself. The closed endpoints get
/// degenerate geometries: `0` disables promotion entirely, `1` promotes
/// every element to the top and is sized as if `ratio` were 1/2.
fn level_count(capacity: usize, ratio: f64) -> usize {
    if ratio <= 0.0 {
        1
    } else if ratio >= 1.0 {
        ((usize::BITS - capacity.leading_zeros()).max(2)) as usize
    } else {
        let levels = ((capacity as f64).ln() / (1.0 / ratio).ln()).floor() as usize + 1;
        levels.max(1)
    }
}

// ============================================================================
// SkipList
// ============================================================================

/// A fixed-capacity ordered index over externally stored records.
///
/// Maintains comparator order over a set of live indices in `[0,
/// capacity)`, supporting ordered iteration in both directions, a
/// monotone-predicate insertion-point query ([`bisect`]) and a three-way
/// equality probe ([`search`]), all in `O(log n)` expected comparisons.
///
/// # Type parameters
///
/// - `C`: comparator, `Fn(Idx, Idx) -> Ordering`. Must be a total order
///   and must stay consistent for as long as an index is live.
/// - `R`: level-draw source implementing [`RngCore`].
/// - `Idx`: index type, defaults to `u32`.
///
/// # Contract
///
/// The caller guarantees that inserted indices are in range, that no
/// live index is inserted twice, and that only live indices are removed.
/// Violations are not signaled (debug builds assert the range); the
/// structure stays memory safe but its order may be unrecoverable.
///
/// [`bisect`]: SkipList::bisect
/// [`search`]: SkipList::search
pub struct SkipList<C, R, Idx: Index = u32> {
    /// Promotion CDF: entry `k` holds `ratio^(k+1)`, strictly descending
    /// for ratios inside (0, 1).
    table: Box<[f64]>,
    /// First element of each level's chain; stale when the size is 0.
    heads: Box<[Idx]>,
    /// Last element of each level's chain; stale when the size is 0.
    tails: Box<[Idx]>,
    /// Chain length per level. `sizes[0]` is the public length.
    sizes: Box<[usize]>,
    /// Forward lanes, row-major: lane `l` occupies
    /// `forward[l * capacity..][..capacity]`.
    forward: Box<[Idx]>,
    /// Backward lane, level 0 only.
    backward: Box<[Idx]>,
    /// Highest level with any element; an upper bound after removals.
    level: usize,
    capacity: usize,
    rng: R,
    compare: C,
}

impl<C, R, Idx: Index> fmt::Debug for SkipList<C, R, Idx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("capacity", &self.capacity)
            .field("levels", &self.levels())
            .field("level", &self.level)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<C, R, Idx> SkipList<C, R, Idx>
where
    C: Fn(Idx, Idx) -> Ordering,
    R: RngCore,
    Idx: Index,
{
    /// Creates an empty skip list.
    ///
    /// `capacity` bounds the number of simultaneously live indices;
    /// every buffer the list will ever touch is allocated here. `ratio`
    /// is the per-level promotion probability (common values: 1/2, 1/4,
    /// 1/8; `0` yields a plain sorted chain, `1` threads every element
    /// through every lane).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0, if `capacity` exceeds what `Idx` can
    /// address next to its sentinel, or if `ratio` is NaN or outside
    /// `[0, 1]`.
    pub fn new(capacity: usize, ratio: f64, rng: R, compare: C) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        assert!(
            capacity <= Idx::NONE.as_usize(),
            "capacity exceeds index type maximum"
        );
        assert!((0.0..=1.0).contains(&ratio), "ratio must be within [0, 1]");

        let levels = level_count(capacity, ratio);
        let mut table = Vec::with_capacity(levels - 1);
        let mut p = ratio;
        for _ in 1..levels {
            table.push(p);
            p *= ratio;
        }

        Self {
            table: table.into_boxed_slice(),
            heads: vec![Idx::NONE; levels].into_boxed_slice(),
            tails: vec![Idx::NONE; levels].into_boxed_slice(),
            sizes: vec![0; levels].into_boxed_slice(),
            forward: vec![Idx::NONE; levels * capacity].into_boxed_slice(),
            backward: vec![Idx::NONE; capacity].into_boxed_slice(),
            level: 0,
            capacity,
            rng,
            compare,
        }
    }

    /// Inserts a live index at its comparator-ordered position.
    ///
    /// Equal elements are kept stable: a new index lands after every
    /// element it compares equal to. The index is threaded into every
    /// lane from 0 up to a randomly drawn promotion height.
    pub fn insert(&mut self, index: Idx) {
        debug_assert!(index.as_usize() < self.capacity, "index out of range");

        let promote = self.random_level();
        if promote > self.level {
            self.level = promote;
        }

        // Predecessor hint carried from each level into the one below;
        // NONE means "start at the level's head".
        let mut point = Idx::NONE;

        for l in (0..=self.level).rev() {
            let splice = l <= promote;

            if self.sizes[l] == 0 {
                point = Idx::NONE;
                if splice {
                    self.heads[l] = index;
                    self.tails[l] = index;
                    self.sizes[l] = 1;
                }
                continue;
            }

            let head = self.heads[l];
            if (self.compare)(index, head) == Ordering::Less {
                point = Idx::NONE;
                if splice {
                    self.set_next_at(l, index, head);
                    self.heads[l] = index;
                    if l == 0 {
                        self.backward[head.as_usize()] = index;
                    }
                    self.sizes[l] += 1;
                }
                continue;
            }

            let tail = self.tails[l];
            if (self.compare)(index, tail) != Ordering::Less {
                point = tail;
                if splice {
                    self.set_next_at(l, tail, index);
                    self.tails[l] = index;
                    if l == 0 {
                        self.backward[index.as_usize()] = tail;
                    }
                    self.sizes[l] += 1;
                }
                continue;
            }

            // Interior: strictly after the head, strictly before the
            // tail. The hint is at most `index`, so scanning forward
            // from it must hit a strictly greater successor before the
            // tail.
            let mut prev = if point.is_none() { head } else { point };
            loop {
                let next = self.next_at(l, prev);
                if (self.compare)(index, next) == Ordering::Less {
                    point = prev;
                    if splice {
                        self.set_next_at(l, prev, index);
                        self.set_next_at(l, index, next);
                        if l == 0 {
                            self.backward[index.as_usize()] = prev;
                            self.backward[next.as_usize()] = index;
                        }
                        self.sizes[l] += 1;
                    }
                    break;
                }
                prev = next;
            }
        }
    }

    /// Draws a promotion height in `[0, levels)`.
    ///
    /// A uniform draw is binary-searched against the descending CDF
    /// table; the height is the length of the prefix still above the
    /// draw. A ratio of 0 always lands at 0, a ratio of 1 at the top.
    #[inline]
    fn random_level(&mut self) -> usize {
        let unit = (self.rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
        self.table.partition_point(|&p| unit < p)
    }
}

impl<C, R, Idx: Index> SkipList<C, R, Idx> {
    /// Removes a live index from every lane it is threaded through.
    ///
    /// The element is located by identity, not by comparator, so
    /// removal stays correct among equal elements. Removing an index
    /// that is not live is a caller error and silently leaves the
    /// structure unchanged at every level where the index is absent.
    pub fn remove(&mut self, index: Idx) {
        debug_assert!(index.as_usize() < self.capacity, "index out of range");

        let mut point = Idx::NONE;

        for l in (0..=self.level).rev() {
            if self.sizes[l] == 0 {
                continue;
            }

            let mut prev = point;
            let mut curr = if point.is_none() { self.heads[l] } else { point };
            let mut found = false;
            let mut steps = self.sizes[l];
            while steps > 0 {
                if curr == index {
                    found = true;
                    break;
                }
                if curr == self.tails[l] {
                    break;
                }
                prev = curr;
                curr = self.next_at(l, curr);
                steps -= 1;
            }

            // Not promoted this high; keep the hint from above.
            if !found {
                continue;
            }

            let next = self.next_at(l, index);
            self.sizes[l] -= 1;

            if index == self.heads[l] {
                self.heads[l] = next;
            }
            let was_tail = index == self.tails[l];
            if was_tail {
                self.tails[l] = if prev.is_none() { self.heads[l] } else { prev };
            }
            if prev.is_some() {
                self.set_next_at(l, prev, next);
                if l == 0 && !was_tail {
                    self.backward[next.as_usize()] = prev;
                }
            }

            if l == self.level && self.sizes[l] == 0 && self.level > 0 {
                self.level -= 1;
            }

            point = prev;
        }
    }

    /// Locates an insertion point from a monotone predicate.
    ///
    /// Over the ordered sequence, `pred` must be false on a (possibly
    /// empty) prefix and true on the rest. Returns the last index of
    /// the false prefix; `Some(head)` when the predicate already holds
    /// at the head; `None` when it holds nowhere (or the list is
    /// empty).
    ///
    /// Range queries compose two calls: "less than `v`" bounds the
    /// right end, "less than or equal to `v`" the left.
    pub fn bisect<P>(&self, mut pred: P) -> Option<Idx>
    where
        P: FnMut(Idx) -> bool,
    {
        if self.sizes[0] == 0 {
            return None;
        }

        let mut point = Idx::NONE;
        let mut found = false;

        for l in (0..=self.level).rev() {
            if self.sizes[l] == 0 {
                continue;
            }

            let mut prev = point;
            let mut curr = if point.is_none() { self.heads[l] } else { point };
            found = false;
            loop {
                if pred(curr) {
                    point = prev;
                    found = true;
                    break;
                }
                if curr == self.tails[l] {
                    point = curr;
                    break;
                }
                prev = curr;
                curr = self.next_at(l, curr);
            }
        }

        if found {
            Some(if point.is_none() { self.heads[0] } else { point })
        } else {
            None
        }
    }

    /// Locates the earliest index matching a three-way probe.
    ///
    /// `probe` returns `Less` while the element's value is below the
    /// target, `Equal` on a match, `Greater` past it. Returns the first
    /// equal index in comparator order, or `None` when no element
    /// matches.
    pub fn search<M>(&self, mut probe: M) -> Option<Idx>
    where
        M: FnMut(Idx) -> Ordering,
    {
        if self.sizes[0] == 0 {
            return None;
        }

        let mut point = Idx::NONE;
        let mut hit = None;

        for l in (0..=self.level).rev() {
            if self.sizes[l] == 0 {
                continue;
            }

            let mut curr = if point.is_none() { self.heads[l] } else { point };
            loop {
                match probe(curr) {
                    Ordering::Less => {
                        point = curr;
                        if curr == self.tails[l] {
                            break;
                        }
                        curr = self.next_at(l, curr);
                    }
                    Ordering::Equal => {
                        // Deeper levels can only find earlier equals,
                        // so the last hit wins.
                        hit = Some(curr);
                        break;
                    }
                    Ordering::Greater => break,
                }
            }
        }

        hit
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of live indices.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes[0]
    }

    /// Returns `true` if no index is live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sizes[0] == 0
    }

    /// Maximum number of simultaneously live indices.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of lanes the geometry allows.
    #[inline]
    pub fn levels(&self) -> usize {
        self.heads.len()
    }

    /// Highest lane currently holding any element (an upper bound after
    /// removals; empty upper lanes are skipped by every scan).
    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// First index in comparator order, or `None` if empty.
    #[inline]
    pub fn head(&self) -> Option<Idx> {
        if self.sizes[0] == 0 {
            None
        } else {
            Some(self.heads[0])
        }
    }

    /// Last index in comparator order, or `None` if empty.
    #[inline]
    pub fn tail(&self) -> Option<Idx> {
        if self.sizes[0] == 0 {
            None
        } else {
            Some(self.tails[0])
        }
    }

    /// Successor of a live index on the bottom chain, `None` at the
    /// tail. Meaningless for an index that is not live.
    #[inline]
    pub fn next(&self, index: Idx) -> Option<Idx> {
        debug_assert!(index.as_usize() < self.capacity, "index out of range");
        if self.sizes[0] == 0 || index == self.tails[0] {
            None
        } else {
            Some(self.next_at(0, index))
        }
    }

    /// Predecessor of a live index on the bottom chain, `None` at the
    /// head. Meaningless for an index that is not live.
    #[inline]
    pub fn prev(&self, index: Idx) -> Option<Idx> {
        debug_assert!(index.as_usize() < self.capacity, "index out of range");
        if self.sizes[0] == 0 || index == self.heads[0] {
            None
        } else {
            Some(self.backward[index.as_usize()])
        }
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Iterates every live index in comparator order.
    #[inline]
    pub fn iter(&self) -> Forwards<'_, C, R, Idx> {
        self.forwards(None, None)
    }

    /// Iterates left to right from `start` (default: the head) for up
    /// to `limit` elements (default: all), stopping at the tail either
    /// way. `start` must be live.
    pub fn forwards(&self, start: Option<Idx>, limit: Option<usize>) -> Forwards<'_, C, R, Idx> {
        let curr = match start {
            Some(index) => index,
            None if self.sizes[0] == 0 => Idx::NONE,
            None => self.heads[0],
        };
        Forwards {
            list: self,
            curr,
            remaining: limit.unwrap_or(self.sizes[0]),
        }
    }

    /// Iterates right to left from `start` (default: the tail) for up
    /// to `limit` elements (default: all), stopping at the head either
    /// way. `start` must be live.
    pub fn backwards(&self, start: Option<Idx>, limit: Option<usize>) -> Backwards<'_, C, R, Idx> {
        let curr = match start {
            Some(index) => index,
            None if self.sizes[0] == 0 => Idx::NONE,
            None => self.tails[0],
        };
        Backwards {
            list: self,
            curr,
            remaining: limit.unwrap_or(self.sizes[0]),
        }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    #[inline]
    fn next_at(&self, level: usize, index: Idx) -> Idx {
        self.forward[level * self.capacity + index.as_usize()]
    }

    #[inline]
    fn set_next_at(&mut self, level: usize, index: Idx, to: Idx) {
        self.forward[level * self.capacity + index.as_usize()] = to;
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Left-to-right iterator over live indices. See [`SkipList::forwards`].
pub struct Forwards<'a, C, R, Idx: Index = u32> {
    list: &'a SkipList<C, R, Idx>,
    curr: Idx,
    remaining: usize,
}

impl<C, R, Idx: Index> Iterator for Forwards<'_, C, R, Idx> {
    type Item = Idx;

    fn next(&mut self) -> Option<Idx> {
        if self.remaining == 0 || self.curr.is_none() {
            return None;
        }
        let index = self.curr;
        self.remaining -= 1;
        self.curr = if index == self.list.tails[0] {
            Idx::NONE
        } else {
            self.list.next_at(0, index)
        };
        Some(index)
    }
}

/// Right-to-left iterator over live indices. See [`SkipList::backwards`].
pub struct Backwards<'a, C, R, Idx: Index = u32> {
    list: &'a SkipList<C, R, Idx>,
    curr: Idx,
    remaining: usize,
}

impl<C, R, Idx: Index> Iterator for Backwards<'_, C, R, Idx> {
    type Item = Idx;

    fn next(&mut self) -> Option<Idx> {
        if self.remaining == 0 || self.curr.is_none() {
            return None;
        }
        let index = self.curr;
        self.remaining -= 1;
        self.curr = if index == self.list.heads[0] {
            Idx::NONE
        } else {
            self.list.backward[index.as_usize()]
        };
        Some(index)
    }
}
