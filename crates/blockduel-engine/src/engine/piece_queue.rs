use std::collections::VecDeque;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{PieceKind, SpawnKind};

/// Upcoming pieces, the 7-bag they are drawn from, and the hold slot.
///
/// # 7-Bag System
///
/// 1. Creating a "bag" containing all 7 piece types (I, O, S, Z, J, L, T)
/// 2. Shuffling the bag randomly
/// 3. Moving pieces one by one from the bag to the upcoming queue
/// 4. Reshuffling a full bag once it is exhausted
///
/// Every run of 7 consecutive bag-derived entries contains each kind once.
///
/// # Front insertion
///
/// Power-ups and incoming hazards are pushed with [`Self::insert_front`].
/// They go ahead of every bag-derived entry and never consume bag entries, so
/// the bag order is unaffected.
///
/// # Example
///
/// ```
/// use blockduel_engine::{PieceKind, PieceQueue, SpawnKind};
///
/// let mut queue = PieceQueue::new();
/// queue.insert_front(SpawnKind::Bomb);
/// assert_eq!(queue.pop_next(), SpawnKind::Bomb);
///
/// let upcoming: Vec<_> = queue.next_pieces().take(3).collect();
/// assert_eq!(upcoming.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct PieceQueue {
    rng: Pcg32,
    bag: Vec<PieceKind>,
    upcoming: VecDeque<SpawnKind>,
    held: Option<SpawnKind>,
}

impl Default for PieceQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// This is a 128-bit (16-byte) seed used to initialize the bag shuffler and
/// the board's auxiliary generator (garbage holes, buster disguises, ties).
/// Using the same seed replays the same match given the same inputs.
///
/// # Example
///
/// ```
/// use blockduel_engine::{PieceQueue, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
/// let mut a = PieceQueue::with_seed(seed);
/// let mut b = PieceQueue::with_seed(seed);
/// assert_eq!(a.pop_next(), b.pop_next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generator for the board's non-bag randomness, independent of the bag
    /// shuffler.
    #[must_use]
    pub fn field_rng(self) -> Pcg32 {
        let n = u128::from_be_bytes(self.0);
        #[expect(clippy::cast_possible_truncation)]
        let (state, stream) = ((n >> 64) as u64, n as u64);
        Pcg32::new(state ^ 0x9e37_79b9_7f4a_7c15, stream.rotate_left(17))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let num = u128::from_be_bytes(self.0);
        serializer.serialize_str(&format!("{num:032x}"))
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        if hex_str.len() != 32 {
            return Err(serde::de::Error::custom(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            )));
        }
        let num = u128::from_str_radix(&hex_str, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid hex: {hex_str} ({e})")))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceQueue {
    /// Minimum number of entries kept in the upcoming queue.
    pub const MIN_UPCOMING: usize = 3;

    /// Creates a queue with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            bag: Vec::with_capacity(PieceKind::LEN),
            upcoming: VecDeque::with_capacity(Self::MIN_UPCOMING + 4),
            held: None,
        };
        this.refill();
        this
    }

    fn draw_from_bag(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.bag.extend(PieceKind::ALL);
            self.bag.shuffle(&mut self.rng);
        }
        // The bag was refilled above, so it holds at least one entry.
        self.bag.pop().unwrap_or(PieceKind::T)
    }

    fn refill(&mut self) {
        while self.upcoming.len() < Self::MIN_UPCOMING {
            let kind = self.draw_from_bag();
            self.upcoming.push_back(SpawnKind::Standard(kind));
        }
    }

    /// Pops the front entry, refilling from the bag as needed.
    pub fn pop_next(&mut self) -> SpawnKind {
        self.refill();
        let next = match self.upcoming.pop_front() {
            Some(kind) => kind,
            None => SpawnKind::Standard(self.draw_from_bag()),
        };
        self.refill();
        next
    }

    /// Pushes an entry ahead of everything already queued.
    pub fn insert_front(&mut self, kind: SpawnKind) {
        self.upcoming.push_front(kind);
    }

    /// Upcoming entries in spawn order; always at least [`Self::MIN_UPCOMING`].
    pub fn next_pieces(&self) -> impl Iterator<Item = SpawnKind> + '_ {
        self.upcoming.iter().copied()
    }

    /// Stores `current` in the hold slot and returns what replaces it: the
    /// previously held entry, or the next queued one.
    pub fn hold(&mut self, current: SpawnKind) -> SpawnKind {
        match self.held.replace(current) {
            Some(held) => held,
            None => self.pop_next(),
        }
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<SpawnKind> {
        self.held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: PieceSeed = PieceSeed([
        0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88,
    ]);

    fn standard(kind: SpawnKind) -> PieceKind {
        match kind {
            SpawnKind::Standard(kind) => kind,
            other => panic!("expected a standard piece, got {other:?}"),
        }
    }

    #[test]
    fn test_every_window_of_seven_is_a_permutation() {
        let mut queue = PieceQueue::with_seed(SEED);
        let draws: Vec<_> = (0..70).map(|_| standard(queue.pop_next())).collect();
        for bag in draws.chunks(PieceKind::LEN) {
            let mut sorted = bag.to_vec();
            sorted.sort_by_key(|k| *k as u8);
            assert_eq!(sorted, PieceKind::ALL);
        }
    }

    #[test]
    fn test_insertions_do_not_consume_bag_entries() {
        let mut plain = PieceQueue::with_seed(SEED);
        let mut disturbed = PieceQueue::with_seed(SEED);

        let expected: Vec<_> = (0..14).map(|_| plain.pop_next()).collect();

        let mut actual = Vec::new();
        for i in 0..14 {
            if i % 3 == 0 {
                disturbed.insert_front(SpawnKind::Bomb);
                assert_eq!(disturbed.pop_next(), SpawnKind::Bomb);
            }
            actual.push(disturbed.pop_next());
        }
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_insert_front_orders_last_in_first() {
        let mut queue = PieceQueue::with_seed(SEED);
        for _ in 0..3 {
            queue.insert_front(SpawnKind::Standard(PieceKind::I));
        }
        queue.insert_front(SpawnKind::Buster);
        let front: Vec<_> = queue.next_pieces().take(4).collect();
        assert_eq!(
            front,
            vec![
                SpawnKind::Buster,
                SpawnKind::Standard(PieceKind::I),
                SpawnKind::Standard(PieceKind::I),
                SpawnKind::Standard(PieceKind::I),
            ]
        );
    }

    #[test]
    fn test_preview_never_shorter_than_minimum() {
        let mut queue = PieceQueue::with_seed(SEED);
        for _ in 0..30 {
            assert!(queue.next_pieces().count() >= PieceQueue::MIN_UPCOMING);
            queue.pop_next();
        }
    }

    #[test]
    fn test_hold_stores_then_swaps() {
        let mut queue = PieceQueue::with_seed(SEED);
        let next = queue.next_pieces().next().unwrap();
        let current = SpawnKind::Standard(PieceKind::T);

        assert_eq!(queue.hold(current), next);
        assert_eq!(queue.held_piece(), Some(current));

        let swapped = queue.hold(SpawnKind::Bomb);
        assert_eq!(swapped, current);
        assert_eq!(queue.held_piece(), Some(SpawnKind::Bomb));
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let mut queue1 = PieceQueue::with_seed(SEED);
        let mut queue2 = PieceQueue::with_seed(SEED);
        for _ in 0..20 {
            assert_eq!(queue1.pop_next(), queue2.pop_next());
        }
    }

    mod piece_seed_serialization {
        use super::*;

        #[test]
        fn test_format_is_32_char_hex_string() {
            let seed: PieceSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let hex_str = serialized.trim_matches('"');
            assert_eq!(hex_str.len(), 32);
            assert!(hex_str.chars().all(|c| c.is_ascii_hexdigit()));
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = PieceSeed([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");

            let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(deserialized, seed);
        }

        #[test]
        fn test_deserialize_uppercase_hex() {
            let json = "\"0123456789ABCDEFFEDCBA9876543210\"";
            let deserialized: PieceSeed = serde_json::from_str(json).unwrap();
            assert_eq!(deserialized.0[0], 0x01);
            assert_eq!(deserialized.0[15], 0x10);
        }

        #[test]
        fn test_error_cases() {
            for json in [
                "\"ghijklmnopqrstuvwxyzghijklmnopqr\"",
                "\"0123456789abcdef0123456789abcde\"",
                "\"0123456789abcdef0123456789abcdef0\"",
                "\"\"",
            ] {
                let err = serde_json::from_str::<PieceSeed>(json).unwrap_err();
                assert!(err.to_string().contains("invalid hex"), "{json}");
            }
        }

        #[test]
        fn test_field_rng_differs_from_bag_rng() {
            let bag: u64 = Pcg32::from_seed(SEED.0).random();
            let field: u64 = SEED.field_rng().random();
            assert_ne!(bag, field);
        }
    }
}
