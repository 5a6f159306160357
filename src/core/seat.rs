//! Seat identification and per-seat data storage.
//!
//! ## Seat
//!
//! Type-safe seat index for the four fixed table positions.
//!
//! ## SeatMap
//!
//! Per-seat data storage backed by `Vec` for O(1) access.
//! Supports iteration and indexing by `Seat`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats at a riichi table.
pub const SEAT_COUNT: usize = 4;

/// Table identifier, opaque to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Table {}", self.0)
    }
}

/// The four winds. Ordinal order is turn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Wind {
    East,
    South,
    West,
    North,
}

impl Wind {
    pub const ALL: [Wind; 4] = [Wind::East, Wind::South, Wind::West, Wind::North];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 4]
    }

    /// The following wind, wrapping North back to East.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

/// Seat index at a table, 0-3.
///
/// Seat 0 is the first dealer of a game. Seat winds rotate with the dealer.
/// Decoding rejects indices outside 0-3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Seat(pub u8);

impl Seat {
    /// Create a new seat.
    ///
    /// ```
    /// use mahjong_table::core::Seat;
    ///
    /// assert_eq!(Seat::new(2).index(), 2);
    /// ```
    #[must_use]
    pub const fn new(id: u8) -> Self {
        assert!((id as usize) < SEAT_COUNT, "Seat index out of range");
        Self(id)
    }

    /// Whether the index names one of the four seats. Always true for
    /// seats built with [`Seat::new`] or decoded from the wire.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < SEAT_COUNT
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterate over all four seats.
    pub fn all() -> impl Iterator<Item = Seat> {
        (0..SEAT_COUNT as u8).map(Seat)
    }

    /// The seat that plays after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self((self.0 + 1) % SEAT_COUNT as u8)
    }

    /// The seat that plays before this one.
    #[must_use]
    pub const fn prev(self) -> Self {
        Self((self.0 + SEAT_COUNT as u8 - 1) % SEAT_COUNT as u8)
    }

    /// How many steps after `from` this seat plays (0 for the same seat).
    #[must_use]
    pub const fn distance_from(self, from: Seat) -> usize {
        (self.0 as usize + SEAT_COUNT - from.0 as usize) % SEAT_COUNT
    }

    /// Seats in turn order starting right after `self`.
    pub fn others_in_turn_order(self) -> impl Iterator<Item = Seat> {
        (1..SEAT_COUNT as u8).map(move |step| Seat((self.0 + step) % SEAT_COUNT as u8))
    }

    /// Seat wind of this seat when `dealer` is East.
    #[must_use]
    pub const fn wind(self, dealer: Seat) -> Wind {
        Wind::from_index(self.distance_from(dealer))
    }
}

impl TryFrom<u8> for Seat {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        let seat = Seat(id);
        if seat.is_valid() {
            Ok(seat)
        } else {
            Err(format!("seat index {id} out of range"))
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> u8 {
        seat.0
    }
}

impl std::fmt::Display for Seat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Seat {}", self.0)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use mahjong_table::core::{Seat, SeatMap};
///
/// let mut points: SeatMap<i32> = SeatMap::with_value(25000);
/// points[Seat::new(1)] -= 1000;
/// assert_eq!(points[Seat::new(1)], 24000);
/// assert_eq!(points.iter().map(|(_, p)| *p).sum::<i32>(), 99000);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatMap<T> {
    data: Vec<T>,
}

impl<T> SeatMap<T> {
    /// Create a new SeatMap with values from a factory function.
    pub fn new(factory: impl Fn(Seat) -> T) -> Self {
        Self {
            data: Seat::all().map(factory).collect(),
        }
    }

    /// Create a new SeatMap with all entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Create a new SeatMap with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    #[must_use]
    pub fn get(&self, seat: Seat) -> &T {
        &self.data[seat.index()]
    }

    pub fn get_mut(&mut self, seat: Seat) -> &mut T {
        &mut self.data[seat.index()]
    }

    /// Iterate over (Seat, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Seat, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over (Seat, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Seat, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (Seat(i as u8), v))
    }

    /// Iterate over the values in seat order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    /// Build a new map by transforming each entry.
    pub fn map<U>(&self, f: impl Fn(Seat, &T) -> U) -> SeatMap<U> {
        SeatMap {
            data: self.iter().map(|(s, v)| f(s, v)).collect(),
        }
    }
}

impl<T> Index<Seat> for SeatMap<T> {
    type Output = T;

    fn index(&self, seat: Seat) -> &Self::Output {
        self.get(seat)
    }
}

impl<T> IndexMut<Seat> for SeatMap<T> {
    fn index_mut(&mut self, seat: Seat) -> &mut Self::Output {
        self.get_mut(seat)
    }
}
