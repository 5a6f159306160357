//! Tile identity.
//!
//! A tile is one of 34 kinds, optionally flagged as a red five. Kinds are
//! indexed the way every count array in the crate is indexed:
//!
//! | index | tiles |
//! |-------|-------|
//! | 0-8   | 1-9 man |
//! | 9-17  | 1-9 pin |
//! | 18-26 | 1-9 sou |
//! | 27-30 | East, South, West, North |
//! | 31-33 | White, Green, Red dragons |
//!
//! Text notation follows the usual `123m456p789s1234567z` form with `0` for
//! a red five.

use serde::{Deserialize, Serialize};

use crate::core::Wind;
use crate::error::{MahjongError, MahjongResult};

/// Number of distinct tile kinds.
pub const KIND_COUNT: usize = 34;

/// Per-kind tile counts.
pub type TileCounts = [u8; KIND_COUNT];

/// Tile suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Man,
    Pin,
    Sou,
    Honor,
}

impl Suit {
    fn letter(self) -> char {
        match self {
            Suit::Man => 'm',
            Suit::Pin => 'p',
            Suit::Sou => 's',
            Suit::Honor => 'z',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'm' => Some(Suit::Man),
            'p' => Some(Suit::Pin),
            's' => Some(Suit::Sou),
            'z' => Some(Suit::Honor),
            _ => None,
        }
    }
}

/// Dragon tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dragon {
    White,
    Green,
    Red,
}

/// A single tile. Equality is by identity: a red five differs from a plain
/// five of the same suit, but both have the same [`Tile::kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Tile {
    kind: u8,
    red: bool,
}

impl Tile {
    /// Plain tile of the given kind (0-33).
    #[must_use]
    pub const fn new(kind: u8) -> Self {
        assert!((kind as usize) < KIND_COUNT, "Tile kind out of range");
        Self { kind, red: false }
    }

    /// Red five of a suited kind.
    #[must_use]
    pub const fn red_five(suit: Suit) -> Self {
        let kind = match suit {
            Suit::Man => 4,
            Suit::Pin => 13,
            Suit::Sou => 22,
            Suit::Honor => panic!("Honor tiles have no red five"),
        };
        Self { kind, red: true }
    }

    #[must_use]
    pub const fn man(number: u8) -> Self {
        Self::new(number - 1)
    }

    #[must_use]
    pub const fn pin(number: u8) -> Self {
        Self::new(9 + number - 1)
    }

    #[must_use]
    pub const fn sou(number: u8) -> Self {
        Self::new(18 + number - 1)
    }

    #[must_use]
    pub const fn wind(wind: Wind) -> Self {
        Self::new(27 + wind as u8)
    }

    #[must_use]
    pub const fn dragon(dragon: Dragon) -> Self {
        Self::new(31 + dragon as u8)
    }

    /// Kind index, shared by red and plain fives.
    #[must_use]
    pub const fn kind(self) -> u8 {
        self.kind
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.kind as usize
    }

    #[must_use]
    pub const fn is_red(self) -> bool {
        self.red
    }

    /// Same tile without the red flag.
    #[must_use]
    pub const fn plain(self) -> Self {
        Self {
            kind: self.kind,
            red: false,
        }
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        kind_suit(self.kind)
    }

    /// Face number 1-9 for suited tiles, 1-7 for honors.
    #[must_use]
    pub const fn number(self) -> u8 {
        kind_number(self.kind)
    }

    #[must_use]
    pub const fn is_honor(self) -> bool {
        self.kind >= 27
    }

    #[must_use]
    pub const fn is_terminal_or_honor(self) -> bool {
        is_terminal_or_honor(self.kind)
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let number = if self.red { 0 } else { self.number() };
        write!(f, "{}{}", number, self.suit().letter())
    }
}

impl From<Tile> for String {
    fn from(tile: Tile) -> Self {
        tile.to_string()
    }
}

impl TryFrom<String> for Tile {
    type Error = MahjongError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for Tile {
    type Err = MahjongError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tiles = parse_tiles(s)?;
        match tiles.as_slice() {
            [tile] => Ok(*tile),
            _ => Err(MahjongError::parse(s, "expected exactly one tile")),
        }
    }
}

/// Suit of a kind index.
#[must_use]
pub const fn kind_suit(kind: u8) -> Suit {
    match kind / 9 {
        0 => Suit::Man,
        1 => Suit::Pin,
        2 => Suit::Sou,
        _ => Suit::Honor,
    }
}

/// Face number of a kind index.
#[must_use]
pub const fn kind_number(kind: u8) -> u8 {
    if kind >= 27 {
        kind - 27 + 1
    } else {
        kind % 9 + 1
    }
}

#[must_use]
pub const fn is_terminal_or_honor(kind: u8) -> bool {
    kind >= 27 || kind % 9 == 0 || kind % 9 == 8
}

#[must_use]
pub const fn is_terminal(kind: u8) -> bool {
    kind < 27 && (kind % 9 == 0 || kind % 9 == 8)
}

#[must_use]
pub const fn is_dragon(kind: u8) -> bool {
    kind >= 31
}

#[must_use]
pub const fn is_wind(kind: u8) -> bool {
    kind >= 27 && kind < 31
}

/// Kind of the wind tile for `wind`.
#[must_use]
pub const fn wind_kind(wind: Wind) -> u8 {
    27 + wind as u8
}

/// The dora kind pointed at by an indicator kind.
#[must_use]
pub const fn dora_from_indicator(indicator: u8) -> u8 {
    match indicator {
        0..=26 => indicator / 9 * 9 + (indicator % 9 + 1) % 9,
        27..=30 => 27 + (indicator - 27 + 1) % 4,
        _ => 31 + (indicator - 31 + 1) % 3,
    }
}

/// Kinds that make up the thirteen orphans hand.
pub const TERMINALS_AND_HONORS: [u8; 13] = [0, 8, 9, 17, 18, 26, 27, 28, 29, 30, 31, 32, 33];

/// Count tiles per kind.
#[must_use]
pub fn counts_of(tiles: &[Tile]) -> TileCounts {
    let mut counts = [0u8; KIND_COUNT];
    for tile in tiles {
        counts[tile.index()] += 1;
    }
    counts
}

/// Parse tile notation such as `"123m0p55s777z"`.
///
/// ```
/// use mahjong_table::tiles::parse_tiles;
///
/// let tiles = parse_tiles("19m0p7z").unwrap();
/// assert_eq!(tiles.len(), 4);
/// assert!(tiles[2].is_red());
/// ```
pub fn parse_tiles(input: &str) -> MahjongResult<Vec<Tile>> {
    let mut tiles = Vec::new();
    let mut pending: Vec<u8> = Vec::new();

    for c in input.chars() {
        if c.is_whitespace() {
            continue;
        }
        if let Some(d) = c.to_digit(10) {
            pending.push(d as u8);
            continue;
        }
        let suit = Suit::from_letter(c)
            .ok_or_else(|| MahjongError::parse(input, format!("unknown suit '{c}'")))?;
        if pending.is_empty() {
            return Err(MahjongError::parse(input, format!("suit '{c}' without numbers")));
        }
        for number in pending.drain(..) {
            tiles.push(make_tile(input, number, suit)?);
        }
    }

    if !pending.is_empty() {
        return Err(MahjongError::parse(input, "trailing numbers without a suit"));
    }
    Ok(tiles)
}

fn make_tile(input: &str, number: u8, suit: Suit) -> MahjongResult<Tile> {
    match (suit, number) {
        (Suit::Honor, 1..=7) => Ok(Tile::new(27 + number - 1)),
        (Suit::Honor, _) => Err(MahjongError::parse(input, "honor tiles are numbered 1-7")),
        (_, 0) => Ok(Tile::red_five(suit)),
        (Suit::Man, n) => Ok(Tile::man(n)),
        (Suit::Pin, n) => Ok(Tile::pin(n)),
        (Suit::Sou, n) => Ok(Tile::sou(n)),
    }
}

/// The full 136-tile set with `red_fives` plain fives replaced by red ones.
///
/// `red_fives` holds how many red fives each suit (man, pin, sou) gets.
#[must_use]
pub fn full_set(red_fives: [u8; 3]) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(KIND_COUNT * 4);
    for kind in 0..KIND_COUNT as u8 {
        let reds = match kind {
            4 => red_fives[0],
            13 => red_fives[1],
            22 => red_fives[2],
            _ => 0,
        };
        for copy in 0..4 {
            tiles.push(Tile {
                kind,
                red: copy < reds,
            });
        }
    }
    tiles
}
