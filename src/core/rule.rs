//! Rule configuration.
//!
//! A [`MahjongRule`] is fixed for the duration of a game. It can only be
//! replaced while the table is waiting, and a replacement is validated as a
//! whole: either every field is accepted or the old rule stays.
//!
//! ## Persistence
//!
//! The default rule is stored as a versioned JSON document:
//!
//! ```json
//! { "version": 1, "rule": { "length": "South", "starting_points": 25000, ... } }
//! ```
//!
//! Fields missing from an older document take their defaults. Documents
//! written by a newer version are refused.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MahjongError, MahjongResult};

/// Lowest allowed value for point settings.
pub const MIN_POINTS: i32 = 100;

/// Highest allowed value for point settings.
pub const MAX_POINTS: i32 = 200_000;

/// Points staked on a riichi declaration.
pub const RIICHI_STAKE: i32 = 1000;

/// Current rule document version.
pub const RULE_DOCUMENT_VERSION: u32 = 1;

/// How many rounds a game lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameLength {
    /// East 1 only.
    OneGame,
    /// East 1 to East 4.
    East,
    /// East 1 to South 4.
    South,
}

impl GameLength {
    /// Index of the last scheduled round, counting East 1 as 0.
    #[must_use]
    pub const fn final_round(self) -> u8 {
        match self {
            GameLength::OneGame => 0,
            GameLength::East => 3,
            GameLength::South => 7,
        }
    }

    /// Index of the last round of the sudden-death extension.
    #[must_use]
    pub const fn extension_limit(self) -> u8 {
        self.final_round() + 4
    }
}

/// Time allowed per decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThinkingTime {
    VeryShort,
    Short,
    Normal,
    Long,
    VeryLong,
}

impl ThinkingTime {
    /// Seconds for every decision.
    #[must_use]
    pub const fn base_secs(self) -> u64 {
        match self {
            ThinkingTime::VeryShort => 3,
            ThinkingTime::Short | ThinkingTime::Normal => 5,
            ThinkingTime::Long => 60,
            ThinkingTime::VeryLong => 300,
        }
    }

    /// Seconds in the per-round bank used once the base time runs out.
    #[must_use]
    pub const fn extra_secs(self) -> u64 {
        match self {
            ThinkingTime::VeryShort => 5,
            ThinkingTime::Short => 10,
            ThinkingTime::Normal => 20,
            ThinkingTime::Long | ThinkingTime::VeryLong => 0,
        }
    }

    #[must_use]
    pub const fn base(self) -> Duration {
        Duration::from_secs(self.base_secs())
    }

    #[must_use]
    pub const fn extra(self) -> Duration {
        Duration::from_secs(self.extra_secs())
    }
}

/// Minimum yaku han needed to win. Dora do not count towards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinimumHan {
    One,
    Two,
    Four,
    Yakuman,
}

impl MinimumHan {
    #[must_use]
    pub const fn han(self) -> u32 {
        match self {
            MinimumHan::One => 1,
            MinimumHan::Two => 2,
            MinimumHan::Four => 4,
            MinimumHan::Yakuman => 13,
        }
    }
}

/// Which fives in the wall are red.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RedFive {
    None,
    /// One red five per suit.
    Three,
    /// One in man and sou, two in pin.
    Four,
}

impl RedFive {
    /// Red fives per suit in man, pin, sou order.
    #[must_use]
    pub const fn red_fives(self) -> [u8; 3] {
        match self {
            RedFive::None => [0, 0, 0],
            RedFive::Three => [1, 1, 1],
            RedFive::Four => [1, 2, 1],
        }
    }
}

/// How several yakuman in one hand are paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YakumanStacking {
    /// Any number of yakuman pays a single yakuman.
    #[default]
    Single,
    /// Each yakuman adds another multiple.
    Cumulative,
}

/// A complete rule set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MahjongRule {
    pub length: GameLength,
    pub thinking_time: ThinkingTime,
    pub starting_points: i32,
    /// Points a seat needs before the game may end after the final round.
    pub min_points_to_win: i32,
    pub minimum_han: MinimumHan,
    /// Whether non-seated observers may watch.
    pub spectate: bool,
    pub red_five: RedFive,
    pub open_tanyao: bool,
    pub yakuman_stacking: YakumanStacking,
}

impl Default for MahjongRule {
    fn default() -> Self {
        Self {
            length: GameLength::South,
            thinking_time: ThinkingTime::Normal,
            starting_points: 25_000,
            min_points_to_win: 30_000,
            minimum_han: MinimumHan::One,
            spectate: true,
            red_five: RedFive::None,
            open_tanyao: true,
            yakuman_stacking: YakumanStacking::Single,
        }
    }
}

impl MahjongRule {
    #[must_use]
    pub fn with_length(mut self, length: GameLength) -> Self {
        self.length = length;
        self
    }

    #[must_use]
    pub fn with_thinking_time(mut self, thinking_time: ThinkingTime) -> Self {
        self.thinking_time = thinking_time;
        self
    }

    #[must_use]
    pub fn with_points(mut self, starting_points: i32, min_points_to_win: i32) -> Self {
        self.starting_points = starting_points;
        self.min_points_to_win = min_points_to_win;
        self
    }

    #[must_use]
    pub fn with_minimum_han(mut self, minimum_han: MinimumHan) -> Self {
        self.minimum_han = minimum_han;
        self
    }

    #[must_use]
    pub fn with_red_five(mut self, red_five: RedFive) -> Self {
        self.red_five = red_five;
        self
    }

    #[must_use]
    pub fn with_open_tanyao(mut self, open_tanyao: bool) -> Self {
        self.open_tanyao = open_tanyao;
        self
    }

    #[must_use]
    pub fn with_yakuman_stacking(mut self, stacking: YakumanStacking) -> Self {
        self.yakuman_stacking = stacking;
        self
    }

    /// Check the point bounds.
    ///
    /// ```
    /// use mahjong_table::core::MahjongRule;
    ///
    /// assert!(MahjongRule::default().validate().is_ok());
    /// assert!(MahjongRule::default().with_points(30000, 25000).validate().is_err());
    /// ```
    pub fn validate(&self) -> MahjongResult<()> {
        let in_range = |value: i32| (MIN_POINTS..=MAX_POINTS).contains(&value);
        if !in_range(self.starting_points) {
            return Err(MahjongError::RuleInvalid(format!(
                "starting points {} outside {MIN_POINTS}..={MAX_POINTS}",
                self.starting_points
            )));
        }
        if !in_range(self.min_points_to_win) {
            return Err(MahjongError::RuleInvalid(format!(
                "points to win {} outside {MIN_POINTS}..={MAX_POINTS}",
                self.min_points_to_win
            )));
        }
        if self.min_points_to_win < self.starting_points {
            return Err(MahjongError::RuleInvalid(format!(
                "points to win {} below starting points {}",
                self.min_points_to_win, self.starting_points
            )));
        }
        Ok(())
    }

    /// Serialize as a versioned rule document.
    pub fn to_json(&self) -> MahjongResult<String> {
        let document = RuleDocument {
            version: RULE_DOCUMENT_VERSION,
            rule: self.clone(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Parse and validate a versioned rule document.
    pub fn from_json(json: &str) -> MahjongResult<Self> {
        let document: RuleDocument = serde_json::from_str(json)?;
        if document.version > RULE_DOCUMENT_VERSION {
            return Err(MahjongError::RuleInvalid(format!(
                "rule document version {} is newer than {RULE_DOCUMENT_VERSION}",
                document.version
            )));
        }
        document.rule.validate()?;
        Ok(document.rule)
    }

    pub fn load(path: impl AsRef<Path>) -> MahjongResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> MahjongResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// On-disk form of a rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub version: u32,
    pub rule: MahjongRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let rule = MahjongRule::default();
        assert_eq!(rule.length, GameLength::South);
        assert_eq!(rule.starting_points, 25_000);
        assert_eq!(rule.min_points_to_win, 30_000);
        assert!(rule.open_tanyao);
        assert!(rule.spectate);
        assert_eq!(rule.red_five.red_fives(), [0, 0, 0]);
    }

    #[test]
    fn test_validation_bounds() {
        assert!(MahjongRule::default().with_points(100, 100).validate().is_ok());
        assert!(MahjongRule::default()
            .with_points(200_000, 200_000)
            .validate()
            .is_ok());
        assert!(MahjongRule::default().with_points(99, 1000).validate().is_err());
        assert!(MahjongRule::default()
            .with_points(1000, 200_001)
            .validate()
            .is_err());

        let err = MahjongRule::default()
            .with_points(30_000, 25_000)
            .validate()
            .unwrap_err();
        assert!(matches!(err, MahjongError::RuleInvalid(_)));
    }

    #[test]
    fn test_thinking_time_tiers() {
        assert_eq!(ThinkingTime::VeryShort.base(), Duration::from_secs(3));
        assert_eq!(ThinkingTime::Normal.extra(), Duration::from_secs(20));
        assert_eq!(ThinkingTime::VeryLong.extra_secs(), 0);
    }

    #[test]
    fn test_game_length_rounds() {
        assert_eq!(GameLength::OneGame.final_round(), 0);
        assert_eq!(GameLength::East.final_round(), 3);
        assert_eq!(GameLength::South.extension_limit(), 11);
    }

    #[test]
    fn test_json_round_trip() {
        let rule = MahjongRule::default()
            .with_length(GameLength::East)
            .with_red_five(RedFive::Four)
            .with_minimum_han(MinimumHan::Two)
            .with_yakuman_stacking(YakumanStacking::Cumulative);
        let json = rule.to_json().unwrap();
        assert!(json.contains("\"version\": 1"));
        assert_eq!(MahjongRule::from_json(&json).unwrap(), rule);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{ "version": 1, "rule": { "length": "East", "starting_points": 30000, "min_points_to_win": 30000 } }"#;
        let rule = MahjongRule::from_json(json).unwrap();
        assert_eq!(rule.length, GameLength::East);
        assert_eq!(rule.yakuman_stacking, YakumanStacking::Single);
        assert_eq!(rule.thinking_time, ThinkingTime::Normal);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = r#"{ "version": 2, "rule": {} }"#;
        assert!(matches!(
            MahjongRule::from_json(json),
            Err(MahjongError::RuleInvalid(_))
        ));
    }

    #[test]
    fn test_invalid_document_rejected() {
        let json = r#"{ "version": 1, "rule": { "starting_points": 50 } }"#;
        assert!(MahjongRule::from_json(json).is_err());
        assert!(matches!(
            MahjongRule::from_json("not json"),
            Err(MahjongError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("mahjong-rule-{}.json", std::process::id()));
        let rule = MahjongRule::default().with_thinking_time(ThinkingTime::Long);
        rule.save(&path).unwrap();
        assert_eq!(MahjongRule::load(&path).unwrap(), rule);
        std::fs::remove_file(&path).unwrap();
    }
}
