//! Rule document persistence.

use mahjong_table::core::{
    GameLength, MahjongRule, MinimumHan, RedFive, ThinkingTime, YakumanStacking,
};
use mahjong_table::error::MahjongError;

fn custom_rule() -> MahjongRule {
    MahjongRule::default()
        .with_length(GameLength::East)
        .with_thinking_time(ThinkingTime::VeryShort)
        .with_points(30000, 35000)
        .with_minimum_han(MinimumHan::Two)
        .with_red_five(RedFive::Four)
        .with_open_tanyao(false)
        .with_yakuman_stacking(YakumanStacking::Cumulative)
}

#[test]
fn test_json_round_trip() {
    let rule = custom_rule();
    let json = rule.to_json().unwrap();
    assert_eq!(MahjongRule::from_json(&json).unwrap(), rule);
}

#[test]
fn test_file_round_trip() {
    let path = std::env::temp_dir().join(format!("mahjong-rule-{}.json", std::process::id()));
    let rule = custom_rule();
    rule.save(&path).unwrap();
    let loaded = MahjongRule::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, rule);
}

#[test]
fn test_invalid_documents_are_refused() {
    let inverted = MahjongRule::default().with_points(30000, 25000);
    let json = serde_json::json!({ "version": 1, "rule": inverted }).to_string();
    assert!(matches!(
        MahjongRule::from_json(&json),
        Err(MahjongError::RuleInvalid(_))
    ));

    let future = serde_json::json!({ "version": 99, "rule": MahjongRule::default() }).to_string();
    assert!(matches!(
        MahjongRule::from_json(&future),
        Err(MahjongError::RuleInvalid(_))
    ));

    assert!(matches!(
        MahjongRule::from_json("{\"version\": 1}"),
        Err(MahjongError::Serialization(_))
    ));
    assert!(matches!(
        MahjongRule::load("/definitely/not/here.json"),
        Err(MahjongError::Io(_))
    ));
}
