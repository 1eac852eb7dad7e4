use std::fs;
use std::path::PathBuf;

use jungle_pulse::error::FetchError;
use jungle_pulse::riot_fetch::{
    parse_account_json, parse_live_game_json, parse_match_detail_json, parse_match_ids_json,
    parse_profile_json,
};
use jungle_pulse::sources::AccountHandle;
use jungle_pulse::state::{DataQuality, IdentityHandle, Kda, MatchResult};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_user_fixture() {
    let profile = parse_profile_json(&read_fixture("user.json")).expect("fixture should parse");
    assert_eq!(profile.identity, IdentityHandle::new("Not Alet", "JCP"));
    assert_eq!(profile.region, "las");
    assert_eq!(profile.league_points(), 91);
    assert_eq!(
        profile.rank.as_ref().map(|r| r.label()),
        Some("Platinum IV".to_string())
    );
    assert_eq!(
        profile.preferred_champions,
        vec!["Graves", "Kindred", "Kha'Zix"]
    );
}

#[test]
fn null_user_is_not_found() {
    assert!(matches!(parse_profile_json("null"), Err(FetchError::NotFound(_))));
}

#[test]
fn unranked_user_has_no_rank() {
    let raw = r#"{"riot_id":"Someone","tag_line":"NA1","rank_tier":null,"league_points":0}"#;
    let profile = parse_profile_json(raw).expect("should parse");
    assert!(profile.rank.is_none());
    assert_eq!(profile.region, "las");
    assert!(profile.preferred_champions.is_empty());
}

#[test]
fn garbage_user_is_malformed() {
    assert!(matches!(
        parse_profile_json("<html>"),
        Err(FetchError::Malformed(_))
    ));
}

#[test]
fn parses_account_fixture() {
    let account = parse_account_json(&read_fixture("account.json")).expect("fixture should parse");
    assert_eq!(account, AccountHandle("puuid-not-alet-jcp".to_string()));
}

#[test]
fn parses_match_ids_fixture() {
    let ids = parse_match_ids_json(&read_fixture("match_ids.json")).expect("fixture should parse");
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "LA2_1500000003");
    assert!(parse_match_ids_json("null").unwrap().is_empty());
}

#[test]
fn parses_match_detail_fixture() {
    let account = AccountHandle("puuid-not-alet-jcp".to_string());
    let summary = parse_match_detail_json(
        &read_fixture("match_detail.json"),
        "LA2_1500000003",
        &account,
    )
    .expect("fixture should parse");
    assert_eq!(summary.id, "LA2_1500000003");
    assert_eq!(summary.champion, "Graves");
    assert_eq!(summary.result, MatchResult::Win);
    assert_eq!(summary.kda, Kda::new(8, 2, 6));
    assert_eq!(summary.duration_minutes, 28);
    assert_eq!(summary.quality, DataQuality::Live);
}

#[test]
fn match_detail_without_player_is_malformed() {
    let stranger = AccountHandle("puuid-nobody".to_string());
    let err = parse_match_detail_json(&read_fixture("match_detail.json"), "LA2_1", &stranger)
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[test]
fn huge_match_duration_saturates_instead_of_overflowing() {
    let raw = r#"{"info":{"gameDuration":9223372036854775807,"gameEndTimestamp":1,"participants":[
        {"puuid":"p","championName":"Graves","kills":1,"deaths":1,"assists":1,"win":true}]}}"#;
    let summary = parse_match_detail_json(raw, "LA2_1", &AccountHandle("p".to_string()))
        .expect("large durations still parse");
    assert_eq!(summary.duration_minutes, u32::MAX);
}

#[test]
fn negative_match_duration_is_malformed() {
    let raw = r#"{"info":{"gameDuration":-60,"gameEndTimestamp":1,"participants":[
        {"puuid":"p","championName":"Graves","kills":1,"deaths":1,"assists":1,"win":true}]}}"#;
    let err = parse_match_detail_json(raw, "LA2_1", &AccountHandle("p".to_string())).unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
}

#[test]
fn riot_id_wins_over_summoner_name() {
    let raw = r#"{"riot_id":"Not Alet","summoner_name":"OldName","tag_line":"JCP"}"#;
    let profile = parse_profile_json(raw).expect("should parse");
    assert_eq!(profile.identity.name, "Not Alet");

    let legacy = r#"{"riot_id":"","summoner_name":"OldName","tag_line":"JCP"}"#;
    let profile = parse_profile_json(legacy).expect("should parse");
    assert_eq!(profile.identity.name, "OldName");
}

#[test]
fn parses_live_game_fixture() {
    assert_eq!(parse_live_game_json(&read_fixture("live_game.json")), Ok(true));
    assert_eq!(parse_live_game_json(r#"{"in_game":false}"#), Ok(false));
    assert!(parse_live_game_json("{}").is_err());
}
