use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::state::MatchSummary;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChampionStats {
    pub name: String,
    pub games: usize,
    pub wins: usize,
    pub win_rate: u8,
    pub kda: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    // 0-100, rounded to the nearest integer.
    pub win_rate: u8,
    // (kills + assists) / deaths over the whole sequence, one decimal.
    pub average_kda: f64,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
    pub champions: Vec<ChampionStats>,
}

#[derive(Default)]
struct Totals {
    games: usize,
    wins: usize,
    kills: u64,
    deaths: u64,
    assists: u64,
}

impl Totals {
    fn add(&mut self, m: &MatchSummary) {
        self.games += 1;
        if m.result.is_win() {
            self.wins += 1;
        }
        self.kills += u64::from(m.kda.kills);
        self.deaths += u64::from(m.kda.deaths);
        self.assists += u64::from(m.kda.assists);
    }
}

/// Reduces a match sequence to aggregate metrics. Order of `matches` does not matter.
pub fn compute(matches: &[MatchSummary]) -> AggregateStats {
    let mut totals = Totals::default();
    let mut per_champion: HashMap<&str, Totals> = HashMap::new();
    for m in matches {
        totals.add(m);
        per_champion.entry(m.champion.as_str()).or_default().add(m);
    }

    let mut champions = per_champion
        .into_iter()
        .map(|(name, t)| ChampionStats {
            name: name.to_string(),
            games: t.games,
            wins: t.wins,
            win_rate: win_rate(t.wins, t.games),
            kda: kda_ratio(t.kills, t.deaths, t.assists),
        })
        .collect::<Vec<_>>();
    champions.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.name.cmp(&b.name)));

    AggregateStats {
        games: totals.games,
        wins: totals.wins,
        losses: totals.games - totals.wins,
        win_rate: win_rate(totals.wins, totals.games),
        average_kda: kda_ratio(totals.kills, totals.deaths, totals.assists),
        avg_kills: per_game(totals.kills, totals.games),
        avg_deaths: per_game(totals.deaths, totals.games),
        avg_assists: per_game(totals.assists, totals.games),
        champions,
    }
}

pub fn win_rate(wins: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * wins as f64 / total as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Zero deaths is not an error: the ratio degrades to kills + assists.
pub fn kda_ratio(kills: u64, deaths: u64, assists: u64) -> f64 {
    let takedowns = (kills + assists) as f64;
    if deaths == 0 {
        return round1(takedowns);
    }
    round1(takedowns / deaths as f64)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn per_game(total: u64, games: usize) -> f64 {
    if games == 0 {
        return 0.0;
    }
    round1(total as f64 / games as f64)
}
