use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::stats::{self, AggregateStats};

const MAX_LOGS: usize = 200;

/// User-facing `name#tag` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityHandle {
    pub name: String,
    pub tag: String,
}

impl IdentityHandle {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for IdentityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankInfo {
    pub tier: String,
    pub division: String,
    pub league_points: u32,
}

impl RankInfo {
    /// "PLATINUM" + "IV" renders as "Platinum IV".
    pub fn label(&self) -> String {
        let mut chars = self.tier.chars();
        let tier: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => String::new(),
        };
        if self.division.is_empty() {
            tier
        } else {
            format!("{tier} {}", self.division)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub identity: IdentityHandle,
    pub region: String,
    pub rank: Option<RankInfo>,
    pub preferred_champions: Vec<String>,
}

impl UserProfile {
    pub fn league_points(&self) -> u32 {
        self.rank.as_ref().map(|r| r.league_points).unwrap_or(0)
    }
}

/// Provenance label carried by every data slot and every match entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    Live,
    Partial,
    Fallback,
}

impl DataQuality {
    pub fn is_degraded(self) -> bool {
        !matches!(self, DataQuality::Live)
    }

    pub fn label(self) -> &'static str {
        match self {
            DataQuality::Live => "LIVE",
            DataQuality::Partial => "PARTIAL",
            DataQuality::Fallback => "BASIC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
}

impl MatchResult {
    pub fn from_win(win: bool) -> Self {
        if win { MatchResult::Win } else { MatchResult::Loss }
    }

    pub fn is_win(self) -> bool {
        matches!(self, MatchResult::Win)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Kda {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}

impl Kda {
    pub const fn new(kills: u32, deaths: u32, assists: u32) -> Self {
        Self {
            kills,
            deaths,
            assists,
        }
    }

    /// Builds a triple from signed upstream values, rejecting negatives.
    pub fn try_new(kills: i64, deaths: i64, assists: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            kills: non_negative("kills", kills)?,
            deaths: non_negative("deaths", deaths)?,
            assists: non_negative("assists", assists)?,
        })
    }

    pub fn ratio(&self) -> f64 {
        stats::kda_ratio(
            u64::from(self.kills),
            u64::from(self.deaths),
            u64::from(self.assists),
        )
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeCount { field, value });
    }
    u32::try_from(value).map_err(|_| ValidationError::NegativeCount { field, value })
}

impl FromStr for Kda {
    type Err = ValidationError;

    /// Parses the "kills/deaths/assists" form, e.g. "8/2/6".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('/')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ValidationError::KdaFormat(s.to_string()))?;
        match parts.as_slice() {
            [k, d, a] => Kda::try_new(*k, *d, *a),
            _ => Err(ValidationError::KdaFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Kda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.kills, self.deaths, self.assists)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: String,
    pub champion: String,
    pub result: MatchResult,
    pub kda: Kda,
    pub duration_minutes: u32,
    pub quality: DataQuality,
}

impl MatchSummary {
    pub fn try_new(
        id: impl Into<String>,
        champion: impl Into<String>,
        result: MatchResult,
        kda: Kda,
        duration_minutes: u32,
        quality: DataQuality,
    ) -> Result<Self, ValidationError> {
        if duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        Ok(Self {
            id: id.into(),
            champion: champion.into(),
            result,
            kda,
            duration_minutes,
            quality,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveStatus {
    Checking,
    InGame,
    NotInGame,
}

impl LiveStatus {
    pub fn label(self) -> &'static str {
        match self {
            LiveStatus::Checking => "CHECKING",
            LiveStatus::InGame => "IN GAME",
            LiveStatus::NotInGame => "NOT IN GAME",
        }
    }

    /// A new tracking session can only begin once we know no game is running.
    pub fn can_start_session(self) -> bool {
        matches!(self, LiveStatus::NotInGame)
    }
}

/// Profile, match history and their provenance, written as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSlot {
    pub profile: Option<UserProfile>,
    pub profile_quality: DataQuality,
    pub matches: Vec<MatchSummary>,
    pub history_quality: DataQuality,
    pub history_tier: Option<String>,
    pub error: Option<String>,
    pub notices: Vec<String>,
}

impl ProfileSlot {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            profile: None,
            profile_quality: DataQuality::Fallback,
            matches: Vec::new(),
            history_quality: DataQuality::Fallback,
            history_tier: None,
            error: Some(error.into()),
            notices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub loading: bool,
    pub profile: Option<UserProfile>,
    pub profile_quality: DataQuality,
    pub matches: Vec<MatchSummary>,
    pub history_quality: DataQuality,
    pub history_tier: Option<String>,
    pub stats: AggregateStats,
    pub live_status: LiveStatus,
    pub live_checked_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub logs: VecDeque<String>,
    // Refreshes begun but not yet settled; `loading` stays up while any remain.
    pub refreshes_in_flight: usize,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            loading: true,
            profile: None,
            profile_quality: DataQuality::Live,
            matches: Vec::new(),
            history_quality: DataQuality::Live,
            history_tier: None,
            stats: AggregateStats::default(),
            live_status: LiveStatus::Checking,
            live_checked_at: None,
            error: None,
            updated_at: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            refreshes_in_flight: 0,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.profile.is_some()
            && (self.profile_quality.is_degraded() || self.history_quality.is_degraded())
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    BeginRefresh,
    SetProfileSlot(ProfileSlot),
    SetLiveStatus(LiveStatus),
    Log(String),
}

pub fn apply_delta(snapshot: &mut Snapshot, delta: Delta) {
    match delta {
        Delta::BeginRefresh => {
            snapshot.refreshes_in_flight += 1;
            snapshot.loading = true;
        }
        Delta::SetProfileSlot(slot) => {
            let ProfileSlot {
                profile,
                profile_quality,
                mut matches,
                history_quality,
                mut history_tier,
                error,
                notices,
            } = slot;
            // Match data never outlives the profile it was aggregated for.
            if profile.is_none() {
                matches.clear();
                history_tier = None;
            }
            snapshot.stats = stats::compute(&matches);
            snapshot.profile = profile;
            snapshot.profile_quality = profile_quality;
            snapshot.matches = matches;
            snapshot.history_quality = history_quality;
            snapshot.history_tier = history_tier;
            snapshot.error = error;
            snapshot.updated_at = Some(Utc::now());
            snapshot.refreshes_in_flight = snapshot.refreshes_in_flight.saturating_sub(1);
            snapshot.loading = snapshot.refreshes_in_flight > 0;
            for notice in notices {
                snapshot.push_log(notice);
            }
        }
        Delta::SetLiveStatus(status) => {
            // Ticks only ever confirm a state; Checking is never re-entered.
            if status == LiveStatus::Checking {
                return;
            }
            snapshot.live_status = status;
            snapshot.live_checked_at = Some(Utc::now());
        }
        Delta::Log(msg) => snapshot.push_log(msg),
    }
}
