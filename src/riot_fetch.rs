use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::config::DEFAULT_REGION;
use crate::error::{FetchError, ValidationError};
use crate::http_client::{fetch_text, http_client};
use crate::sources::{AccountHandle, LiveGameSource, MatchSource, ProfileSource};
use crate::state::{
    DataQuality, IdentityHandle, Kda, MatchResult, MatchSummary, RankInfo, UserProfile,
};

/// HTTP+JSON client for the companion backend, serving all three source roles.
pub struct HttpBackend {
    client: &'static Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = http_client()?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid API base url {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base url {base_url} cannot carry a path");
        }
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Malformed(format!("bad base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}

#[async_trait]
impl ProfileSource for HttpBackend {
    async fn get_profile(&self, identity: &IdentityHandle) -> Result<UserProfile, FetchError> {
        let url = self.endpoint(&["users", "riot", &identity.name])?;
        let body = fetch_text(self.client, &url, &[]).await?;
        parse_profile_json(&body)
    }
}

#[async_trait]
impl MatchSource for HttpBackend {
    async fn resolve_account(
        &self,
        identity: &IdentityHandle,
        region: &str,
    ) -> Result<AccountHandle, FetchError> {
        let url = self.endpoint(&["riot", "summoner", &identity.name, &identity.tag])?;
        let body = fetch_text(self.client, &url, &[("region", region.to_string())]).await?;
        parse_account_json(&body)
    }

    async fn recent_match_ids(
        &self,
        account: &AccountHandle,
        count: usize,
        region: &str,
    ) -> Result<Vec<String>, FetchError> {
        let url = self.endpoint(&["riot", "matches", account.as_str()])?;
        let query = [("count", count.to_string()), ("region", region.to_string())];
        let body = fetch_text(self.client, &url, &query).await?;
        parse_match_ids_json(&body)
    }

    async fn match_detail(
        &self,
        match_id: &str,
        account: &AccountHandle,
        region: &str,
    ) -> Result<MatchSummary, FetchError> {
        let url = self.endpoint(&["riot", "match", match_id])?;
        let body = fetch_text(self.client, &url, &[("region", region.to_string())]).await?;
        parse_match_detail_json(&body, match_id, account)
    }
}

#[async_trait]
impl LiveGameSource for HttpBackend {
    async fn live_game(&self, identity: &IdentityHandle, region: &str) -> Result<bool, FetchError> {
        let url = self.endpoint(&["jungle", "live-game", &identity.name, &identity.tag])?;
        let body = fetch_text(self.client, &url, &[("region", region.to_string())]).await?;
        parse_live_game_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct UserJson {
    #[serde(default)]
    riot_id: Option<String>,
    #[serde(default)]
    summoner_name: Option<String>,
    #[serde(default)]
    tag_line: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    rank_tier: Option<String>,
    #[serde(default)]
    rank_division: Option<String>,
    #[serde(default)]
    league_points: i64,
    #[serde(default)]
    preferred_jungle_champions: Option<String>,
}

pub fn parse_profile_json(raw: &str) -> Result<UserProfile, FetchError> {
    let user = serde_json::from_str::<Option<UserJson>>(raw)
        .map_err(|err| FetchError::Malformed(format!("user json: {err}")))?
        .ok_or_else(|| FetchError::NotFound("user".to_string()))?;

    let name = user
        .riot_id
        .and_then(non_empty)
        .or_else(|| user.summoner_name.and_then(non_empty))
        .ok_or_else(|| FetchError::Malformed("user has no name".to_string()))?;
    let tag = user
        .tag_line
        .and_then(non_empty)
        .ok_or_else(|| FetchError::Malformed("user has no tag line".to_string()))?;

    let rank = user.rank_tier.and_then(non_empty).map(|tier| RankInfo {
        tier,
        division: user.rank_division.unwrap_or_default(),
        league_points: user.league_points.clamp(0, i64::from(u32::MAX)) as u32,
    });

    Ok(UserProfile {
        identity: IdentityHandle::new(name, tag),
        region: user
            .region
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
            .to_lowercase(),
        rank,
        preferred_champions: user
            .preferred_jungle_champions
            .as_deref()
            .map(parse_champion_list)
            .unwrap_or_default(),
    })
}

/// The backend stores preferred champions as a JSON array inside a string
/// column; older rows hold a plain comma list.
pub fn parse_champion_list(raw: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list.into_iter().filter_map(non_empty).collect();
    }
    raw.trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
struct AccountJson {
    #[serde(default)]
    puuid: Option<String>,
}

pub fn parse_account_json(raw: &str) -> Result<AccountHandle, FetchError> {
    let account = serde_json::from_str::<Option<AccountJson>>(raw)
        .map_err(|err| FetchError::Malformed(format!("account json: {err}")))?
        .ok_or_else(|| FetchError::NotFound("account".to_string()))?;
    account
        .puuid
        .and_then(non_empty)
        .map(AccountHandle)
        .ok_or_else(|| FetchError::Malformed("account has no puuid".to_string()))
}

pub fn parse_match_ids_json(raw: &str) -> Result<Vec<String>, FetchError> {
    let ids = serde_json::from_str::<Option<Vec<String>>>(raw)
        .map_err(|err| FetchError::Malformed(format!("match id json: {err}")))?;
    Ok(ids.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct MatchJson {
    info: Option<MatchInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchInfo {
    #[serde(default)]
    game_duration: i64,
    #[serde(default)]
    game_end_timestamp: Option<i64>,
    #[serde(default)]
    participants: Vec<ParticipantJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantJson {
    #[serde(default)]
    puuid: String,
    #[serde(default)]
    champion_name: String,
    #[serde(default)]
    kills: i64,
    #[serde(default)]
    deaths: i64,
    #[serde(default)]
    assists: i64,
    #[serde(default)]
    win: bool,
}

/// Reduces a match-v5 payload to the summary of `account`'s participation.
pub fn parse_match_detail_json(
    raw: &str,
    match_id: &str,
    account: &AccountHandle,
) -> Result<MatchSummary, FetchError> {
    let info = serde_json::from_str::<Option<MatchJson>>(raw)
        .map_err(|err| FetchError::Malformed(format!("match json: {err}")))?
        .and_then(|m| m.info)
        .ok_or_else(|| FetchError::NotFound(format!("match {match_id}")))?;

    let player = info
        .participants
        .iter()
        .find(|p| p.puuid == account.as_str())
        .ok_or_else(|| {
            FetchError::Malformed(format!("match {match_id} has no participant {account}"))
        })?;

    // Pre-11.20 payloads report milliseconds and omit gameEndTimestamp.
    let seconds = if info.game_end_timestamp.is_some() {
        info.game_duration
    } else {
        info.game_duration / 1000
    };
    let seconds = u64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or(ValidationError::NonPositiveDuration)?;
    let minutes = u32::try_from(seconds.div_ceil(60)).unwrap_or(u32::MAX);

    let kda = Kda::try_new(player.kills, player.deaths, player.assists)?;
    let champion = non_empty(player.champion_name.clone()).unwrap_or_else(|| "Unknown".to_string());
    let summary = MatchSummary::try_new(
        match_id,
        champion,
        MatchResult::from_win(player.win),
        kda,
        minutes,
        DataQuality::Live,
    )?;
    Ok(summary)
}

#[derive(Debug, Deserialize)]
struct LiveGameJson {
    in_game: bool,
}

pub fn parse_live_game_json(raw: &str) -> Result<bool, FetchError> {
    serde_json::from_str::<LiveGameJson>(raw)
        .map(|live| live.in_game)
        .map_err(|err| FetchError::Malformed(format!("live game json: {err}")))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
