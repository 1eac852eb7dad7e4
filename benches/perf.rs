use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use jungle_pulse::fallback::{fallback_profile, synthesize_summary};
use jungle_pulse::riot_fetch::{parse_match_detail_json, parse_profile_json};
use jungle_pulse::sources::AccountHandle;
use jungle_pulse::state::{Delta, IdentityHandle, MatchSummary, ProfileSlot, Snapshot, apply_delta};
use jungle_pulse::stats::compute;

fn sample_history(len: usize) -> Vec<MatchSummary> {
    let champions = ["Graves", "Kindred", "Kha'Zix", "Nidalee", "Hecarim", "Viego"]
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    (0..len)
        .map(|i| synthesize_summary(&format!("LA2_{i}"), i, &champions))
        .collect()
}

fn bench_stats_compute(c: &mut Criterion) {
    let history = sample_history(20);
    c.bench_function("stats_compute_20", |b| {
        b.iter(|| {
            let stats = compute(black_box(&history));
            black_box(stats.average_kda);
        })
    });
}

fn bench_profile_slot_apply(c: &mut Criterion) {
    let history = sample_history(20);
    let base = Snapshot::new();
    let profile = fallback_profile(&IdentityHandle::new("Not Alet", "JCP"), "las");
    c.bench_function("profile_slot_apply", |b| {
        b.iter(|| {
            let mut snap = base.clone();
            let mut slot = ProfileSlot::failed("");
            slot.profile = Some(profile.clone());
            slot.matches = history.clone();
            apply_delta(&mut snap, Delta::SetProfileSlot(black_box(slot)));
            black_box(snap.stats.games);
        })
    });
}

fn bench_match_detail_parse(c: &mut Criterion) {
    let account = AccountHandle("puuid-not-alet-jcp".to_string());
    c.bench_function("match_detail_parse", |b| {
        b.iter(|| {
            let summary =
                parse_match_detail_json(black_box(MATCH_DETAIL_JSON), "LA2_1500000003", &account)
                    .unwrap();
            black_box(summary.duration_minutes);
        })
    });
}

fn bench_profile_parse(c: &mut Criterion) {
    c.bench_function("profile_parse", |b| {
        b.iter(|| {
            let profile = parse_profile_json(black_box(USER_JSON)).unwrap();
            black_box(profile.preferred_champions.len());
        })
    });
}

criterion_group!(
    perf,
    bench_stats_compute,
    bench_profile_slot_apply,
    bench_match_detail_parse,
    bench_profile_parse
);
criterion_main!(perf);

static MATCH_DETAIL_JSON: &str = include_str!("../tests/fixtures/match_detail.json");
static USER_JSON: &str = include_str!("../tests/fixtures/user.json");
