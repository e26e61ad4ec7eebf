//! Pytha Lives Server
//!
//! Demo driver for the lives economy engine. Walks a deterministic scenario
//! against the in-memory record store so the whole fetch → recalculate →
//! consume → patch cycle can be observed in the logs.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pytha_lives::{
    ConsumeOutcome, LivesService, MemoryGateway, ServiceConfig, UserId, VERSION,
    DEFAULT_MAX_NATURAL_LIVES, DEFAULT_REGEN_INTERVAL_MINUTES,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Pytha Lives Server v{}", VERSION);
    info!("Natural-life cap: {}", DEFAULT_MAX_NATURAL_LIVES);
    info!("Regen interval: {} minutes", DEFAULT_REGEN_INTERVAL_MINUTES);

    demo_scenario().await
}

/// Demo function to exercise the economy engine end to end.
async fn demo_scenario() -> anyhow::Result<()> {
    info!("=== Starting Demo Scenario ===");

    let gateway = Arc::new(MemoryGateway::new());
    let service = LivesService::new(gateway, ServiceConfig::default());
    let player = UserId::random();

    // All instants are injected: the demo controls its own clock.
    let mut now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

    let view = service.init_account(&player, now).await?;
    info!("new player {}: {}", player.to_uuid_string(), serde_json::to_string(&view)?);

    // Burn through the natural pool.
    for round in 1..=4 {
        let (view, outcome) = service.consume_play(&player, now).await?;
        report_play(round, &outcome, view.natural_lives, view.bought_lives);
    }

    // Buy a pack of 10 and play one more round.
    let view = service.grant_lives(&player, 10, now).await?;
    info!("purchased pack applied: {} bought lives", view.bought_lives);
    let (view, outcome) = service.consume_play(&player, now).await?;
    report_play(5, &outcome, view.natural_lives, view.bought_lives);

    // 75 minutes later: two regeneration intervals have completed.
    now += Duration::minutes(75);
    let view = service.read_account(&player, now).await?;
    info!(
        "after 75 minutes: {} natural, next life in {}s",
        view.natural_lives, view.next_life_in_seconds
    );

    // Next morning: the daily bonus comes back.
    now = next_morning(now);
    let view = service.read_account(&player, now).await?;
    info!(
        "next morning: {} natural, {} bought",
        view.natural_lives, view.bought_lives
    );

    // Subscription flips on: unlimited plays, no debits.
    service.set_subscription(&player, true, now).await?;
    let (view, outcome) = service.consume_play(&player, now).await?;
    info!(
        "subscribed play: {:?}, pools untouched at {} natural / {} bought",
        outcome, view.natural_lives, view.bought_lives
    );

    // And off again: debits resume.
    service.set_subscription(&player, false, now).await?;
    let (view, outcome) = service.consume_play(&player, now).await?;
    info!(
        "after unsubscribe: {:?}, {} natural left",
        outcome, view.natural_lives
    );

    info!("=== Demo Complete ===");
    Ok(())
}

fn report_play(round: u32, outcome: &ConsumeOutcome, natural: u32, bought: u32) {
    match outcome {
        ConsumeOutcome::Consumed { pool } => {
            info!(
                "round {}: consumed from {:?} pool ({} natural / {} bought left)",
                round, pool, natural, bought
            );
        }
        ConsumeOutcome::Unlimited => info!("round {}: unlimited (subscription)", round),
        ConsumeOutcome::Exhausted => info!("round {}: no lives remaining", round),
    }
}

/// 9am UTC on the day after `now`.
fn next_morning(now: DateTime<Utc>) -> DateTime<Utc> {
    (now + Duration::days(1))
        .date_naive()
        .and_hms_opt(9, 0, 0)
        .expect("valid time")
        .and_utc()
}
