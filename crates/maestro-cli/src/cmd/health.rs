use anyhow::Context;
use maestro_core::{
    config::Config,
    health::HealthMonitor,
    metrics::{badge_for, MetricsStore},
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct HealthRow {
    agent_id: String,
    total_runs: u64,
    success_rate: f64,
    avg_duration_seconds: u64,
    health: String,
    badge: String,
}

pub fn run(root: &Path, cleanup_days: Option<i64>, json: bool) -> anyhow::Result<()> {
    let mut store = MetricsStore::load().context("failed to load agent metrics")?;

    if let Some(days) = cleanup_days {
        let removed = store.cleanup(days);
        if removed > 0 {
            store.save().context("failed to save cleaned metrics")?;
            eprintln!("removed {removed} stale metric entr{}", if removed == 1 { "y" } else { "ies" });
        }
    }

    let thresholds = Config::load(root)
        .context("failed to load configuration")?
        .health;
    let criteria = store.badge_criteria();
    let statuses = HealthMonitor::new().sweep(&store, &thresholds);

    let rows: Vec<HealthRow> = store
        .iter()
        .map(|(id, m)| HealthRow {
            agent_id: id.to_string(),
            total_runs: m.total_runs,
            success_rate: m.success_rate,
            avg_duration_seconds: m.avg_duration_seconds(),
            health: statuses
                .get(id)
                .map_or("-".to_string(), |s| s.health.as_str().to_string()),
            badge: badge_for(m, &criteria).as_str().to_string(),
        })
        .collect();

    if json {
        return crate::output::print_json(&rows);
    }

    if rows.is_empty() {
        println!("No agent metrics recorded yet.");
        return Ok(());
    }

    let table = rows
        .iter()
        .map(|r| {
            vec![
                r.agent_id.clone(),
                r.total_runs.to_string(),
                format!("{:.2}", r.success_rate),
                format!("{}s", r.avg_duration_seconds),
                r.health.clone(),
                r.badge.clone(),
            ]
        })
        .collect();
    crate::output::print_table(
        &["agent", "runs", "success", "avg duration", "health", "badge"],
        table,
    );
    Ok(())
}
