use crate::config::SimulatorConfig;
use crate::metrics::Metrics;
use crate::roster::Roster;
use crate::types::{HealthStatus, Member};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Result of one pass over the roster.
#[derive(Debug, Default, PartialEq)]
pub struct TickReport {
    pub members: usize,
    /// (name, heart rate) for every member that came out of the tick alerting.
    pub alerts: Vec<(String, u32)>,
}

#[derive(Debug, Clone)]
pub struct VitalsSimulator {
    cfg: SimulatorConfig,
}

impl VitalsSimulator {
    pub fn new(cfg: SimulatorConfig) -> Self {
        Self { cfg }
    }

    /// Advance one member by one tick. Returns true when the member is
    /// alerting afterwards. Status is recomputed every tick; an alert from the
    /// previous tick does not carry over.
    pub fn step<R: Rng + ?Sized>(&self, member: &mut Member, rng: &mut R) -> bool {
        let cfg = &self.cfg;
        let jitter = rng.gen_range(-cfg.heart_rate_jitter..=cfg.heart_rate_jitter);
        let rolled = (f64::from(member.vitals.heart_rate) + jitter)
            .clamp(f64::from(cfg.heart_rate_min), f64::from(cfg.heart_rate_max))
            .round() as u32;
        let walked = rng.gen_range(0..cfg.max_step_increment);
        let draw = rng.gen_bool(cfg.alert_probability);

        member.vitals.heart_rate = rolled;
        member.vitals.steps = member.vitals.steps.saturating_add(u64::from(walked));
        member.status = if draw && rolled > cfg.alert_threshold_bpm {
            HealthStatus::Alert
        } else {
            HealthStatus::Normal
        };
        member.status.is_alert()
    }

    pub fn tick<R: Rng + ?Sized>(&self, members: &mut [Member], rng: &mut R) -> TickReport {
        let mut report = TickReport {
            members: members.len(),
            alerts: Vec::new(),
        };
        for member in members.iter_mut() {
            if self.step(member, rng) {
                report
                    .alerts
                    .push((member.profile.name.clone(), member.vitals.heart_rate));
            }
        }
        report
    }

    pub fn spawn(self, roster: Arc<Roster>, metrics: Arc<Metrics>) -> JoinHandle<()> {
        self.spawn_with_rng(roster, metrics, StdRng::from_entropy())
    }

    pub fn spawn_with_rng(
        self,
        roster: Arc<Roster>,
        metrics: Arc<Metrics>,
        rng: StdRng,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(roster, metrics, rng).await })
    }

    async fn run(self, roster: Arc<Roster>, metrics: Arc<Metrics>, mut rng: StdRng) {
        let mut size = roster.subscribe_size();
        let period = self.cfg.interval();

        loop {
            // No timer while the roster is empty.
            if size.wait_for(|n| *n > 0).await.is_err() {
                return;
            }
            info!(
                "[simulator] starting {}s timer for {} members",
                period.as_secs(),
                *size.borrow()
            );

            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = roster.tick_with(|members| self.tick(members, &mut rng)).await;
                        if report.members == 0 {
                            continue;
                        }
                        metrics.inc_simulator_ticks();
                        metrics.add_alerts_raised(report.alerts.len() as u64);
                        debug!("[simulator] ticked {} members", report.members);
                        for (name, heart_rate) in &report.alerts {
                            warn!("[simulator] alert: {name} heart rate {heart_rate} bpm");
                        }
                    }
                    changed = size.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if *size.borrow_and_update() == 0 {
                            info!("[simulator] roster empty, stopping timer");
                            break;
                        }
                    }
                }
            }
        }
    }
}
