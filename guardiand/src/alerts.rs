use crate::types::{HealthStatus, Member};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

const MAX_RECORDS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    ContactEmergencyServices,
    NotifyFamily,
    ContactPhysician,
}

impl AlertAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::ContactEmergencyServices => "Emergency services contacted",
            Self::NotifyFamily => "Family members notified",
            Self::ContactPhysician => "Primary care physician contacted",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertActionRecord {
    pub id: String,
    pub member_id: Uuid,
    pub member_name: String,
    pub action: AlertAction,
    /// Member status when the caregiver acted; alerts clear on their own, so
    /// this can already be Normal.
    pub status_at_action: HealthStatus,
    pub heart_rate: u32,
    pub message: String,
    pub created_at: u64,
}

/// In-memory audit trail of caregiver responses to alerts.
pub struct AlertActionLog {
    next_id: AtomicU64,
    records: RwLock<Vec<AlertActionRecord>>,
}

impl Default for AlertActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertActionLog {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn record(&self, member: &Member, action: AlertAction) -> AlertActionRecord {
        let id = format!(
            "alert-action-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        );
        let record = AlertActionRecord {
            id,
            member_id: member.id(),
            member_name: member.profile.name.clone(),
            action,
            status_at_action: member.status,
            heart_rate: member.vitals.heart_rate,
            message: format!("{} initiated for {}", action.label(), member.profile.name),
            created_at: current_epoch_secs(),
        };

        {
            let mut records = self.records.write().await;
            if records.len() == MAX_RECORDS {
                records.remove(0);
            }
            records.push(record.clone());
        }

        log::warn!(
            target: "guardian_audit",
            "ALERT_ACTION {} member={} action={:?} status={:?} hr={}",
            record.id, record.member_id, record.action, record.status_at_action, record.heart_rate
        );

        record
    }

    /// Most recent first
    pub async fn recent(&self, limit: usize) -> Vec<AlertActionRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn for_member(&self, member_id: Uuid) -> Vec<AlertActionRecord> {
        self.records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect()
    }
}

fn current_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
