use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted part of a member; everything else is attached at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub relationship: String,
    pub health_history: String,
    pub device_id: Option<String>,
    pub user_id: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub heart_rate: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    pub steps: u64,
}

impl Vitals {
    /// Vitals of a member who was just added and paired.
    pub const fn baseline() -> Self {
        Self {
            heart_rate: 75,
            bp_systolic: 120,
            bp_diastolic: 80,
            steps: 0,
        }
    }

    /// Vitals for a member restored from the store: a resting reading with a
    /// little spread and part of a day's steps already walked.
    pub fn sampled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            heart_rate: 75 + rng.gen_range(0..10),
            bp_systolic: 120 + rng.gen_range(0..10),
            bp_diastolic: 80 + rng.gen_range(0..5),
            steps: rng.gen_range(0..2_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    #[default]
    Normal,
    Alert,
}

impl HealthStatus {
    pub fn is_alert(self) -> bool {
        matches!(self, Self::Alert)
    }
}

/// A roster entry: profile, live vitals and the status derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(flatten)]
    pub profile: MemberProfile,
    pub status: HealthStatus,
    #[serde(flatten)]
    pub vitals: Vitals,
}

impl Member {
    pub fn new(profile: MemberProfile, vitals: Vitals) -> Self {
        Self {
            profile,
            status: HealthStatus::Normal,
            vitals,
        }
    }

    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    pub fn alert_summary(&self) -> Option<String> {
        self.status.is_alert().then(|| {
            format!(
                "{}'s heart rate is elevated ({} BPM). Immediate attention may be needed.",
                self.profile.name, self.vitals.heart_rate
            )
        })
    }
}

/// Profile submission. Accepts both the snake_case column names and the
/// camelCase names the dashboard form posts.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub age: u32,
    pub relationship: String,
    #[serde(alias = "healthHistory")]
    pub health_history: String,
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
}

impl NewMember {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !(1..=120).contains(&self.age) {
            return Err(format!("Age must be between 1 and 120, got {}", self.age));
        }
        if self.relationship.trim().is_empty() {
            return Err("Relationship is required".to_string());
        }
        if self.health_history.trim().is_empty() {
            return Err("Health history is required".to_string());
        }
        match self.device_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(()),
            _ => Err("Please pair a device first".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn submission() -> NewMember {
        NewMember {
            name: "Mary Johnson".to_string(),
            age: 78,
            relationship: "Mother".to_string(),
            health_history: "Hypertension, takes lisinopril".to_string(),
            device_id: Some("FitBand-abc123xyz".to_string()),
            user_id: None,
        }
    }

    #[test]
    fn member_serializes_with_dashboard_field_names() {
        let profile = MemberProfile {
            id: Uuid::nil(),
            name: "Mary Johnson".to_string(),
            age: 78,
            relationship: "Mother".to_string(),
            health_history: "none".to_string(),
            device_id: None,
            user_id: "u1".to_string(),
            created_at: 1,
        };
        let value = serde_json::to_value(Member::new(profile, Vitals::baseline())).unwrap();
        assert_eq!(value["heartRate"], 75);
        assert_eq!(value["bpSystolic"], 120);
        assert_eq!(value["bpDiastolic"], 80);
        assert_eq!(value["steps"], 0);
        assert_eq!(value["health_history"], "none");
        assert_eq!(value["status"], "Normal");
    }

    #[test]
    fn sampled_vitals_stay_in_resting_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let v = Vitals::sampled(&mut rng);
            assert!((75..85).contains(&v.heart_rate));
            assert!((120..130).contains(&v.bp_systolic));
            assert!((80..85).contains(&v.bp_diastolic));
            assert!(v.steps < 2_000);
        }
    }

    #[test]
    fn validation_requires_paired_device() {
        let mut new = submission();
        new.device_id = None;
        assert_eq!(new.validate().unwrap_err(), "Please pair a device first");
        new.device_id = Some("   ".to_string());
        assert!(new.validate().is_err());
    }

    #[test]
    fn validation_checks_required_fields() {
        assert!(submission().validate().is_ok());

        let mut blank_name = submission();
        blank_name.name = " ".to_string();
        assert!(blank_name.validate().is_err());

        let mut too_old = submission();
        too_old.age = 121;
        assert!(too_old.validate().is_err());

        let mut no_history = submission();
        no_history.health_history.clear();
        assert!(no_history.validate().is_err());
    }

    #[test]
    fn accepts_camel_case_form_fields() {
        let new: NewMember = serde_json::from_str(
            r#"{"name":"Tom","age":80,"relationship":"Father","healthHistory":"Diabetes","deviceId":"FitBand-1"}"#,
        )
        .unwrap();
        assert_eq!(new.health_history, "Diabetes");
        assert_eq!(new.device_id.as_deref(), Some("FitBand-1"));
    }

    #[test]
    fn alert_summary_only_when_alerting() {
        let profile = MemberProfile {
            id: Uuid::nil(),
            name: "Mary Johnson".to_string(),
            age: 78,
            relationship: "Mother".to_string(),
            health_history: String::new(),
            device_id: None,
            user_id: "u1".to_string(),
            created_at: 0,
        };
        let mut member = Member::new(profile, Vitals::baseline());
        assert!(member.alert_summary().is_none());
        member.status = HealthStatus::Alert;
        member.vitals.heart_rate = 98;
        assert_eq!(
            member.alert_summary().unwrap(),
            "Mary Johnson's heart rate is elevated (98 BPM). Immediate attention may be needed."
        );
    }
}
