use crate::http::read_json;
use colored::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ActionArg {
    ContactEmergencyServices,
    NotifyFamily,
    ContactPhysician,
}

#[derive(Debug, Deserialize)]
pub struct ActionRecord {
    pub id: String,
    pub member_name: String,
    pub action: String,
    pub status_at_action: String,
    pub heart_rate: u32,
    pub message: String,
}

pub async fn run_act(
    client: &Client,
    url: &str,
    id: &str,
    action: ActionArg,
) -> Result<(), Box<dyn Error>> {
    let resp = client
        .post(format!("{url}/members/{id}/alert-actions"))
        .json(&serde_json::json!({ "action": action }))
        .send()
        .await?;
    let record: ActionRecord = read_json(resp).await?;
    println!("{} {}", "✓".green(), record.message);
    Ok(())
}

pub async fn run_actions(client: &Client, url: &str, limit: usize) -> Result<(), Box<dyn Error>> {
    let resp = client
        .get(format!("{url}/alert-actions"))
        .query(&[("limit", limit)])
        .send()
        .await?;
    let records: Vec<ActionRecord> = read_json(resp).await?;

    if records.is_empty() {
        println!("No alert responses recorded.");
        return Ok(());
    }

    println!(
        "{:<18} {:<20} {:<28} {:<8} {:<4}",
        "ID", "MEMBER", "ACTION", "STATUS", "HR"
    );
    for r in records {
        let status = if r.status_at_action == "Alert" {
            r.status_at_action.red()
        } else {
            r.status_at_action.normal()
        };
        println!(
            "{:<18} {:<20} {:<28} {:<8} {:<4}",
            r.id, r.member_name, r.action, status, r.heart_rate
        );
    }
    Ok(())
}
