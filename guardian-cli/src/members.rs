use crate::actions::ActionRecord;
use crate::http::read_json;
use colored::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub relationship: String,
    #[serde(rename = "health_history")]
    pub health_history: String,
    #[serde(rename = "device_id")]
    pub device_id: Option<String>,
    pub status: Status,
    pub heart_rate: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    pub steps: u64,
}

#[derive(Debug, Deserialize)]
pub struct MemberDetail {
    #[serde(flatten)]
    pub member: Member,
    pub alert: Option<String>,
    #[serde(default)]
    pub alert_actions: Vec<ActionRecord>,
}

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub enum Status {
    Normal,
    Alert,
}

impl Status {
    fn colored(self) -> ColoredString {
        match self {
            Self::Normal => "NORMAL".green(),
            Self::Alert => "ALERT".red().bold(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewMember {
    pub name: String,
    pub age: u32,
    pub relationship: String,
    pub health_history: String,
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Paired {
    device_id: String,
}

pub async fn run_members(client: &Client, url: &str) -> Result<(), Box<dyn Error>> {
    let resp = client.get(format!("{url}/members")).send().await?;
    let members: Vec<Member> = read_json(resp).await?;

    if members.is_empty() {
        println!("No family members yet. Add one with 'guardian-cli add'.");
        return Ok(());
    }

    println!(
        "{:<20} {:<4} {:<14} {:<8} {:<5} {:<9} {:<7} ID",
        "NAME", "AGE", "RELATIONSHIP", "STATUS", "HR", "BP", "STEPS"
    );
    for m in &members {
        println!(
            "{:<20} {:<4} {:<14} {:<8} {:<5} {:<9} {:<7} {}",
            m.name,
            m.age,
            m.relationship,
            m.status.colored(),
            m.heart_rate,
            format!("{}/{}", m.bp_systolic, m.bp_diastolic),
            m.steps,
            m.id.dimmed()
        );
    }

    let alerting = members.iter().filter(|m| m.status == Status::Alert).count();
    if alerting > 0 {
        println!();
        println!(
            "{}",
            format!("{alerting} member(s) need attention").red().bold()
        );
    }
    Ok(())
}

pub async fn run_show(client: &Client, url: &str, id: &str) -> Result<(), Box<dyn Error>> {
    let resp = client.get(format!("{url}/members/{id}")).send().await?;
    let detail: MemberDetail = read_json(resp).await?;
    let m = &detail.member;

    println!("{} ({}, {})", m.name.bold(), m.relationship, m.age);
    println!("  Status:         {}", m.status.colored());
    println!("  Heart Rate:     {} BPM", m.heart_rate);
    println!("  Blood Pressure: {}/{} mmHg", m.bp_systolic, m.bp_diastolic);
    println!("  Steps Today:    {}", m.steps);
    println!(
        "  Device:         {}",
        m.device_id.as_deref().unwrap_or("not paired")
    );
    println!("  Health History: {}", m.health_history);

    if let Some(alert) = &detail.alert {
        println!();
        println!("{} {}", "⚠ Health Alert:".red().bold(), alert);
    }

    if !detail.alert_actions.is_empty() {
        println!();
        println!("Alert responses:");
        for record in &detail.alert_actions {
            println!("  • {}", record.message);
        }
    }
    Ok(())
}

pub async fn run_add(client: &Client, url: &str, mut new: NewMember) -> Result<(), Box<dyn Error>> {
    if new.device_id.is_none() {
        println!("{}", "Searching for devices...".dimmed());
        let resp = client.post(format!("{url}/devices/pair")).send().await?;
        let paired: Paired = read_json(resp).await?;
        println!("Paired {}", paired.device_id.green());
        new.device_id = Some(paired.device_id);
    }

    let resp = client
        .post(format!("{url}/members"))
        .json(&new)
        .send()
        .await?;
    let member: Member = read_json(resp).await?;
    println!(
        "{} {} has been added to your family dashboard ({})",
        "✓".green(),
        member.name.bold(),
        member.id
    );
    Ok(())
}
