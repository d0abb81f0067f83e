use colored::*;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

#[derive(Deserialize, Debug)]
struct HealthResponse {
    #[allow(dead_code)]
    status: String,
}

#[derive(Deserialize, Debug)]
struct StatusResponse {
    version: String,
    uptime_s: u64,
    member_count: usize,
    insights_configured: bool,
    insights_endpoint: String,
    simulator_interval_secs: u64,
    simulator_ticks: u64,
    alerts_raised: u64,
    insight_requests: u64,
    insight_failures: u64,
    insight_rate_limited: u64,
    insight_quota_exhausted: u64,
    alert_actions: u64,
}

pub async fn run_doctor(url: &str) -> Result<(), Box<dyn Error>> {
    println!("{}", "🩺 Guardian Doctor".bold().cyan());
    println!("{}", "Checking daemon health...".dimmed());
    println!();

    let client = Client::new();
    let mut all_good = true;

    // 1. Connectivity
    print!("• Daemon Connectivity: ");
    match client.get(format!("{url}/healthz")).send().await {
        Ok(resp) => {
            if resp.status().is_success() {
                if resp.json::<HealthResponse>().await.is_ok() {
                    println!("{}", "OK".green());
                } else {
                    println!("{}", "OK (Invalid JSON)".yellow());
                }
            } else {
                println!("{}", format!("FAIL (Status {})", resp.status()).red());
                all_good = false;
            }
        }
        Err(e) => {
            println!("{}", format!("FAIL ({e})").red());
            println!("  → Is guardiand running? Try 'systemctl status guardiand'");
            return Ok(());
        }
    }

    // 2. Status for deeper checks
    print!("• Daemon Status:       ");
    let status: StatusResponse = match client.get(format!("{url}/status")).send().await {
        Ok(resp) => resp.json().await?,
        Err(e) => {
            println!("{}", format!("FAIL ({e})").red());
            return Ok(());
        }
    };
    println!("{}", format!("OK (v{})", status.version).green());

    print!("• Uptime:              ");
    if status.uptime_s < 60 {
        println!("{}", format!("{}s (Just started)", status.uptime_s).yellow());
    } else {
        println!("{}", format!("{}s", status.uptime_s).green());
    }

    print!("• Family Members:      ");
    if status.member_count == 0 {
        println!("{}", "0 (Simulator idle)".yellow());
    } else {
        println!("{}", status.member_count.to_string().green());
    }

    print!("• Vitals Simulator:    ");
    if status.simulator_ticks > 0 {
        println!(
            "{}",
            format!(
                "Active ({} ticks every {}s, {} alerts raised)",
                status.simulator_ticks, status.simulator_interval_secs, status.alerts_raised
            )
            .green()
        );
    } else {
        println!("{}", "Waiting for first tick".dimmed());
    }

    print!("• AI Insights:         ");
    if status.insights_configured {
        println!(
            "{}",
            format!("Configured ({})", status.insights_endpoint).green()
        );
    } else {
        println!("{}", "NOT CONFIGURED".red());
        println!("  → Set LLM_API_KEY or insights.api_key in guardian.toml.");
        all_good = false;
    }

    print!("• Insight Failures:    ");
    if status.insight_quota_exhausted > 0 {
        println!(
            "{}",
            format!("{} (Credits depleted)", status.insight_failures).red()
        );
        all_good = false;
    } else if status.insight_rate_limited > 0 {
        println!(
            "{}",
            format!(
                "{} of {} (Rate limited {}x)",
                status.insight_failures, status.insight_requests, status.insight_rate_limited
            )
            .yellow()
        );
    } else {
        println!(
            "{}",
            format!("{} of {}", status.insight_failures, status.insight_requests).green()
        );
    }

    print!("• Alert Responses:     ");
    println!("{}", status.alert_actions.to_string().green());

    println!();
    if all_good {
        println!("{}", "✅ Guardian is healthy.".bold().green());
    } else {
        println!("{}", "⚠️  Guardian has issues. See above.".bold().yellow());
    }

    Ok(())
}
