use crate::http::read_json;
use colored::*;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

#[derive(Debug, Deserialize)]
struct Insight {
    summary: String,
    recommendation: String,
}

pub async fn run_insights(client: &Client, url: &str, id: &str) -> Result<(), Box<dyn Error>> {
    println!("{}", "Generating insights...".dimmed());
    let resp = client
        .post(format!("{url}/members/{id}/insights"))
        .send()
        .await?;
    let insight: Insight = read_json(resp).await?;

    println!("{}", "Summary".bold().cyan());
    println!("{}", insight.summary);
    println!();
    println!("{}", "Recommendations".bold().cyan());
    println!("{}", insight.recommendation);
    Ok(())
}
