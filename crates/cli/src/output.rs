//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use predictor_lib::{ConfidenceLevel, Tier};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// One row of a two-column property table
#[derive(Tabled)]
pub struct PropertyRow {
    #[tabled(rename = "Property")]
    pub name: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl PropertyRow {
    pub fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a rounded table
pub fn print_rows<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a score or metric with two decimals
pub fn format_score(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format an optional metric, blank when absent
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_score).unwrap_or_else(|| "-".to_string())
}

/// Color the performance tier
pub fn color_tier(tier: Tier) -> String {
    match tier {
        Tier::High => tier.as_str().green().to_string(),
        Tier::Medium => tier.as_str().yellow().to_string(),
        Tier::Low => tier.as_str().red().to_string(),
    }
}

/// Color the confidence level
pub fn color_confidence(level: ConfidenceLevel) -> String {
    match level {
        ConfidenceLevel::High => level.as_str().green().to_string(),
        ConfidenceLevel::Medium => level.as_str().yellow().to_string(),
        ConfidenceLevel::Low => level.as_str().red().to_string(),
    }
}

/// Color a yes/no flag
pub fn color_flag(flag: bool) -> String {
    if flag {
        "yes".green().to_string()
    } else {
        "no".red().to_string()
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}
