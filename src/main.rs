//! content-memory CLI entry point.
//!
//! Analytics dashboard and query/submit commands over a feedback store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

use content_memory::application::FeedbackStore;
use content_memory::domain::{FeedbackMetadata, NewFeedback, UserAction};
use content_memory::infra::app_config::{self, StoreConfig};

const DASHBOARD_RECENT_LIMIT: usize = 10;
const PREVIEW_CHARS: usize = 50;
const DASHBOARD_MIN_CONFIDENCE: f64 = 0.5;

#[derive(Parser, Debug)]
#[command(name = "content-memory")]
#[command(version)]
#[command(about = "Feedback learning store for generated content", long_about = None)]
struct Args {
    /// Database file (defaults to the configured location)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Override the retention cap on feedback records
    #[arg(long, global = true)]
    max_records: Option<usize>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the analytics dashboard (default)
    Dashboard,

    /// Generation statistics per content type
    Stats {
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Most recent feedback events
    Recent {
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },

    /// Mined edit patterns
    Patterns {
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        min_frequency: i64,
    },

    /// Quality metrics grouped by user action
    Quality {
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Learned user preferences
    Preferences {
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        min_confidence: f64,
    },

    /// Everything learned about one content type
    Insights { content_type: String },

    /// Prompt guidance block for one content type
    Enhancements { content_type: String },

    /// Database information
    Info,

    /// Record one feedback event
    Submit {
        #[arg(long)]
        content_type: String,
        /// accept, edit or reject
        #[arg(long)]
        action: String,
        /// Content text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the content text from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Read the human-edited text from a file (edit events)
        #[arg(long)]
        edited_file: Option<PathBuf>,
        /// Reason given for a rejection
        #[arg(long)]
        reason: Option<String>,
        /// Prompt that produced the content
        #[arg(long)]
        prompt: Option<String>,
        /// Seconds spent generating the content
        #[arg(long)]
        generation_time: Option<f64>,
    },

    /// Recompute generation stats from the retained event log
    RebuildStats,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(level);
    env_logger::Builder::from_env(env).init();

    let mut config = app_config::load_config();
    if let Some(max_records) = args.max_records {
        config.max_records = max_records;
    }
    let store = open_store(args.db.clone(), config)?;

    match args.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => dashboard(&store, args.json)?,
        Commands::Stats { content_type } => {
            let stats = store.try_generation_stats(content_type.as_deref())?;
            output(args.json, &stats, || {
                for stat in &stats {
                    print_stats(stat);
                }
            })?;
        }
        Commands::Recent {
            content_type,
            limit,
        } => {
            let events = store.try_recent_feedback(content_type.as_deref(), limit)?;
            output(args.json, &events, || print_recent(&events))?;
        }
        Commands::Patterns {
            content_type,
            min_frequency,
        } => {
            let content_type = content_type.as_deref();
            let patterns = store.try_edit_patterns(content_type, min_frequency)?;
            output(args.json, &patterns, || {
                for p in &patterns {
                    println!(
                        "[{}] {}: {} ({}x)",
                        p.content_type, p.edit_type, p.description, p.frequency
                    );
                    for example in &p.examples {
                        println!("    {example}");
                    }
                }
            })?;
        }
        Commands::Quality { content_type } => match content_type {
            Some(content_type) => {
                let quality = store.try_quality_analysis(&content_type)?;
                output(args.json, &quality, || print_quality(&quality))?;
            }
            None => {
                let all = store.try_quality_analysis_all()?;
                output(args.json, &all, || {
                    for (content_type, quality) in &all {
                        println!("{}:", title_case(content_type));
                        print_quality(quality);
                    }
                })?;
            }
        },
        Commands::Preferences {
            content_type,
            min_confidence,
        } => {
            let content_type = content_type.as_deref();
            let rows = store.try_preference_rows(content_type, min_confidence)?;
            output(args.json, &rows, || {
                for row in &rows {
                    println!(
                        "[{}] {}: {} (confidence: {:.0}%)",
                        row.content_type,
                        row.preference_type,
                        row.preference_value,
                        row.confidence_score * 100.0
                    );
                }
            })?;
        }
        Commands::Insights { content_type } => {
            let insights = store.try_learning_insights(&content_type)?;
            output(args.json, &insights, || {
                println!("{}:", title_case(&insights.content_type));
                if let Some(stats) = &insights.stats {
                    print_stats(stats);
                }
                print_quality(&insights.quality);
                for rec in &insights.recommendations {
                    println!("  • {rec}");
                }
            })?;
        }
        Commands::Enhancements { content_type } => {
            let text = store.try_prompt_enhancements(&content_type)?;
            output(args.json, &text, || {
                if text.is_empty() {
                    println!("No prompt enhancements yet (need more feedback).");
                } else {
                    println!("{text}");
                }
            })?;
        }
        Commands::Info => {
            let info = store.try_database_info()?;
            output(args.json, &info, || {
                println!("Database location: {}", info.database_path);
                println!("Total feedback records: {}", info.total_feedback_records);
                println!("Content types tracked: {}", info.content_types_tracked);
                println!("Edit patterns tracked: {}", info.edit_patterns_tracked);
                println!("Quality samples: {}", info.quality_samples);
                println!(
                    "Earliest record: {}",
                    info.earliest_record.as_deref().unwrap_or("-")
                );
                println!(
                    "Latest record: {}",
                    info.latest_record.as_deref().unwrap_or("-")
                );
                println!("Max records: {}", info.max_records_limit);
            })?;
        }
        Commands::Submit {
            content_type,
            action,
            text,
            file,
            edited_file,
            reason,
            prompt,
            generation_time,
        } => {
            let action = UserAction::from_str(&action).map_err(anyhow::Error::msg)?;
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read content from {}", path.display()))?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };

            let mut metadata = FeedbackMetadata::default();
            if let Some(path) = edited_file {
                metadata.edited_content = Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("read edited content from {}", path.display()))?,
                );
            }
            metadata.revision_reason = reason;

            let mut feedback = NewFeedback::new(content_type, text, action);
            feedback.metadata = metadata;
            feedback.original_prompt = prompt;
            feedback.generation_time = generation_time;

            match store.try_submit(feedback)? {
                Some(id) => output(args.json, &id, || println!("Recorded feedback #{id}"))?,
                None => println!("Feedback store is disabled; nothing recorded."),
            }
        }
        Commands::RebuildStats => {
            let rebuilt = store.rebuild_generation_stats()?;
            output(args.json, &rebuilt, || {
                println!("Rebuilt generation stats for {rebuilt} content types")
            })?;
        }
    }

    Ok(())
}

fn open_store(db: Option<PathBuf>, config: StoreConfig) -> Result<FeedbackStore> {
    match db {
        Some(path) => FeedbackStore::open_at(&path, config)
            .with_context(|| format!("open feedback store at {}", path.display())),
        None => FeedbackStore::open(config).context("open feedback store"),
    }
}

fn output<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text();
    }
    Ok(())
}

#[derive(Serialize)]
struct DashboardSection {
    insights: content_memory::domain::LearningInsights,
    prompt_enhancements: String,
}

fn dashboard(store: &FeedbackStore, json: bool) -> Result<()> {
    let info = store.try_database_info()?;
    let stats = store.try_generation_stats(None)?;
    let recent = store.try_recent_feedback(None, DASHBOARD_RECENT_LIMIT)?;

    let mut sections = Vec::new();
    for stat in &stats {
        sections.push(DashboardSection {
            insights: store.try_learning_insights(&stat.content_type)?,
            prompt_enhancements: store.try_prompt_enhancements(&stat.content_type)?,
        });
    }

    if json {
        let value = serde_json::json!({
            "database": info,
            "stats": stats,
            "content_types": sections,
            "recent": recent,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "=".repeat(80));
    println!("Content Memory Analytics Dashboard");
    println!("{}", "=".repeat(80));

    println!("\n[DATABASE] Overview:");
    println!("   Total feedback records: {}", info.total_feedback_records);
    println!("   Content types tracked: {}", info.content_types_tracked);
    println!("   Edit patterns tracked: {}", info.edit_patterns_tracked);
    println!("   Database location: {}", info.database_path);

    if info.total_feedback_records == 0 {
        println!(
            "\n[INFO] No feedback data yet. Submit feedback on generated content to see analytics."
        );
        return Ok(());
    }

    println!("\n[STATS] Generation Statistics:");
    for stat in &stats {
        print_stats(stat);
    }

    for section in &sections {
        let insights = &section.insights;
        println!("\n[ANALYSIS] {}:", title_case(&insights.content_type));

        if !insights.quality.is_empty() {
            println!("   Quality Metrics:");
            print_quality(&insights.quality);
        }

        if !insights.patterns.is_empty() {
            println!("   Edit Patterns:");
            for p in insights.patterns.iter().take(3) {
                println!(
                    "     • {}: {} ({}x)",
                    p.edit_type, p.description, p.frequency
                );
            }
        }

        let strong: Vec<_> = insights
            .preferences
            .iter()
            .filter(|(_, pref)| pref.confidence >= DASHBOARD_MIN_CONFIDENCE)
            .collect();
        if !strong.is_empty() {
            println!("   Learned Preferences:");
            for (kind, pref) in strong {
                println!(
                    "     • {}: {} (confidence: {:.0}%)",
                    kind,
                    pref.value,
                    pref.confidence * 100.0
                );
            }
        }

        if !insights.recommendations.is_empty() {
            println!("   [RECOMMENDATIONS]:");
            for rec in insights.recommendations.iter().take(3) {
                println!("     • {rec}");
            }
        }

        if !section.prompt_enhancements.is_empty() {
            println!("   [ENHANCEMENTS] Prompt Enhancements Active:");
            for line in section
                .prompt_enhancements
                .lines()
                .skip(1)
                .filter_map(|l| l.trim().strip_prefix("- "))
                .take(3)
            {
                println!("     • {line}");
            }
        }
    }

    println!("\n[RECENT FEEDBACK] Last {DASHBOARD_RECENT_LIMIT} items:");
    print_recent(&recent);
    println!("{}", "=".repeat(80));
    Ok(())
}

fn print_stats(stat: &content_memory::domain::GenerationStats) {
    println!("   {}:", title_case(&stat.content_type));
    println!("     • Generated: {}", stat.total_generated);
    println!(
        "     • Acceptance rate: {:.1}%",
        stat.acceptance_rate * 100.0
    );
    println!("     • Edited: {}", stat.total_edited);
    println!("     • Rejected: {}", stat.total_rejected);
    println!(
        "     • Avg generation time: {:.1}s",
        stat.avg_generation_time
    );
}

fn print_quality(quality: &content_memory::domain::QualityByAction) {
    for (action, metrics) in quality {
        println!("     {} content:", title_case(action.as_str()));
        println!("       • Readability: {:.1}", metrics.avg_readability);
        println!("       • Complexity: {:.1}", metrics.avg_complexity);
        println!("       • Length: {:.0} words", metrics.avg_length);
        println!("       • Samples: {}", metrics.sample_count);
    }
}

fn print_recent(events: &[content_memory::domain::FeedbackEvent]) {
    if events.is_empty() {
        println!("   No feedback recorded yet.");
        return;
    }
    for event in events {
        let when = chrono::DateTime::parse_from_rfc3339(&event.timestamp)
            .map(|t| t.format("%m/%d %H:%M").to_string())
            .unwrap_or_else(|_| event.timestamp.clone());
        println!("   [{when}] {} - {}", event.content_type, event.user_action);
        println!("     \"{}\"", preview(&event.content_text, PREVIEW_CHARS));
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_content_types() {
        assert_eq!(title_case("twitter_thread"), "Twitter Thread");
        assert_eq!(title_case("accept"), "Accept");
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(preview("short", 50), "short");
        let long = "x".repeat(60);
        assert_eq!(preview(&long, 50), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn cli_parses_submit() {
        let args = Args::try_parse_from([
            "content-memory",
            "--db",
            "/tmp/memory.sqlite",
            "submit",
            "--content-type",
            "summary",
            "--action",
            "reject",
            "--text",
            "body",
            "--reason",
            "too long",
        ])
        .unwrap();
        assert_eq!(args.db, Some(PathBuf::from("/tmp/memory.sqlite")));
        match args.command {
            Some(Commands::Submit { action, reason, .. }) => {
                assert_eq!(action, "reject");
                assert_eq!(reason.as_deref(), Some("too long"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_defaults_to_dashboard() {
        let args = Args::try_parse_from(["content-memory", "--json"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.json);
    }
}
