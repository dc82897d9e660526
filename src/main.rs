use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use grade_ranking::models::{EntityKind, ReportScope, ScoreRecord};
use grade_ranking::source::{CsvScoreSource, ScoreSource};
use grade_ranking::{aggregate, db, report};

#[derive(Parser)]
#[command(name = "grade-ranking")]
#[command(about = "Grade statistics and rankings for classes, students and subjects", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a ranking to stdout
    Rank {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct ScopeArgs {
    /// Entities to rank
    #[arg(long, value_enum)]
    kind: EntityKind,
    /// Read grades from a CSV file instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long)]
    class: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    period: Option<String>,
    /// Only evaluations on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,
    #[arg(long, default_value_t = 50_000)]
    max_records: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl ScopeArgs {
    fn scope(&self) -> ReportScope {
        ReportScope {
            kind: self.kind,
            class: self.class.clone(),
            subject: self.subject.clone(),
            period: self.period.clone(),
            since: self.since,
            max_records: self.max_records,
        }
    }

    async fn source(&self) -> anyhow::Result<Box<dyn ScoreSource>> {
        if let Some(path) = &self.csv {
            return Ok(Box::new(CsvScoreSource::new(path)));
        }
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set when --csv is not given")?;
        Ok(Box::new(db::PgScoreSource::connect(&database_url).await?))
    }

    async fn load_records(&self) -> anyhow::Result<(ReportScope, Vec<ScoreRecord<String>>)> {
        let scope = self.scope();
        let source = self.source().await?;
        let rows = source.fetch(&scope).await?;
        let records = rows.iter().map(|row| row.to_record(scope.kind)).collect();
        Ok((scope, records))
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Rank {
            scope,
            limit,
            format,
        } => {
            let (scope, records) = scope.load_records().await?;
            let aggregation = aggregate::aggregate_records(&records);
            let ranked = aggregate::rank(aggregation.results);
            info!(
                entities = ranked.len(),
                rejected = aggregation.rejected.len(),
                scope = %scope.describe(),
                "ranking computed"
            );

            match format {
                OutputFormat::Json => println!("{}", report::ranking_json(&ranked)?),
                OutputFormat::Text => {
                    if ranked.is_empty() {
                        println!("No scores found for this scope.");
                        return Ok(());
                    }

                    println!("Top {} by mean score (out of 20):", scope.kind.label());
                    for entry in ranked.iter().take(limit) {
                        println!("{}", report::ranking_line(entry));
                    }
                }
            }
        }
        Commands::Report { scope, out } => {
            let (scope, records) = scope.load_records().await?;
            let aggregation = aggregate::aggregate_records(&records);
            let markdown = report::build_report(&scope, Utc::now().date_naive(), &aggregation);
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
