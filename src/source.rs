use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{GradeRow, ReportScope};

/// Where grade rows come from.
#[async_trait]
pub trait ScoreSource: Send + Sync {
    async fn fetch(&self, scope: &ReportScope) -> anyhow::Result<Vec<GradeRow>>;
}

pub struct CsvScoreSource {
    path: PathBuf,
}

impl CsvScoreSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read_rows<R: std::io::Read>(
        reader: R,
        scope: &ReportScope,
    ) -> anyhow::Result<Vec<GradeRow>> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut rows = Vec::new();

        for (line, result) in reader.deserialize::<GradeRow>().enumerate() {
            let row = result.with_context(|| format!("malformed grade row {}", line + 1))?;
            if !scope.matches(&row) {
                continue;
            }
            if rows.len() >= scope.max_records {
                warn!(max_records = scope.max_records, "grade rows truncated");
                break;
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

#[async_trait]
impl ScoreSource for CsvScoreSource {
    async fn fetch(&self, scope: &ReportScope) -> anyhow::Result<Vec<GradeRow>> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let rows = Self::read_rows(file, scope)?;
        info!(path = %self.path.display(), rows = rows.len(), "loaded grades from csv");
        Ok(rows)
    }
}
