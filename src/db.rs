use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::info;

use crate::models::{GradeRow, ReportScope};
use crate::source::ScoreSource;

const GRADES_QUERY: &str = r#"
    SELECT st.registration_number AS student,
           c.code AS class,
           sub.code AS subject,
           e.period,
           e.evaluated_on,
           g.score::float8 AS score,
           e.max_score::float8 AS max_score
    FROM grades g
    JOIN evaluations e ON e.id = g.evaluation_id
    JOIN students st ON st.id = g.student_id
    JOIN classes c ON c.id = st.class_id
    JOIN subjects sub ON sub.id = e.subject_id
    WHERE g.score IS NOT NULL
      AND ($1::text IS NULL OR c.code = $1)
      AND ($2::text IS NULL OR sub.code = $2)
      AND ($3::text IS NULL OR e.period = $3)
      AND ($4::date IS NULL OR e.evaluated_on >= $4)
    ORDER BY g.id
    LIMIT $5
"#;

pub struct PgScoreSource {
    pool: PgPool,
}

impl PgScoreSource {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl ScoreSource for PgScoreSource {
    async fn fetch(&self, scope: &ReportScope) -> anyhow::Result<Vec<GradeRow>> {
        let limit = i64::try_from(scope.max_records).unwrap_or(i64::MAX);
        let records = sqlx::query(GRADES_QUERY)
            .bind(scope.class.as_deref())
            .bind(scope.subject.as_deref())
            .bind(scope.period.as_deref())
            .bind(scope.since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("failed to fetch grades")?;

        let mut rows = Vec::with_capacity(records.len());
        for row in records {
            rows.push(GradeRow {
                student: row.try_get("student")?,
                class: row.try_get("class")?,
                subject: row.try_get("subject")?,
                period: row.try_get("period")?,
                evaluated_on: row.try_get("evaluated_on")?,
                score: row.try_get("score")?,
                max_score: row.try_get("max_score")?,
            });
        }

        info!(rows = rows.len(), scope = %scope.describe(), "loaded grades from postgres");
        Ok(rows)
    }
}
