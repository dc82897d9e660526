use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One graded evaluation result attributed to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord<K> {
    pub entity_id: K,
    pub score: f64,
    pub max_score: f64,
}

impl<K> ScoreRecord<K> {
    pub fn new(entity_id: K, score: f64, max_score: f64) -> Self {
        Self {
            entity_id,
            score,
            max_score,
        }
    }
}

/// Statistics over the normalized (0-20) scores of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult<K> {
    pub entity_id: K,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry<K> {
    #[serde(flatten)]
    pub aggregate: AggregateResult<K>,
    pub rank: usize,
    pub tier: PerformanceTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PerformanceTier {
    Excellent,
    VeryGood,
    Good,
    Passable,
    Insufficient,
}

impl PerformanceTier {
    pub const ALL: [PerformanceTier; 5] = [
        PerformanceTier::Excellent,
        PerformanceTier::VeryGood,
        PerformanceTier::Good,
        PerformanceTier::Passable,
        PerformanceTier::Insufficient,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Excellent",
            PerformanceTier::VeryGood => "Très bien",
            PerformanceTier::Good => "Bien",
            PerformanceTier::Passable => "Passable",
            PerformanceTier::Insufficient => "Insuffisant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierCount {
    pub tier: PerformanceTier,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EntityKind {
    Student,
    Class,
    Subject,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Student => "students",
            EntityKind::Class => "classes",
            EntityKind::Subject => "subjects",
        }
    }
}

/// A persisted grade as handed over by the storage layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradeRow {
    pub student: String,
    pub class: String,
    pub subject: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub evaluated_on: Option<NaiveDate>,
    pub score: f64,
    pub max_score: f64,
}

impl GradeRow {
    pub fn entity_id(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Student => &self.student,
            EntityKind::Class => &self.class,
            EntityKind::Subject => &self.subject,
        }
    }

    pub fn to_record(&self, kind: EntityKind) -> ScoreRecord<String> {
        ScoreRecord::new(self.entity_id(kind).to_string(), self.score, self.max_score)
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Which entities to rank and which grades to consider.
#[derive(Debug, Clone)]
pub struct ReportScope {
    pub kind: EntityKind,
    pub class: Option<String>,
    pub subject: Option<String>,
    pub period: Option<String>,
    pub since: Option<NaiveDate>,
    pub max_records: usize,
}

impl ReportScope {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            class: None,
            subject: None,
            period: None,
            since: None,
            max_records: 50_000,
        }
    }

    pub fn matches(&self, row: &GradeRow) -> bool {
        if let Some(class) = &self.class {
            if &row.class != class {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if &row.subject != subject {
                return false;
            }
        }
        if let Some(period) = &self.period {
            if row.period.as_ref() != Some(period) {
                return false;
            }
        }
        if let Some(since) = self.since {
            match row.evaluated_on {
                Some(date) if date >= since => {}
                _ => return false,
            }
        }
        true
    }

    pub fn describe(&self) -> String {
        let mut parts = vec![self.kind.label().to_string()];
        if let Some(class) = &self.class {
            parts.push(format!("class {class}"));
        }
        if let Some(subject) = &self.subject {
            parts.push(format!("subject {subject}"));
        }
        if let Some(period) = &self.period {
            parts.push(format!("period {period}"));
        }
        if let Some(since) = self.since {
            parts.push(format!("since {since}"));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(class: &str, subject: &str, period: Option<&str>, day: Option<u32>) -> GradeRow {
        GradeRow {
            student: "S-001".to_string(),
            class: class.to_string(),
            subject: subject.to_string(),
            period: period.map(str::to_string),
            evaluated_on: day.and_then(|d| NaiveDate::from_ymd_opt(2025, 11, d)),
            score: 12.0,
            max_score: 20.0,
        }
    }

    #[test]
    fn entity_id_follows_kind() {
        let grade = row("6A", "MATH", None, None);
        assert_eq!(grade.entity_id(EntityKind::Student), "S-001");
        assert_eq!(grade.entity_id(EntityKind::Class), "6A");
        assert_eq!(grade.entity_id(EntityKind::Subject), "MATH");
    }

    #[test]
    fn scope_filters_on_every_field() {
        let mut scope = ReportScope::new(EntityKind::Student);
        scope.class = Some("6A".to_string());
        scope.period = Some("T1".to_string());
        scope.since = NaiveDate::from_ymd_opt(2025, 11, 10);

        assert!(scope.matches(&row("6A", "MATH", Some("T1"), Some(12))));
        assert!(!scope.matches(&row("6B", "MATH", Some("T1"), Some(12))));
        assert!(!scope.matches(&row("6A", "MATH", Some("T2"), Some(12))));
        assert!(!scope.matches(&row("6A", "MATH", Some("T1"), Some(3))));
        assert!(!scope.matches(&row("6A", "MATH", Some("T1"), None)));
    }

    #[test]
    fn scope_description_lists_filters() {
        let mut scope = ReportScope::new(EntityKind::Subject);
        scope.class = Some("6A".to_string());
        assert_eq!(scope.describe(), "subjects, class 6A");
    }
}
