use crate::ports::time::TimeProvider;

use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

mod dataset;

pub use dataset::DatasetError;

const FETCH_ROUND_TRIP: Duration = Duration::from_millis(500);
const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUserPoint {
    pub time_bucket: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkforceUtilization {
    pub total: u32,
    pub persons: Vec<Person>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMetrics {
    pub wait_time_seconds: u32,
    pub work_force_utilization: WorkforceUtilization,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionData {
    pub location_name: String,
    pub metrics: SectionMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub active_users: Vec<ActiveUserPoint>,
    pub section_data: Vec<SectionData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_active_users: u64,
    pub avg_wait_time_seconds: u32,
    pub avg_utilization: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            _ => Err(format!(
                "invalid timeframe '{raw}', expected daily, weekly, or monthly"
            )),
        }
    }
}

/// Read side of the dashboard: a static snapshot served behind the same
/// artificial latency a remote API would have.
#[derive(Clone)]
pub struct DataProvider<T> {
    time: T,
    snapshot: Arc<DashboardData>,
}

impl<T> DataProvider<T>
where
    T: TimeProvider,
{
    pub fn new(time: T) -> Result<Self, DatasetError> {
        Ok(Self::with_snapshot(time, dataset::embedded_snapshot()?))
    }

    pub fn with_snapshot(time: T, snapshot: DashboardData) -> Self {
        Self {
            time,
            snapshot: Arc::new(snapshot),
        }
    }

    pub async fn fetch_dashboard_data(&self) -> Arc<DashboardData> {
        self.time.sleep(FETCH_ROUND_TRIP).await;
        Arc::clone(&self.snapshot)
    }

    pub async fn fetch_active_users(&self, timeframe: Timeframe) -> Vec<ActiveUserPoint> {
        self.time.sleep(FETCH_ROUND_TRIP).await;
        aggregate_active_users(&self.snapshot.active_users, timeframe)
    }

    pub async fn summary(&self) -> DashboardSummary {
        let data = self.fetch_dashboard_data().await;
        summarize(&data)
    }
}

/// Rolls daily points up into the requested timeframe. Weekly buckets are
/// chunks of seven days labelled by their first day; monthly collapses the
/// whole series into one bucket.
pub fn aggregate_active_users(
    points: &[ActiveUserPoint],
    timeframe: Timeframe,
) -> Vec<ActiveUserPoint> {
    match timeframe {
        Timeframe::Daily => points.to_vec(),
        Timeframe::Weekly => points
            .chunks(DAYS_PER_WEEK)
            .map(|week| ActiveUserPoint {
                time_bucket: week[0].time_bucket.clone(),
                value: week.iter().map(|point| point.value).sum(),
            })
            .collect(),
        Timeframe::Monthly => match points.first() {
            Some(first) => vec![ActiveUserPoint {
                time_bucket: first.time_bucket.clone(),
                value: points.iter().map(|point| point.value).sum(),
            }],
            None => Vec::new(),
        },
    }
}

pub fn summarize(data: &DashboardData) -> DashboardSummary {
    let total_active_users = data.active_users.iter().map(|point| point.value).sum();
    if data.section_data.is_empty() {
        return DashboardSummary {
            total_active_users,
            avg_wait_time_seconds: 0,
            avg_utilization: 0,
        };
    }

    let sections = data.section_data.len() as f64;
    let wait_sum: u64 = data
        .section_data
        .iter()
        .map(|section| u64::from(section.metrics.wait_time_seconds))
        .sum();
    let utilization_sum: u64 = data
        .section_data
        .iter()
        .map(|section| u64::from(section.metrics.work_force_utilization.total))
        .sum();

    DashboardSummary {
        total_active_users,
        avg_wait_time_seconds: (wait_sum as f64 / sections).round() as u32,
        avg_utilization: (utilization_sum as f64 / sections).round() as u32,
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::testutil::{TestTime, fixture_now};

    fn daily_points(values: &[u64]) -> Vec<ActiveUserPoint> {
        values
            .iter()
            .enumerate()
            .map(|(day, value)| ActiveUserPoint {
                time_bucket: format!("2025-07-{:02}", day + 1),
                value: *value,
            })
            .collect()
    }

    fn section(name: &str, wait: u32, utilization: u32) -> SectionData {
        SectionData {
            location_name: name.to_string(),
            metrics: SectionMetrics {
                wait_time_seconds: wait,
                work_force_utilization: WorkforceUtilization {
                    total: utilization,
                    persons: vec![Person {
                        first_name: "Maya".to_string(),
                        last_name: "Lindqvist".to_string(),
                    }],
                },
            },
        }
    }

    #[test]
    fn aggregate_active_users__should_keep_daily_points_untouched() {
        // Given
        let points = daily_points(&[10, 20, 30]);

        // When
        let aggregated = aggregate_active_users(&points, Timeframe::Daily);

        // Then
        assert_eq!(aggregated, points);
    }

    #[test]
    fn aggregate_active_users__should_sum_weekly_chunks_of_seven() {
        // Given
        let points = daily_points(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        // When
        let aggregated = aggregate_active_users(&points, Timeframe::Weekly);

        // Then
        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated[0].time_bucket, "2025-07-01");
        assert_eq!(aggregated[0].value, 28);
        assert_eq!(aggregated[1].time_bucket, "2025-07-08");
        assert_eq!(aggregated[1].value, 27);
    }

    #[test]
    fn aggregate_active_users__should_keep_exact_week_in_one_bucket() {
        // Given
        let points = daily_points(&[1, 1, 1, 1, 1, 1, 1]);

        // When
        let aggregated = aggregate_active_users(&points, Timeframe::Weekly);

        // Then
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].value, 7);
    }

    #[test]
    fn aggregate_active_users__should_collapse_monthly_into_first_bucket() {
        // Given
        let points = daily_points(&[5, 10, 15]);

        // When
        let aggregated = aggregate_active_users(&points, Timeframe::Monthly);

        // Then
        assert_eq!(
            aggregated,
            vec![ActiveUserPoint {
                time_bucket: "2025-07-01".to_string(),
                value: 30,
            }]
        );
    }

    #[test]
    fn aggregate_active_users__should_return_empty_for_empty_input() {
        for timeframe in [Timeframe::Daily, Timeframe::Weekly, Timeframe::Monthly] {
            assert!(aggregate_active_users(&[], timeframe).is_empty());
        }
    }

    #[test]
    fn summarize__should_round_section_averages() {
        // Given
        let data = DashboardData {
            active_users: daily_points(&[100, 200, 300]),
            section_data: vec![section("Entrance", 10, 81), section("Checkout", 15, 92)],
        };

        // When
        let summary = summarize(&data);

        // Then
        assert_eq!(summary.total_active_users, 600);
        assert_eq!(summary.avg_wait_time_seconds, 13);
        assert_eq!(summary.avg_utilization, 87);
    }

    #[test]
    fn summarize__should_zero_averages_without_sections() {
        // Given
        let data = DashboardData {
            active_users: daily_points(&[100]),
            section_data: Vec::new(),
        };

        // When
        let summary = summarize(&data);

        // Then
        assert_eq!(summary.total_active_users, 100);
        assert_eq!(summary.avg_wait_time_seconds, 0);
        assert_eq!(summary.avg_utilization, 0);
    }

    #[tokio::test]
    async fn fetch_dashboard_data__should_wait_for_round_trip() {
        // Given
        let time = TestTime::instant(fixture_now());
        let snapshot = DashboardData {
            active_users: daily_points(&[1, 2]),
            section_data: vec![section("Entrance", 10, 50)],
        };
        let provider = DataProvider::with_snapshot(time.clone(), snapshot.clone());

        // When
        let fetched = provider.fetch_dashboard_data().await;

        // Then
        assert_eq!(*fetched, snapshot);
        assert_eq!(time.sleep_durations(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn fetch_active_users__should_aggregate_after_round_trip() {
        // Given
        let time = TestTime::instant(fixture_now());
        let snapshot = DashboardData {
            active_users: daily_points(&[1, 2, 3, 4, 5, 6, 7, 8]),
            section_data: Vec::new(),
        };
        let provider = DataProvider::with_snapshot(time.clone(), snapshot);

        // When
        let weekly = provider.fetch_active_users(Timeframe::Weekly).await;

        // Then
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].value, 28);
        assert_eq!(weekly[1].value, 8);
        assert_eq!(time.sleep_durations(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn summary__should_match_summarize_of_snapshot() {
        // Given
        let snapshot = DashboardData {
            active_users: daily_points(&[100, 200]),
            section_data: vec![section("Entrance", 35, 81), section("Apparel", 60, 58)],
        };
        let provider =
            DataProvider::with_snapshot(TestTime::instant(fixture_now()), snapshot.clone());

        // When
        let summary = provider.summary().await;

        // Then
        assert_eq!(summary, summarize(&snapshot));
        assert_eq!(summary.total_active_users, 300);
    }

    #[tokio::test]
    async fn new__should_serve_embedded_snapshot() {
        // Given
        let provider =
            DataProvider::new(TestTime::instant(fixture_now())).expect("embedded snapshot");

        // When
        let data = provider.fetch_dashboard_data().await;

        // Then
        assert!(!data.active_users.is_empty());
        assert!(!data.section_data.is_empty());
    }

    #[test]
    fn timeframe__should_parse_known_literals_only() {
        assert_eq!("daily".parse::<Timeframe>(), Ok(Timeframe::Daily));
        assert_eq!("weekly".parse::<Timeframe>(), Ok(Timeframe::Weekly));
        assert_eq!("monthly".parse::<Timeframe>(), Ok(Timeframe::Monthly));
        assert!("yearly".parse::<Timeframe>().is_err());
    }

    #[test]
    fn dashboard_data__should_deserialize_camel_case_wire_shape() {
        // Given
        let raw = r#"{
            "activeUsers": [{ "timeBucket": "2025-07-01", "value": 42 }],
            "sectionData": [{
                "locationName": "Checkout",
                "metrics": {
                    "waitTimeSeconds": 210,
                    "workForceUtilization": {
                        "total": 92,
                        "persons": [{ "firstName": "Priya", "lastName": "Nair" }]
                    }
                }
            }]
        }"#;

        // When
        let data: DashboardData = serde_json::from_str(raw).expect("parse");

        // Then
        assert_eq!(data.active_users[0].time_bucket, "2025-07-01");
        assert_eq!(data.active_users[0].value, 42);
        assert_eq!(data.section_data[0].location_name, "Checkout");
        assert_eq!(data.section_data[0].metrics.wait_time_seconds, 210);
        assert_eq!(
            data.section_data[0]
                .metrics
                .work_force_utilization
                .persons[0]
                .first_name,
            "Priya"
        );
    }
}
