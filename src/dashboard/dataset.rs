use super::DashboardData;

const SNAPSHOT_JSON: &str = include_str!("sample_data.json");

#[derive(Debug)]
pub struct DatasetError(serde_json::Error);

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "embedded dashboard dataset is invalid: {}", self.0)
    }
}

impl std::error::Error for DatasetError {}

pub(crate) fn embedded_snapshot() -> Result<DashboardData, DatasetError> {
    serde_json::from_str(SNAPSHOT_JSON).map_err(DatasetError)
}
