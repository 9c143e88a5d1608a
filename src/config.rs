use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub profile_dir: PathBuf,
    pub app_name: String,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile_dir: std::env::temp_dir(),
            app_name: "Pulseboard".to_string(),
        }
    }
}
