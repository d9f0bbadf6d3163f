use std::path::PathBuf;

/// Production push server endpoint. All three actions go to this one URL.
pub const DEFAULT_PUSH_SERVER_URL: &str = "https://starflight.starcloud.us/push";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of the push server endpoint.
    pub server_url: String,
    /// StarFlight app id.
    pub app_id: String,
    /// StarFlight client secret.
    pub client_secret: String,
    /// Value of the `type` field sent with every request.
    pub platform: String,
    /// Shown as the title of rendered notifications.
    pub app_name: String,
    /// Directory holding the registration store.
    pub state_dir: PathBuf,
}

#[cfg(test)]
impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_PUSH_SERVER_URL.to_string(),
            app_id: "app".to_string(),
            client_secret: "secret".to_string(),
            platform: "android".to_string(),
            app_name: "StarFlight".to_string(),
            state_dir: std::env::temp_dir(),
        }
    }
}
