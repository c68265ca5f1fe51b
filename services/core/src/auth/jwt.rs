use serde::{Deserialize, Serialize};

/// Claims carried by an access token once its signature has been verified upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
