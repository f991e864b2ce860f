use serde::Deserialize;

/// Raw YAML representation of the server config file.
///
/// Every key is optional here; consumers demand the keys they need via
/// [`Config::require`](crate::Config::require) at initialization.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub database_url: Option<String>,
    pub aws_default_region: Option<String>,
    #[serde(default)]
    pub queue: RawQueue,
    pub flotilla_mode: Option<String>,
    pub owner_id_var: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawQueue {
    pub namespace: Option<String>,
}
