use serde::Deserialize;

/// The statusline hook payload, as dumped to disk by the wrapper script.
/// Only the fields the quota computation needs are read.
#[derive(Deserialize, Debug, Default)]
pub struct HookJson {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
}
