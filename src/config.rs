use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

static CONFIG: OnceCell<ProbeConfig> = OnceCell::new();

/// Timeouts and buffer sizes shared by every connection the probe opens.
///
/// The defaults match the intended test usage: a local server under test that
/// answers within a second, and a close probe that must not stall the suite.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub connect_timeout: Duration,

    /// Read/write timeout applied to every socket operation.
    #[serde(deserialize_with = "deserialize_duration")]
    pub io_timeout: Duration,

    /// Window `is_closed` waits for the peer's FIN before giving up.
    #[serde(deserialize_with = "deserialize_duration")]
    pub close_probe_timeout: Duration,

    /// Ceiling for a single unsized `read_some` call.
    pub recv_ceiling: usize,

    /// How long a WebSocket `recv` waits on the message queue.
    #[serde(deserialize_with = "deserialize_duration")]
    pub ws_recv_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            io_timeout: Duration::from_secs(1),
            close_probe_timeout: Duration::from_millis(100),
            recv_ceiling: 999_999,
            ws_recv_timeout: Duration::from_secs(1),
        }
    }
}

impl ProbeConfig {
    pub fn from_file(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("Fail to read {}: {err}", path);
                warn!("Fall back to default config");
                return ProbeConfig::default();
            }
        };

        match toml::from_str::<ProbeConfig>(content.as_str()) {
            Ok(probe_config) => probe_config,
            Err(err) => {
                warn!("Fail to deserialize config file {}: {err}", path);
                warn!("Fall back to default config");
                ProbeConfig::default()
            }
        }
    }
}

pub fn set_config(cfg: ProbeConfig) {
    CONFIG.set(cfg).expect("Config already set");
}

/// The probe is embedded in test binaries, so unlike a server there is no
/// mandatory init step: the first access falls back to the defaults.
pub fn config() -> &'static ProbeConfig {
    CONFIG.get_or_init(ProbeConfig::default)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Ok(Duration::from_secs_f64(secs))
}
