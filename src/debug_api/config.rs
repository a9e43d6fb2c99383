use std::ffi::{OsStr, OsString};

use anyhow::{anyhow, Context, Result};

const DEFAULT_BIND: &str = "127.0.0.1:7878";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugApiConfig {
    pub enabled: bool,
    pub bind_addr: String,
}

impl Default for DebugApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: DEFAULT_BIND.to_string(),
        }
    }
}

impl DebugApiConfig {
    /// Reads `--debug-api`, `--debug-api-bind ADDR` and `--debug-api-port N`
    /// from the command line, plus `GARDEN_DEBUG_API` / `GARDEN_DEBUG_API_BIND`
    /// from the environment. Flags win over the environment.
    pub fn from_env_args() -> Result<Self> {
        Self::from_iter(
            std::env::args_os().skip(1),
            std::env::var_os("GARDEN_DEBUG_API"),
            std::env::var_os("GARDEN_DEBUG_API_BIND"),
        )
    }

    fn from_iter<I>(args: I, env_enabled: Option<OsString>, env_bind: Option<OsString>) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut config = Self::default();
        if env_is_truthy(env_enabled.as_deref()) {
            config.enabled = true;
        }
        if let Some(bind) = env_bind.filter(|v| !v.is_empty()) {
            config.bind_addr = bind.to_string_lossy().trim().to_string();
        }

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.to_string_lossy().as_ref() {
                "--debug-api" => config.enabled = true,
                "--debug-api-bind" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| anyhow!("--debug-api-bind requires a value"))?;
                    config.bind_addr = value.to_string_lossy().to_string();
                    config.enabled = true;
                }
                "--debug-api-port" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| anyhow!("--debug-api-port requires a value"))?;
                    let port: u16 = value
                        .to_string_lossy()
                        .parse()
                        .with_context(|| format!("invalid port {value:?}"))?;
                    config.bind_addr = format!("127.0.0.1:{port}");
                    config.enabled = true;
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

fn env_is_truthy(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| {
        let lowered = v.to_string_lossy().trim().to_ascii_lowercase();
        matches!(lowered.as_str(), "1" | "true" | "yes" | "on")
    })
}
