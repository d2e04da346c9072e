//! Engine configuration files (JSON). Missing keys take their defaults; the
//! result is validated before it is handed out.

use std::fs;
use std::path::Path;

use gov_core::EngineConfig;

use crate::IoResult;

pub fn engine_config_from_str(text: &str) -> IoResult<EngineConfig> {
    let cfg: EngineConfig = serde_json::from_str(text)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_engine_config(path: &Path) -> IoResult<EngineConfig> {
    let text = fs::read_to_string(path)?;
    engine_config_from_str(&text)
}
