//! Maps INI keys onto [`ConfigFile`] fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use crate::dds::DdsFormat;
use crate::pipeline::OutputFormat;

use super::defaults::clamp_concurrency;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Overlay the values found in `ini` on the defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = non_empty(section, "root") {
            config.output.root = expand_tilde(v);
        }
        if let Some(v) = section.get("format") {
            config.output.format = parse(
                "output",
                "format",
                v,
                "must be 0 (png) or 1 (dds)",
            )?;
        }
        if let Some(v) = section.get("compression") {
            let compression: DdsFormat = parse("output", "compression", v, "must be 'bc1' or 'bc3'")?;
            if let OutputFormat::Dds(_) = config.output.format {
                config.output.format = OutputFormat::Dds(compression);
            }
        }
        if let Some(v) = section.get("mipmaps") {
            let count: usize = parse("output", "mipmaps", v, "must be a positive integer")?;
            config.output.mipmap_count = (count > 0).then_some(count);
        }
    }

    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("concurrency") {
            let n: usize = parse("download", "concurrency", v, "must be a positive integer")?;
            config.download.cell_concurrency = clamp_concurrency(n);
        }
        if let Some(v) = section.get("max_attempts") {
            let n: u32 = parse("download", "max_attempts", v, "must be a positive integer")?;
            config.download.max_attempts = n.max(1);
        }
        if let Some(v) = section.get("backoff") {
            config.download.backoff_secs =
                parse("download", "backoff", v, "must be a whole number of seconds")?;
        }
        if let Some(v) = section.get("timeout") {
            let secs: u64 = parse("download", "timeout", v, "must be a positive integer (seconds)")?;
            if secs == 0 {
                return Err(invalid("download", "timeout", v, "must be a positive integer (seconds)"));
            }
            config.download.timeout_secs = secs;
        }
        if let Some(v) = non_empty(section, "proxy") {
            config.download.proxy = Some(v.to_string());
        }
        if let Some(v) = non_empty(section, "referer") {
            config.download.referer = v.to_string();
        }
    }

    if let Some(section) = ini.section(Some("planner")) {
        if let Some(v) = section.get("size") {
            let size = parse_tier("size", v)?;
            config.planner = config.planner.with_size(size);
        }
        if let Some(v) = section.get("size_down") {
            let size_down = parse_tier("size_down", v)?;
            config.planner = config.planner.with_size_down(size_down);
        }
    }

    if let Some(section) = ini.section(Some("run")) {
        if let Some(v) = section.get("tile_concurrency") {
            let n: usize = parse("run", "tile_concurrency", v, "must be a positive integer")?;
            config.run = config.run.with_tile_concurrency(clamp_concurrency(n));
        }
        if let Some(v) = section.get("prune") {
            let prune = parse_bool(v).ok_or_else(|| invalid("run", "prune", v, "must be true or false"))?;
            config.run = config.run.with_prune(prune);
        }
        if let Some(v) = section.get("server") {
            config.server_id = parse("run", "server", v, "must be a map server id")?;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    config.servers.merge_ini(ini)?;
    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(section: &str, key: &str, value: &str, reason: &str) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn parse_tier(key: &str, value: &str) -> Result<u8, ConfigFileError> {
    match value.trim().parse::<u8>() {
        Ok(tier) if tier <= 6 => Ok(tier),
        _ => Err(invalid("planner", key, value, "must be a tier between 0 and 6")),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
