//! Session configuration assembled from defaults, a TOML file and flags.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use pipeflow_world::{BoardLayout, SessionConfig};

use crate::{layout_transfer, CliArgs};

/// Builds the session configuration requested on the command line.
///
/// A config file replaces the defaults wholesale (missing keys fall back to
/// [`SessionConfig::default`]); explicit flags override whatever it said.
pub(crate) fn session_config(args: &CliArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None if args.classic => SessionConfig::classic(),
        None => SessionConfig::default(),
    };
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<SessionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn parse_config(text: &str) -> Result<SessionConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Loads a board layout from a transfer string, or from a file holding
/// either a transfer string or layout text.
pub(crate) fn load_layout(source: &str) -> Result<BoardLayout> {
    if layout_transfer::is_transfer_string(source) {
        return layout_transfer::decode(source).context("invalid layout transfer string");
    }
    let text = fs::read_to_string(source)
        .with_context(|| format!("failed to read layout file {source}"))?;
    if layout_transfer::is_transfer_string(&text) {
        return layout_transfer::decode(&text)
            .with_context(|| format!("invalid layout transfer string in {source}"));
    }
    text.parse()
        .with_context(|| format!("invalid layout in {source}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config = parse_config(
            "rows = 8\ncolumns = 10\nflow_step_ms = 20\nstage_duration_ms = 12000\n",
        )
        .expect("config parses");
        assert_eq!(config.rows, 8);
        assert_eq!(config.columns, 10);
        assert_eq!(config.flow_step, Duration::from_millis(20));
        assert_eq!(config.stage_duration, Duration::from_secs(12));
        assert_eq!(config.hop_bonus, SessionConfig::default().hop_bonus);
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        assert!(parse_config("rows = \"many\"").is_err());
    }

    #[test]
    fn flags_override_the_chosen_base() {
        let args = CliArgs::parse_from(["pipeflow", "--classic", "--rows", "5"]);
        let config = session_config(&args).expect("no file involved");
        assert_eq!(config.rows, 5);
        assert_eq!(config.columns, SessionConfig::classic().columns);
        assert!(config.skip_lobby);
    }

    #[test]
    fn config_file_is_read_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.toml");
        fs::write(&path, "queue_length = 3\nskip_lobby = true\n").expect("write config");

        let args = CliArgs::parse_from([
            "pipeflow",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--columns",
            "4",
        ]);
        let config = session_config(&args).expect("config loads");
        assert_eq!(config.queue_length, 3);
        assert_eq!(config.columns, 4);
        assert!(config.skip_lobby);
    }

    #[test]
    fn layout_source_may_be_text_or_transfer_string() {
        let layout: BoardLayout = "S> E<\n".parse().expect("tiny layout parses");
        let encoded = layout_transfer::encode(&layout).expect("encodes");
        assert_eq!(load_layout(&encoded).expect("decodes"), layout);
        assert!(load_layout("no/such/layout.txt").is_err());
    }
}
