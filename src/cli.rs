use anyhow::{Context, Result, bail};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_PURGE_HOURS: i64 = 24;

pub const USAGE: &str = "\
Usage:
  ai-video-ads <PRODUCT_URL> [--config PATH] [--out PATH]
  ai-video-ads purge [--config PATH] [--older-than-hours N]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate { url: String, out: Option<PathBuf> },
    Purge { older_than_hours: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config: PathBuf,
    pub command: Command,
}

/// Parses arguments after the program name.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut config = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut out = None;
    let mut hours = None;
    let mut positionals = Vec::new();

    let mut iter = args.into_iter().map(Into::into);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config = PathBuf::from(iter.next().context("--config needs a path")?),
            "--out" => out = Some(PathBuf::from(iter.next().context("--out needs a path")?)),
            "--older-than-hours" => {
                let raw = iter.next().context("--older-than-hours needs a number")?;
                let n: i64 = raw
                    .parse()
                    .with_context(|| format!("--older-than-hours: not a number: {}", raw))?;
                if n < 0 {
                    bail!("--older-than-hours must not be negative");
                }
                hours = Some(n);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => positionals.push(arg),
        }
    }

    let command = match positionals.as_slice() {
        [cmd] if cmd == "purge" => {
            if out.is_some() {
                bail!("--out is not valid for purge");
            }
            Command::Purge {
                older_than_hours: hours.unwrap_or(DEFAULT_PURGE_HOURS),
            }
        }
        [url] => {
            if hours.is_some() {
                bail!("--older-than-hours is only valid for purge");
            }
            Command::Generate { url: url.clone(), out }
        }
        [] => bail!("missing product URL"),
        _ => bail!("expected exactly one product URL"),
    };

    Ok(CliArgs { config, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_with_defaults() {
        let args = parse_args(["https://shop.example/p/1"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config.json"));
        assert_eq!(
            args.command,
            Command::Generate {
                url: "https://shop.example/p/1".to_string(),
                out: None
            }
        );
    }

    #[test]
    fn generate_with_options_in_any_order() {
        let args = parse_args(["--out", "ads/ad.mp4", "https://shop.example/p/1", "--config", "c.json"]).unwrap();
        assert_eq!(args.config, PathBuf::from("c.json"));
        assert_eq!(
            args.command,
            Command::Generate {
                url: "https://shop.example/p/1".to_string(),
                out: Some(PathBuf::from("ads/ad.mp4"))
            }
        );
    }

    #[test]
    fn purge_command() {
        let args = parse_args(["purge", "--older-than-hours", "6"]).unwrap();
        assert_eq!(args.command, Command::Purge { older_than_hours: 6 });
        let args = parse_args(["purge"]).unwrap();
        assert_eq!(args.command, Command::Purge { older_than_hours: 24 });
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(Vec::<String>::new()).is_err());
        assert!(parse_args(["a", "b"]).is_err());
        assert!(parse_args(["--config"]).is_err());
        assert!(parse_args(["--verbose", "https://x.example"]).is_err());
        assert!(parse_args(["purge", "--older-than-hours", "soon"]).is_err());
        assert!(parse_args(["https://x.example", "--older-than-hours", "2"]).is_err());
    }
}
