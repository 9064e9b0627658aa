use crate::config::toml_config::AppConfig;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "qr-points")]
#[command(about = "Credits reward points for scanned disposal codes")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "qr-points.toml")]
    pub config: String,

    /// Receptacle name; skips the interactive selection
    #[arg(long)]
    pub receptacle: Option<String>,

    /// Waste category accepted by the receptacle
    #[arg(long)]
    pub category: Option<String>,

    /// Capture source: "stdin" or a file/device path
    #[arg(long)]
    pub source: Option<String>,

    /// Disable audio cues
    #[arg(long)]
    pub mute: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Command-line values win over the file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(name) = &self.receptacle {
            tracing::info!("🔧 Receptacle overridden to: {}", name);
            config.receptacle.name = Some(name.clone());
        }
        if let Some(category) = &self.category {
            tracing::info!("🔧 Assigned category overridden to: {}", category);
            config.receptacle.assigned_category = category.clone();
        }
        if let Some(source) = &self.source {
            tracing::info!("🔧 Capture source overridden to: {}", source);
            config.capture.source = source.clone();
        }
        if self.mute {
            config.feedback.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[backend]
url = "https://demo.supabase.co"
api_key = "anon-key"

[receptacle]
name = "north"
assigned_category = "burnable"
"#;

    #[test]
    fn test_parse_defaults() {
        let args = CliArgs::parse_from(["qr-points"]);
        assert_eq!(args.config, "qr-points.toml");
        assert_eq!(args.log_format, LogFormat::Compact);
        assert!(args.receptacle.is_none());
        assert!(!args.mute);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let args = CliArgs::parse_from([
            "qr-points",
            "--receptacle",
            "south",
            "--category",
            "plastic",
            "--source",
            "scans.txt",
            "--mute",
            "--log-format",
            "json",
        ]);
        let mut config = AppConfig::from_toml_str(CONFIG).unwrap();

        args.apply_overrides(&mut config);

        assert_eq!(config.receptacle.name.as_deref(), Some("south"));
        assert_eq!(config.receptacle.assigned_category, "plastic");
        assert_eq!(config.capture.source, "scans.txt");
        assert!(!config.feedback.enabled);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let args = CliArgs::parse_from(["qr-points", "-c", "other.toml"]);
        let mut config = AppConfig::from_toml_str(CONFIG).unwrap();

        args.apply_overrides(&mut config);

        assert_eq!(config.receptacle.name.as_deref(), Some("north"));
        assert_eq!(config.receptacle.assigned_category, "burnable");
        assert!(config.feedback.enabled);
    }
}
