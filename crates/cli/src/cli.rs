use clap::{Parser, ValueEnum};

/// Evaluate rule documents.
///
/// Sources are JSON or YAML documents merged left to right at the top level.
/// The merged document is evaluated lazily: only the part selected with
/// `--path` (or the whole document) is realized and printed.
#[derive(Parser, Debug)]
#[command(name = "rulify", about = "Evaluate lazy declarative rule documents")]
pub struct CliArgs {
    /// Source documents (.json, .yaml, .yml); `-` reads JSON from stdin
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Path to realize, e.g. `pricing.tiers[0].label` (default: whole document)
    #[arg(long)]
    pub path: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Path to config file (default: ~/.config/rulify/config.toml)
    #[arg(long, env = "RULIFY_CONFIG")]
    pub config: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sources_and_flags() {
        let args = CliArgs::try_parse_from([
            "rulify",
            "base.yaml",
            "overrides.json",
            "--path",
            "a.b[0]",
            "--format",
            "yaml",
        ])
        .unwrap();
        assert_eq!(args.sources, ["base.yaml", "overrides.json"]);
        assert_eq!(args.path.as_deref(), Some("a.b[0]"));
        assert_eq!(args.format, OutputFormat::Yaml);
        assert!(!args.pretty);
    }

    #[test]
    fn requires_a_source() {
        assert!(CliArgs::try_parse_from(["rulify"]).is_err());
    }
}
