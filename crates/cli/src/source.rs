//! Loading source documents and rendering realized values.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rulify_rules::Value;
use tracing::debug;

use crate::cli::OutputFormat;

/// Read one source document. `-` is JSON on stdin; files are parsed by extension.
pub fn load_source(source: &str) -> Result<serde_json::Value> {
    if source == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        return serde_json::from_str(&content).context("failed to parse JSON from stdin");
    }

    let path = Path::new(source);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source: {}", path.display()))?;
    debug!(source = %path.display(), bytes = content.len(), "Loaded source");
    parse_document(path, &content)
}

fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_str(content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))
    } else {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    }
}

/// Render a realized value for printing.
pub fn render(value: &Value, format: OutputFormat, pretty: bool) -> Result<String> {
    let out = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_json_and_yaml_by_extension() {
        let json_file = write_temp(".json", r#"{ "a": { "$not": true } }"#);
        let yaml_file = write_temp(".yaml", "a:\n  $not: true\nlist: [1, 2]\n");

        let from_json = load_source(json_file.path().to_str().unwrap()).unwrap();
        let from_yaml = load_source(yaml_file.path().to_str().unwrap()).unwrap();

        assert_eq!(from_json, json!({ "a": { "$not": true } }));
        assert_eq!(from_yaml, json!({ "a": { "$not": true }, "list": [1, 2] }));
    }

    #[test]
    fn reports_the_failing_file() {
        let broken = write_temp(".json", "{ not json");
        let err = load_source(broken.path().to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse JSON"));

        let err = load_source("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read source"));
    }

    #[test]
    fn renders_each_format() {
        let value = Value::from(json!({ "ok": true, "n": 2 }));
        assert_eq!(render(&value, OutputFormat::Json, false).unwrap(), r#"{"ok":true,"n":2}"#);
        assert!(render(&value, OutputFormat::Json, true).unwrap().contains("\n  \"ok\": true"));
        assert_eq!(render(&value, OutputFormat::Yaml, false).unwrap(), "ok: true\nn: 2\n");
    }

    #[tokio::test]
    async fn evaluates_loaded_documents() {
        let rules = write_temp(
            ".yaml",
            "age: 30\nadult:\n  $match:\n    age:\n      $gte: 18\n",
        );
        let doc = load_source(rules.path().to_str().unwrap()).unwrap();
        let root = rulify_rules::rulify([doc]).unwrap();
        assert_eq!(root.get("adult").materialize().await.unwrap(), json!(true));
    }
}
