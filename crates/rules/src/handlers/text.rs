use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::api::EvalApi;
use crate::error::{EngineError, Result};
use crate::handler::Handler;
use crate::node::{Data, RawNode, Value};
use crate::view::View;

fn placeholder() -> Result<&'static Regex> {
    static PLACEHOLDER: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\\?\$\{([^}]+)\}+"))
        .as_ref()
        .map_err(|err| EngineError::Regex(err.clone()))
}

/// `$str`: `${path}` interpolation against the session root.
///
/// `\${...}` is kept literally without the backslash. Stray closing braces
/// right after a placeholder are consumed with it. A null value becomes
/// the empty string; an undefined one leaves the placeholder untouched.
pub struct Interpolate;

#[async_trait]
impl Handler for Interpolate {
    async fn handle(&self, argument: View, api: EvalApi) -> Result<Data> {
        let Value::String(template) = api.materialize(&argument).await? else {
            return Err(EngineError::invalid_argument("$str", "a template string"));
        };

        // (start, end, path) of every placeholder, collected before any await.
        let found: Vec<(usize, usize, String)> = placeholder()?
            .captures_iter(&template)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some((whole.start(), whole.end(), caps[1].to_string()))
            })
            .collect();

        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for (start, end, path) in found {
            out.push_str(&template[last..start]);
            last = end;

            let text = &template[start..end];
            if let Some(escaped) = text.strip_prefix('\\') {
                out.push_str(escaped);
                continue;
            }

            let target = api.get_ref(&path)?;
            let resolved = target.force().await?;
            match &*resolved {
                RawNode::Undefined => out.push_str(text),
                RawNode::Null => {}
                _ => out.push_str(&api.materialize(&target).await?.to_string()),
            }
        }
        out.push_str(&template[last..]);
        Ok(Data::String(out))
    }
}
