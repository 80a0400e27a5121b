//! Shallow reflection helpers. Each forces one level and reports on it.

use crate::error::Result;
use crate::node::RawNode;
use crate::view::View;

pub async fn type_of(view: &View) -> Result<&'static str> {
    Ok(view.force().await?.type_name())
}

/// Keys of an object, indexes of an array, `None` otherwise.
pub async fn keys_of(view: &View) -> Result<Option<Vec<String>>> {
    let resolved = view.force().await?;
    let keys = match &*resolved {
        RawNode::Object(map) => Some(map.keys().cloned().collect()),
        RawNode::Array(items) => Some((0..items.len()).map(|i| i.to_string()).collect()),
        _ => None,
    };
    Ok(keys)
}

/// Length of an array, `None` otherwise.
pub async fn length_of(view: &View) -> Result<Option<usize>> {
    Ok(view.force().await?.as_array().map(<[_]>::len))
}

pub async fn has(view: &View, key: &str) -> Result<bool> {
    let resolved = view.force().await?;
    let found = match &*resolved {
        RawNode::Object(map) => map.contains_key(key),
        RawNode::Array(items) => key.parse::<usize>().is_ok_and(|i| i < items.len()),
        _ => false,
    };
    Ok(found)
}
