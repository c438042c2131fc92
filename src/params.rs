//! Request parameters and the rules `update` applies to them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Error, Result};

/// Request parameters, ordered by key.
pub type ParamMap = BTreeMap<String, String>;

/// Keys `update` forwards; anything else is dropped silently.
pub const UPDATE_PARAMS: &[&str] = &[
    "lat", "lon", "woeid", "place_id", "address", "mnc", "mcc", "lac", "cid", "postal", "city",
    "state", "country", "q", "label",
];

/// Coordinates: both or neither.
pub const COORDINATE_KEYS: &[&str] = &["lat", "lon"];

/// Cell tower identity: all four or none.
pub const CELL_TOWER_KEYS: &[&str] = &["mnc", "mcc", "lac", "cid"];

/// Collect anything `serde_urlencoded` can serialize into a [`ParamMap`].
pub fn to_param_map<T: Serialize + ?Sized>(params: &T) -> Result<ParamMap> {
    let encoded = serde_urlencoded::to_string(params)
        .map_err(|e| Error::Validation(format!("unsupported parameter value: {}", e)))?;
    Ok(url::form_urlencoded::parse(encoded.as_bytes())
        .into_owned()
        .collect())
}

/// `true` when either every key or none of them is present.
pub fn all_or_none(params: &ParamMap, keys: &[&str]) -> bool {
    let present = keys.iter().filter(|k| params.contains_key(**k)).count();
    present == 0 || present == keys.len()
}

/// Keep only [`UPDATE_PARAMS`].
pub fn filter_update_params(params: ParamMap) -> ParamMap {
    params
        .into_iter()
        .filter(|(k, _)| UPDATE_PARAMS.contains(&k.as_str()))
        .collect()
}

pub fn validate_update_params(params: &ParamMap) -> Result<()> {
    for group in &[COORDINATE_KEYS, CELL_TOWER_KEYS] {
        if !all_or_none(params, group) {
            return Err(Error::Validation(format!(
                "requires all or none of {}",
                group.join(", ")
            )));
        }
    }
    Ok(())
}
