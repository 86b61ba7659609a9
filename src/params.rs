//! Query parameters and their validation
//!
//! `QueryParameters` is what the caller hands us, either from CLI flags or
//! from a module-args JSON document written by the automation framework.
//! `QueryParameters::validate` turns it into a `Query`, the only form the
//! pipeline accepts, so nothing is fetched until every option has checked out.

use std::fs;
use std::num::IntErrorKind;
use std::path::Path;

use clap::ValueEnum;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{LcFindError, LcFindResult, NUMERIC_BOUNDS_MESSAGE};

/// Key the automation framework wraps module arguments in.
const MODULE_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "ModuleArgs")]
pub struct QueryParameters {
    pub region: Option<String>,
    pub name_regex: Option<String>,
    pub sort: Option<bool>,
    pub sort_order: Option<SortOrder>,
    pub sort_start: Option<String>,
    pub sort_end: Option<String>,
    pub profile: Option<String>,
}

/// Wire form of the module arguments. The region aliases are separate keys
/// here so a document may carry more than one of them.
#[derive(Debug, Deserialize)]
struct ModuleArgs {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    aws_region: Option<String>,
    #[serde(default)]
    ec2_region: Option<String>,
    #[serde(default)]
    name_regex: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    sort: Option<bool>,
    #[serde(default)]
    sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "deserialize_bound")]
    sort_start: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bound")]
    sort_end: Option<String>,
    #[serde(default)]
    profile: Option<String>,
}

impl From<ModuleArgs> for QueryParameters {
    fn from(args: ModuleArgs) -> Self {
        let given = [&args.region, &args.aws_region, &args.ec2_region]
            .iter()
            .filter(|r| r.is_some())
            .count();
        if given > 1 {
            warn!("region given under more than one name; using the first of region, aws_region, ec2_region");
        }

        QueryParameters {
            region: args.region.or(args.aws_region).or(args.ec2_region),
            name_regex: args.name_regex,
            sort: args.sort,
            sort_order: args.sort_order,
            sort_start: args.sort_start,
            sort_end: args.sort_end,
            profile: args.profile,
        }
    }
}

/// Sorting and slicing, present only when sorting was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub order: SortOrder,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Validated query, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct Query {
    pub region: String,
    pub profile: Option<String>,
    /// Compiled with a leading `^` so it only matches at the start of a name.
    pub name_pattern: Option<Regex>,
    pub sort: Option<SortSpec>,
}

impl QueryParameters {
    /// Parse a module-args document, either flat or wrapped in `ANSIBLE_MODULE_ARGS`.
    pub fn from_args_json(contents: &str) -> LcFindResult<Self> {
        let document: Value = serde_json::from_str(contents).map_err(|e| {
            LcFindError::validation(format!("module arguments are not valid JSON: {}", e))
        })?;

        let args = match document {
            Value::Object(mut map) => match map.remove(MODULE_ARGS_KEY) {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };

        serde_json::from_value(args)
            .map_err(|e| LcFindError::validation(format!("invalid module arguments: {}", e)))
    }

    pub fn from_args_file(path: &Path) -> LcFindResult<Self> {
        debug!("Reading module arguments from {}", path.display());
        let contents = fs::read_to_string(path).map_err(|e| {
            LcFindError::validation(format!(
                "could not read module arguments from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_args_json(&contents)
    }

    /// Overlay `overrides` on top of `self`; any option set in `overrides` wins.
    pub fn merge(self, overrides: QueryParameters) -> QueryParameters {
        QueryParameters {
            region: overrides.region.or(self.region),
            name_regex: overrides.name_regex.or(self.name_regex),
            sort: overrides.sort.or(self.sort),
            sort_order: overrides.sort_order.or(self.sort_order),
            sort_start: overrides.sort_start.or(self.sort_start),
            sort_end: overrides.sort_end.or(self.sort_end),
            profile: overrides.profile.or(self.profile),
        }
    }

    pub fn validate(&self) -> LcFindResult<Query> {
        let region = self
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| LcFindError::validation("missing required arguments: region"))?
            .to_string();

        let name_pattern = match self.name_regex.as_deref() {
            None | Some("") => None,
            Some(pattern) => Some(compile_prefix_pattern(pattern)?),
        };

        // Slice bounds are only looked at when sorting; otherwise they are inert.
        let sort = if self.sort.unwrap_or(false) {
            Some(SortSpec {
                order: self.sort_order.unwrap_or_default(),
                start: parse_bound(self.sort_start.as_deref())?,
                end: parse_bound(self.sort_end.as_deref())?,
            })
        } else {
            None
        };

        Ok(Query {
            region,
            profile: self.profile.clone().filter(|p| !p.is_empty()),
            name_pattern,
            sort,
        })
    }
}

fn compile_prefix_pattern(pattern: &str) -> LcFindResult<Regex> {
    Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
        LcFindError::validation(format!("invalid name_regex {:?}: {}", pattern, e))
    })
}

fn parse_bound(raw: Option<&str>) -> LcFindResult<Option<i64>> {
    let value = match raw {
        None | Some("") => return Ok(None),
        Some(value) => value.trim(),
    };

    // Well-formed integers beyond i64 saturate; slicing clamps them anyway.
    match value.parse::<i64>() {
        Ok(bound) => Ok(Some(bound)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(Some(i64::MAX)),
            IntErrorKind::NegOverflow => Ok(Some(i64::MIN)),
            _ => Err(LcFindError::validation(NUMERIC_BOUNDS_MESSAGE)),
        },
    }
}

/// Boolean spellings accepted by the automation framework.
pub fn parse_loose_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "on" | "1" | "true" | "t" => Some(true),
        "n" | "no" | "off" | "0" | "false" | "f" => Some(false),
        _ => None,
    }
}

fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v == 1.0 => Ok(Some(true)),
            Some(v) if v == 0.0 => Ok(Some(false)),
            _ => Err(de::Error::custom(format!("{} is not a valid boolean", n))),
        },
        Some(Value::String(s)) => parse_loose_bool(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{:?} is not a valid boolean", s))),
        Some(other) => Err(de::Error::custom(format!("{} is not a valid boolean", other))),
    }
}

fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or integer slice bound, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(region: &str) -> QueryParameters {
        QueryParameters {
            region: Some(region.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_region_is_rejected() {
        let err = QueryParameters::default().validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("region"));

        let err = params("   ").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_defaults() {
        let query = params("eu-west-1").validate().unwrap();
        assert_eq!(query.region, "eu-west-1");
        assert!(query.name_pattern.is_none());
        assert!(query.sort.is_none());
        assert!(query.profile.is_none());
    }

    #[test]
    fn test_name_regex_is_anchored_at_start_only() {
        let query = QueryParameters {
            name_regex: Some("lc".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap();
        let pattern = query.name_pattern.unwrap();
        assert!(pattern.is_match("lc-a"));
        assert!(pattern.is_match("lc"));
        assert!(!pattern.is_match("web-lc"));
        assert!(!pattern.is_match("LC-a"));
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let query = QueryParameters {
            name_regex: Some("web|api".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap();
        let pattern = query.name_pattern.unwrap();
        assert!(pattern.is_match("api-20240101"));
        assert!(!pattern.is_match("my-api"));
    }

    #[test]
    fn test_invalid_regex_is_validation_error() {
        let err = QueryParameters {
            name_regex: Some("lc-(".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("name_regex"));
    }

    #[test]
    fn test_non_numeric_bounds_rejected_when_sorting() {
        let err = QueryParameters {
            sort: Some(true),
            sort_start: Some("x".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains(NUMERIC_BOUNDS_MESSAGE));

        let err = QueryParameters {
            sort: Some(true),
            sort_end: Some("1.5".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains(NUMERIC_BOUNDS_MESSAGE));
    }

    #[test]
    fn test_bounds_ignored_without_sort() {
        let query = QueryParameters {
            sort_start: Some("x".to_string()),
            sort_end: Some("y".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap();
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_bounds_parse() {
        let query = QueryParameters {
            sort: Some(true),
            sort_order: Some(SortOrder::Descending),
            sort_start: Some(" -2 ".to_string()),
            sort_end: Some("".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap();
        assert_eq!(
            query.sort,
            Some(SortSpec {
                order: SortOrder::Descending,
                start: Some(-2),
                end: None,
            })
        );
    }

    #[test]
    fn test_oversized_bounds_saturate() {
        let query = QueryParameters {
            sort: Some(true),
            sort_start: Some("-100000000000000000000".to_string()),
            sort_end: Some("100000000000000000000".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap();
        let spec = query.sort.unwrap();
        assert_eq!(spec.start, Some(i64::MIN));
        assert_eq!(spec.end, Some(i64::MAX));

        let err = QueryParameters {
            sort: Some(true),
            sort_end: Some("1e30".to_string()),
            ..params("us-east-1")
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains(NUMERIC_BOUNDS_MESSAGE));
    }

    #[test]
    fn test_region_and_alias_together() {
        let parsed = QueryParameters::from_args_json(
            r#"{"region": "us-east-1", "aws_region": "eu-west-1", "ec2_region": "ap-south-1"}"#,
        )
        .unwrap();
        assert_eq!(parsed.region.as_deref(), Some("us-east-1"));

        let parsed =
            QueryParameters::from_args_json(r#"{"aws_region": "eu-west-1", "ec2_region": "ap-south-1"}"#)
                .unwrap();
        assert_eq!(parsed.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_from_args_json_with_aliases_and_loose_types() {
        let parsed = QueryParameters::from_args_json(
            r#"{
                "ANSIBLE_MODULE_ARGS": {
                    "ec2_region": "ap-southeast-2",
                    "name_regex": "app-",
                    "sort": "yes",
                    "sort_order": "descending",
                    "sort_start": 0,
                    "sort_end": "3",
                    "_ansible_check_mode": false
                }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.region.as_deref(), Some("ap-southeast-2"));
        assert_eq!(parsed.sort, Some(true));
        assert_eq!(parsed.sort_order, Some(SortOrder::Descending));
        assert_eq!(parsed.sort_start.as_deref(), Some("0"));
        assert_eq!(parsed.sort_end.as_deref(), Some("3"));

        let flat = QueryParameters::from_args_json(r#"{"aws_region": "us-west-2", "sort": null}"#)
            .unwrap();
        assert_eq!(flat.region.as_deref(), Some("us-west-2"));
        assert_eq!(flat.sort, None);
    }

    #[test]
    fn test_from_args_json_rejects_bad_values() {
        let err = QueryParameters::from_args_json(r#"{"region": "x", "sort": "maybe"}"#)
            .unwrap_err();
        assert!(err.is_validation());

        let err = QueryParameters::from_args_json(r#"{"region": "x", "sort_order": "random"}"#)
            .unwrap_err();
        assert!(err.is_validation());

        let err = QueryParameters::from_args_json("not json").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = QueryParameters {
            region: Some("us-east-1".to_string()),
            name_regex: Some("old".to_string()),
            sort: Some(true),
            ..Default::default()
        };
        let overrides = QueryParameters {
            name_regex: Some("new".to_string()),
            profile: Some("ops".to_string()),
            ..Default::default()
        };
        let merged = base.merge(overrides);
        assert_eq!(merged.region.as_deref(), Some("us-east-1"));
        assert_eq!(merged.name_regex.as_deref(), Some("new"));
        assert_eq!(merged.sort, Some(true));
        assert_eq!(merged.profile.as_deref(), Some("ops"));
    }

    #[test]
    fn test_parse_loose_bool() {
        assert_eq!(parse_loose_bool("Yes"), Some(true));
        assert_eq!(parse_loose_bool("off"), Some(false));
        assert_eq!(parse_loose_bool("1"), Some(true));
        assert_eq!(parse_loose_bool("nope"), None);
    }
}
