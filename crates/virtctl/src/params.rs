//! Parsing of `key1:value1,key2:value2` flag values into typed options.
//!
//! Several `create` flags take a small set of named parameters instead of a
//! single value, e.g. `--volume-import type:http,url:https://...,size:10Gi`.
//! Each option struct implements [`FromParams`] to pull its fields out of a
//! [`Params`] set; anything left over is reported as unknown.

use std::fmt::Display;

use itertools::Itertools;
use thiserror::Error;

use crate::quantity::Quantity;

/// Errors produced while parsing or mapping params.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("params may not be empty")]
    Empty,
    #[error("params need to have at least one colon: {0}")]
    MissingColon(String),
    #[error("param \"{0}\" was specified multiple times")]
    Duplicate(String),
    #[error("unknown param(s): {0}")]
    Unknown(String),
    #[error("failed to parse param \"{param}\": {reason}")]
    Invalid { param: String, reason: String },
    #[error("param \"{0}\" not found")]
    NotFound(String),
}

/// A validation failure of a single command-line flag.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to parse \"--{flag}\" flag: {message}")]
pub struct FlagError {
    pub flag: &'static str,
    pub message: String,
}

impl FlagError {
    pub fn new(flag: &'static str, message: impl Display) -> Self {
        Self {
            flag,
            message: message.to_string(),
        }
    }
}

/// The not yet consumed `key:value` pairs of a flag value.
#[derive(Debug)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Split `s` into params. Keys are case-insensitive and each entry is
    /// split at its first colon, so values may contain further colons.
    pub fn parse(s: &str) -> Result<Self, ParamsError> {
        if s.is_empty() {
            return Err(ParamsError::Empty);
        }
        let mut entries: Vec<(String, String)> = Vec::new();
        for entry in s.split(',') {
            let (key, value) = entry
                .split_once(':')
                .ok_or_else(|| ParamsError::MissingColon(entry.to_owned()))?;
            let key = key.to_lowercase();
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(ParamsError::Duplicate(key));
            }
            entries.push((key, value.to_owned()));
        }
        Ok(Self { entries })
    }

    /// Remove and return the value of `key`.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn take_quantity(&mut self, key: &str) -> Result<Option<Quantity>, ParamsError> {
        self.take_parsed(key)
    }

    pub fn take_uint(&mut self, key: &str) -> Result<Option<u32>, ParamsError> {
        self.take_parsed(key)
    }

    fn take_parsed<T>(&mut self, key: &str) -> Result<Option<T>, ParamsError>
    where
        T: std::str::FromStr,
        T::Err: Display,
    {
        self.take(key)
            .map(|v| {
                v.parse().map_err(|e: T::Err| ParamsError::Invalid {
                    param: key.to_owned(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Fail if any param was not consumed.
    pub fn finish(self) -> Result<(), ParamsError> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let unknown = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .join(",");
        Err(ParamsError::Unknown(unknown))
    }
}

/// An option struct which can be filled from params.
pub trait FromParams: Sized {
    /// The accepted params with their value type, in help order.
    const SUPPORTED: &'static [(&'static str, &'static str)];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError>;
}

/// Parse the value of `flag` into `T`, rejecting unknown params.
pub fn map<T: FromParams>(flag: &'static str, value: &str) -> Result<T, FlagError> {
    let mut params = Params::parse(value).map_err(|e| FlagError::new(flag, e))?;
    let obj = T::from_params(&mut params).map_err(|e| FlagError::new(flag, e))?;
    params.finish().map_err(|e| FlagError::new(flag, e))?;
    Ok(obj)
}

/// Render the params accepted by `T`, e.g. `src:string,name:string`.
pub fn supported<T: FromParams>() -> String {
    T::SUPPORTED
        .iter()
        .map(|(name, kind)| format!("{name}:{kind}"))
        .join(",")
}

/// Flag help text followed by the params the flag accepts.
pub fn help<T: FromParams>(text: &str) -> String {
    format!("{text}\nSupported parameters: {}", supported::<T>())
}

/// Look up a single param without mapping the whole value.
pub fn get_param_by_name(name: &str, s: &str) -> Result<String, ParamsError> {
    let mut params = Params::parse(s)?;
    params
        .take(&name.to_lowercase())
        .ok_or_else(|| ParamsError::NotFound(name.to_owned()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixedNameError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("invalid count {0} of slashes in prefix/name")]
    TooManySlashes(usize),
}

/// Split `prefix/name` into its parts; the prefix is optional.
pub fn split_prefixed_name(s: &str) -> Result<(Option<&str>, &str), PrefixedNameError> {
    let (prefix, name) = match s.matches('/').count() {
        0 => (None, s),
        1 => {
            let (prefix, name) = s.split_once('/').unwrap_or_default();
            (Some(prefix).filter(|p| !p.is_empty()), name)
        }
        n => return Err(PrefixedNameError::TooManySlashes(n)),
    };
    if name.is_empty() {
        return Err(PrefixedNameError::EmptyName);
    }
    Ok((prefix, name))
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct TestOpts {
        name: Option<String>,
        size: Option<Quantity>,
        bootorder: Option<u32>,
    }

    impl FromParams for TestOpts {
        const SUPPORTED: &'static [(&'static str, &'static str)] =
            &[("name", "string"), ("size", "resource.Quantity"), ("bootorder", "uint")];

        fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
            Ok(Self {
                name: params.take("name"),
                size: params.take_quantity("size")?,
                bootorder: params.take_uint("bootorder")?,
            })
        }
    }

    #[test]
    fn test_map() {
        let opts: TestOpts = map("test", "name:my-name,Size:10Gi,bootorder:2").unwrap();
        assert_eq!(
            opts,
            TestOpts {
                name: Some("my-name".into()),
                size: Some("10Gi".parse().unwrap()),
                bootorder: Some(2),
            }
        );

        let opts: TestOpts = map("test", "name:x").unwrap();
        assert_eq!(opts.size, None);
        assert_eq!(opts.bootorder, None);
    }

    #[test]
    fn test_value_keeps_colons() {
        let mut params = Params::parse("src:my.registry/my-image:my-tag").unwrap();
        assert_eq!(params.take("src").as_deref(), Some("my.registry/my-image:my-tag"));
        params.finish().unwrap();
    }

    #[test]
    fn test_map_errors() {
        let cases = [
            ("", "params may not be empty"),
            ("test=test", "params need to have at least one colon: test=test"),
            ("test:test", "unknown param(s): test:test"),
            ("name:a,NAME:b", "param \"name\" was specified multiple times"),
            (
                "bootorder:first",
                "failed to parse param \"bootorder\": invalid digit found in string",
            ),
            (
                "size:10Gu",
                "failed to parse param \"size\": unable to parse quantity's suffix",
            ),
        ];
        for (value, expected) in cases {
            let err = map::<TestOpts>("test", value).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("failed to parse \"--test\" flag: {expected}")
            );
        }
    }

    #[test]
    fn test_unknown_params_keep_order() {
        let err = map::<TestOpts>("test", "b:1,name:x,a:2").unwrap_err();
        assert_eq!(err.message, "unknown param(s): b:1,a:2");
    }

    #[test]
    fn test_supported() {
        assert_eq!(
            supported::<TestOpts>(),
            "name:string,size:resource.Quantity,bootorder:uint"
        );
    }

    #[test]
    fn test_get_param_by_name() {
        assert_eq!(get_param_by_name("type", "type:http,url:x").unwrap(), "http");
        assert_eq!(
            get_param_by_name("type", "url:x"),
            Err(ParamsError::NotFound("type".into()))
        );
        assert_eq!(get_param_by_name("type", ""), Err(ParamsError::Empty));
    }

    #[test]
    fn test_split_prefixed_name() {
        assert_eq!(split_prefixed_name("name"), Ok((None, "name")));
        assert_eq!(split_prefixed_name("ns/name"), Ok((Some("ns"), "name")));
        assert_eq!(split_prefixed_name("/name"), Ok((None, "name")));
        assert_eq!(split_prefixed_name(""), Err(PrefixedNameError::EmptyName));
        assert_eq!(split_prefixed_name("ns/"), Err(PrefixedNameError::EmptyName));
        assert_eq!(
            split_prefixed_name("a/b/c"),
            Err(PrefixedNameError::TooManySlashes(2))
        );
        assert_eq!(
            PrefixedNameError::TooManySlashes(2).to_string(),
            "invalid count 2 of slashes in prefix/name"
        );
    }
}
