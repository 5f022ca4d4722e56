//! Keyword arguments passed to environment constructors.
use crate::error::GymDmcError;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

/// A keyword argument value.
pub use serde_yaml::Value as KwValue;

/// Keyword arguments of an environment constructor.
pub type Kwargs = BTreeMap<String, KwValue>;

/// Builds [`Kwargs`] from `key => value` pairs.
///
/// ```
/// use gym_dmc_core::kwargs;
///
/// let kwargs = kwargs! {"frame_skip" => 4, "from_pixels" => true};
/// assert_eq!(kwargs.len(), 2);
/// ```
#[macro_export]
macro_rules! kwargs {
    () => {
        $crate::Kwargs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut kwargs = $crate::Kwargs::new();
        $(
            kwargs.insert(($key).to_string(), $crate::KwValue::from($value));
        )+
        kwargs
    }};
}

/// Returns `defaults` updated with `overrides`; overrides win on key collision.
pub fn merge_kwargs(defaults: &Kwargs, overrides: &Kwargs) -> Kwargs {
    let mut kwargs = defaults.clone();
    kwargs.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    kwargs
}

/// Removes `key` from `kwargs` and deserializes its value.
pub fn take_kwarg<T: DeserializeOwned>(kwargs: &mut Kwargs, key: &str) -> Result<Option<T>> {
    match kwargs.remove(key) {
        None => Ok(None),
        Some(v) => serde_yaml::from_value(v).map(Some).map_err(|e| {
            GymDmcError::InvalidConfig(format!("invalid value for `{}`: {}", key, e)).into()
        }),
    }
}

/// Deserializes a configuration struct from keyword arguments.
pub fn kwargs_to_config<T: DeserializeOwned>(kwargs: &Kwargs) -> Result<T> {
    let mapping = kwargs
        .iter()
        .map(|(k, v)| (KwValue::from(k.as_str()), v.clone()))
        .collect::<serde_yaml::Mapping>();
    serde_yaml::from_value(KwValue::Mapping(mapping))
        .map_err(|e| GymDmcError::InvalidConfig(e.to_string()).into())
}

/// Serializes a configuration struct into keyword arguments.
pub fn kwargs_from_config<T: Serialize>(config: &T) -> Result<Kwargs> {
    match serde_yaml::to_value(config)? {
        KwValue::Mapping(mapping) => mapping
            .into_iter()
            .map(|(k, v)| match k {
                KwValue::String(k) => Ok((k, v)),
                k => Err(anyhow::Error::from(GymDmcError::InvalidConfig(format!(
                    "non-string key {:?}",
                    k
                )))),
            })
            .collect(),
        v => Err(GymDmcError::InvalidConfig(format!("expected a mapping, got {:?}", v)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Config {
        frame_skip: usize,
        #[serde(default)]
        from_pixels: bool,
    }

    #[test]
    fn test_merge_overrides_win() {
        let defaults = crate::kwargs! {"frame_skip" => 1, "width" => 84};
        let overrides = crate::kwargs! {"frame_skip" => 4};
        let merged = merge_kwargs(&defaults, &overrides);
        assert_eq!(merged.get("frame_skip"), Some(&KwValue::from(4)));
        assert_eq!(merged.get("width"), Some(&KwValue::from(84)));
    }

    #[test]
    fn test_take_kwarg() -> Result<()> {
        let mut kwargs = crate::kwargs! {"episode_frames" => 1000, "flatten_obs" => false};
        let frames: Option<f64> = take_kwarg(&mut kwargs, "episode_frames")?;
        assert_eq!(frames, Some(1000.0));
        let missing: Option<bool> = take_kwarg(&mut kwargs, "from_pixels")?;
        assert_eq!(missing, None);
        assert!(take_kwarg::<usize>(&mut kwargs, "flatten_obs").is_err());
        assert!(kwargs.is_empty());
        Ok(())
    }

    #[test]
    fn test_config_round_trip() -> Result<()> {
        let config: Config = kwargs_to_config(&crate::kwargs! {"frame_skip" => 8})?;
        assert_eq!(
            config,
            Config {
                frame_skip: 8,
                from_pixels: false
            }
        );
        let kwargs = kwargs_from_config(&config)?;
        assert_eq!(kwargs.get("from_pixels"), Some(&KwValue::from(false)));

        let err = kwargs_to_config::<Config>(&crate::kwargs! {"frame_skip" => 1, "fps" => 2})
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GymDmcError>(),
            Some(GymDmcError::InvalidConfig(_))
        ));
        Ok(())
    }
}
