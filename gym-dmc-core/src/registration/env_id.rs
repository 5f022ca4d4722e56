//! Parser of environment ids.
use crate::error::GymDmcError;
use anyhow::Result;

/// Grammar of environment ids, reported in [`GymDmcError::MalformedIdentifier`].
pub const ENV_ID_GRAMMAR: &str =
    r"^(?:(?P<namespace>[\w:-]+)\/)?(?:(?P<name>[\w:.-]+?))(?:-v(?P<version>\d+))?$";

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_namespace_char(c: char) -> bool {
    is_word(c) || c == ':' || c == '-'
}

fn is_name_char(c: char) -> bool {
    is_word(c) || c == ':' || c == '.' || c == '-'
}

fn malformed(id: &str) -> anyhow::Error {
    GymDmcError::MalformedIdentifier {
        id: id.to_string(),
        grammar: ENV_ID_GRAMMAR,
    }
    .into()
}

/// Parses `[namespace/]name[-vVERSION]` into `(namespace, name, version)`.
///
/// The name is matched lazily, so a trailing `-v<digits>` is always taken as
/// the version when something is left for the name.
pub fn parse_env_id(id: &str) -> Result<(Option<String>, String, Option<u64>)> {
    let (namespace, rest) = match id.split_once('/') {
        Some((ns, rest)) => {
            if ns.is_empty() || !ns.chars().all(is_namespace_char) {
                return Err(malformed(id));
            }
            (Some(ns.to_string()), rest)
        }
        None => (None, id),
    };

    let (name, version) = match rest.rfind("-v") {
        Some(pos)
            if pos > 0
                && pos + 2 < rest.len()
                && rest[pos + 2..].chars().all(|c| c.is_ascii_digit()) =>
        {
            let version = rest[pos + 2..].parse::<u64>().map_err(|_| malformed(id))?;
            (&rest[..pos], Some(version))
        }
        _ => (rest, None),
    };

    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(malformed(id));
    }

    Ok((namespace, name.to_string(), version))
}

/// Reconstructs `name[-vVERSION]`.
pub fn canonical_id(name: &str, version: Option<u64>) -> String {
    match version {
        Some(v) => format!("{}-v{}", name, v),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(id: &str) -> Option<GymDmcError> {
        parse_env_id(id)
            .err()
            .and_then(|e| e.downcast_ref::<GymDmcError>().cloned())
    }

    #[test]
    fn test_parse_env_id() -> Result<()> {
        assert_eq!(
            parse_env_id("Walker-walk-v1")?,
            (None, "Walker-walk".to_string(), Some(1))
        );
        assert_eq!(
            parse_env_id("user/Point_mass-easy-v12")?,
            (Some("user".to_string()), "Point_mass-easy".to_string(), Some(12))
        );
        assert_eq!(parse_env_id("Walker")?, (None, "Walker".to_string(), None));
        assert_eq!(
            parse_env_id("a.b:c-v2-v3")?,
            (None, "a.b:c-v2".to_string(), Some(3))
        );
        assert_eq!(
            parse_env_id("Walker-walk-v4294967296")?,
            (None, "Walker-walk".to_string(), Some(4_294_967_296))
        );
        assert_eq!(parse_env_id("-v12")?, (None, "-v12".to_string(), None));
        assert_eq!(
            parse_env_id("Walker-vx")?,
            (None, "Walker-vx".to_string(), None)
        );
        Ok(())
    }

    #[test]
    fn test_malformed_env_id() {
        for id in ["", "a/b/c", "/Walker-v1", "Walker v1", "ns.x/Walker-v1", "Walker-v1/"] {
            match kind(id) {
                Some(GymDmcError::MalformedIdentifier { id: got, .. }) => assert_eq!(got, id),
                other => panic!("{:?} parsed as {:?}", id, other),
            }
        }
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        for id in ["Walker-walk-v1", "Cartpole-swingup-v0", "Ball_in_cup-catch", "x.y-v7"] {
            let (_, name, version) = parse_env_id(id)?;
            assert_eq!(canonical_id(&name, version), id);
        }
        Ok(())
    }
}
