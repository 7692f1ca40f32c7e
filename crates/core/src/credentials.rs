use std::fmt;

use crate::error::{Error, Result};

pub const USER_VAR: &str = "WEMPORTAL_USER";
pub const PASSWORD_VAR: &str = "WEMPORTAL_PASSWORD";
pub const ACCESS_CODE_VAR: &str = "FACHMANN_PASSWORD";

/// Portal login plus the specialist ("Fachmann") access code.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub access_code: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => Err(Error::Config(format!(
                    "environment variable {} is not set",
                    key
                ))),
            }
        };

        Ok(Self {
            user: require(USER_VAR)?,
            password: require(PASSWORD_VAR)?,
            access_code: require(ACCESS_CODE_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("access_code", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_lookup_complete() {
        let vars = env(&[
            (USER_VAR, "installer"),
            (PASSWORD_VAR, "secret"),
            (ACCESS_CODE_VAR, "1234"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.user, "installer");
        assert_eq!(creds.password, "secret");
        assert_eq!(creds.access_code, "1234");
    }

    #[test]
    fn test_missing_variable_is_config_error() {
        let vars = env(&[(USER_VAR, "installer"), (PASSWORD_VAR, "secret")]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains(ACCESS_CODE_VAR)));
    }

    #[test]
    fn test_empty_variable_rejected() {
        let vars = env(&[
            (USER_VAR, ""),
            (PASSWORD_VAR, "secret"),
            (ACCESS_CODE_VAR, "1234"),
        ]);
        assert!(Credentials::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials {
            user: "installer".into(),
            password: "secret".into(),
            access_code: "1234".into(),
        };
        let shown = format!("{:?}", creds);
        assert!(shown.contains("installer"));
        assert!(!shown.contains("secret"));
        assert!(!shown.contains("1234"));
    }
}
