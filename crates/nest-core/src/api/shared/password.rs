use std::fmt::{self, Debug, Formatter};

use zeroize::Zeroizing;

/// A passphrase that never shows up in debug output and is wiped on drop
#[derive(Default, Clone)]
pub struct Password(Option<Zeroizing<String>>);

impl Password {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_ref().map(|p| p.as_str())
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(password) => write!(f, "Password({})", "*".repeat(password.chars().count())),
            None => write!(f, "Password(None)"),
        }
    }
}

impl From<Option<String>> for Password {
    fn from(password: Option<String>) -> Self {
        Self(password.map(Zeroizing::new))
    }
}

impl From<String> for Password {
    fn from(password: String) -> Self {
        Self(Some(Zeroizing::new(password)))
    }
}

impl From<&str> for Password {
    fn from(password: &str) -> Self {
        password.to_string().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_and_as_str() {
        let password: Password = None.into();
        assert_eq!(password.as_str(), None);
        assert!(!password.is_set());

        let password: Password = "password".into();
        assert_eq!(password.as_str(), Some("password"));
    }

    #[test]
    fn test_debug() {
        let password: Password = None.into();
        assert_eq!(format!("{:?}", password), "Password(None)");

        let password: Password = "pässword".into();
        assert_eq!(format!("{:?}", password), "Password(********)");
    }
}
