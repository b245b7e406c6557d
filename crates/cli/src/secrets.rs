//! Loading of secret values (listing token, AI API key).

use anyhow::{Context, Result, bail};
use std::path::Path;

/// Where a secret comes from. A file takes precedence over an inline value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    /// Used in error messages
    pub name: &'a str,
    pub value: &'a str,
    pub file: Option<&'a Path>,
}

/// Resolve the secret, trimmed. An empty result is an error.
pub fn load_secret(source: SecretSource<'_>) -> Result<String> {
    let name = match source.name.trim() {
        "" => "secret",
        name => name,
    };

    let file = source.file.filter(|f| !f.as_os_str().is_empty());
    let raw = match file {
        Some(file) => std::fs::read_to_string(file)
            .with_context(|| format!("reading {name} from file {:?}", file.display().to_string()))?,
        None => source.value.to_string(),
    };

    let secret = raw.trim();
    if secret.is_empty() {
        match file {
            Some(file) => bail!("{name} file {:?} is empty", file.display().to_string()),
            None => bail!("{name} is not configured"),
        }
    }
    Ok(secret.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_wins_over_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  from-file\n").unwrap();

        let secret = load_secret(SecretSource {
            name: "token",
            value: "inline",
            file: Some(&path),
        })
        .unwrap();
        assert_eq!(secret, "from-file");
    }

    #[test]
    fn test_inline_value() {
        let secret = load_secret(SecretSource {
            name: "token",
            value: " inline ",
            file: None,
        })
        .unwrap();
        assert_eq!(secret, "inline");
    }

    #[test]
    fn test_empty_secrets_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "\n").unwrap();

        let err = load_secret(SecretSource {
            name: "token",
            value: "",
            file: Some(&path),
        })
        .unwrap_err();
        assert!(err.to_string().contains("is empty"));

        let err = load_secret(SecretSource::default()).unwrap_err();
        assert_eq!(err.to_string(), "secret is not configured");
    }

    #[test]
    fn test_missing_file() {
        let err = load_secret(SecretSource {
            name: "token",
            value: "",
            file: Some(Path::new("/nonexistent/token")),
        })
        .unwrap_err();
        assert!(err.to_string().contains("reading token from file"));
    }
}
