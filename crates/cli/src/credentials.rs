//! Credentials file loading

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// A GitHub username and the API token used to query it
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub username: String,
    pub token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Example credentials file shown in the usage text
pub const SAMPLE: &str = r#"[
  {
    "username": "your-github-username",
    "token": "your-github-api-token"
  },
  {
    "username": "your-next-github-username",
    "token": "your-next-github-api-token"
  }
]"#;

/// Parse a JSON list of credentials
pub fn parse(bytes: &[u8]) -> Result<Vec<Credential>> {
    serde_json::from_slice(bytes).context("Couldn't parse JSON credentials file")
}

/// Read credentials from `path`, decrypting with `gpg -d` when `encrypted`
pub fn load(path: &Path, encrypted: bool) -> Result<Vec<Credential>> {
    let bytes = if encrypted {
        decrypt(path)?
    } else {
        std::fs::read(path)
            .with_context(|| format!("Couldn't read the credentials file {}", path.display()))?
    };
    parse(&bytes)
}

fn decrypt(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("gpg")
        .arg("-d")
        .arg(path)
        .output()
        .context("Couldn't run gpg to decrypt the credentials file")?;

    if !output.status.success() {
        bail!(
            "Couldn't decrypt the credentials file {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sample_parses() {
        let creds = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[1].username, "your-next-github-username");
    }

    #[test]
    fn loads_plain_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"username": "octocat", "token": "ghp_abc"}}]"#).unwrap();

        let creds = load(file.path(), false).unwrap();

        assert_eq!(
            creds,
            vec![Credential {
                username: "octocat".to_string(),
                token: "ghp_abc".to_string(),
            }]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.json"), false).unwrap_err();
        assert!(err.to_string().contains("Couldn't read the credentials file"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse(b"{\"username\": \"octocat\"}").is_err());
    }

    #[test]
    fn debug_output_hides_token() {
        let cred = Credential {
            username: "octocat".to_string(),
            token: "ghp_secret".to_string(),
        };
        let shown = format!("{:?}", cred);
        assert!(shown.contains("octocat"));
        assert!(!shown.contains("ghp_secret"));
    }
}
