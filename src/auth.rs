use std::fmt;
use std::process::Command;

use log::{debug, info};

use crate::error::{CiTimesError, Result};

const GH_PROGRAM: &str = "gh";

/// GitHub API token.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Resolves the token used for every API request.
///
/// An explicit token (from `--token`, `GITHUB_TOKEN` or the config file) wins.
/// Otherwise the token of the authenticated GitHub CLI session is used.
///
/// # Errors
///
/// Returns [`CiTimesError::Credential`] if no explicit token is given and the
/// GitHub CLI is missing, not logged in, or prints an empty token.
pub fn resolve_token(explicit: Option<&str>) -> Result<Token> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        info!("Using token from GITHUB_TOKEN / configuration");
        return Ok(Token::from(token));
    }

    token_from_cli(GH_PROGRAM)
}

fn token_from_cli(program: &str) -> Result<Token> {
    let version = run(program, &["--version"]).map_err(|e| {
        CiTimesError::Credential(format!(
            "the GitHub CLI is not found or not working ({e}). \
             Install it from https://cli.github.com/ and run `gh auth login`"
        ))
    })?;
    debug!("Found gh CLI: {}", version.lines().next().unwrap_or_default());

    let token = run(program, &["auth", "token"]).map_err(|e| {
        CiTimesError::Credential(format!(
            "failed to get a token from the GitHub CLI ({e}). Authenticate with `gh auth login`"
        ))
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(CiTimesError::Credential(
            "`gh auth token` returned an empty result. Authenticate with `gh auth login`"
                .to_string(),
        ));
    }

    info!("Retrieved a token from the GitHub CLI");
    Ok(Token::from(token))
}

/// Runs `program` and returns its stdout, or a description of why it failed.
fn run(program: &str, args: &[&str]) -> std::result::Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| e.to_string())?;

    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_wins() {
        let token = resolve_token(Some("  ghp_abc  ")).unwrap();
        assert_eq!(token.as_str(), "ghp_abc");
    }

    #[test]
    fn test_missing_cli_is_credential_error() {
        let err = token_from_cli("ci-times-no-such-gh-binary").unwrap_err();
        assert!(matches!(err, CiTimesError::Credential(_)));
        assert!(err.to_string().contains("gh auth login"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = Token::from("ghp_secret");
        assert_eq!(format!("{token:?}"), "Token(***)");
    }
}
