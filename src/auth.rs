//! OAuth2 authentication management for the Gmail API

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use std::path::Path;

use crate::error::{ReportError, Result};

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub =
    Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>;

/// Authenticate and initialize the Gmail API hub with OAuth2.
///
/// Loads the persisted token when present; otherwise the installed-app flow
/// opens a browser consent page with a transient local callback listener, and
/// the resulting token is persisted next to the configured cache path.
///
/// If the authorization server rejects the token request outright (a revoked
/// or corrupt cached token rather than a refreshable expiry), the token file
/// is deleted and the whole procedure is retried exactly once. Other failures
/// (unreadable credentials, TLS setup) never touch the cache.
///
/// # Arguments
/// * `credentials_path` - Path to the OAuth2 client secret JSON file
/// * `token_cache_path` - Path where access tokens will be cached
/// * `scopes` - OAuth2 scopes to pre-authorize the token for
pub async fn initialize_gmail_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
    scopes: &[String],
) -> Result<GmailHub> {
    match build_hub(credentials_path, token_cache_path, scopes).await {
        Ok(hub) => Ok(hub),
        Err(e @ ReportError::TokenRejected(_)) if token_cache_path.exists() => {
            tracing::warn!(
                "Cached token rejected ({}); removing {:?} and re-authorizing",
                e,
                token_cache_path
            );
            tokio::fs::remove_file(token_cache_path).await?;
            build_hub(credentials_path, token_cache_path, scopes).await
        }
        Err(e) => Err(e),
    }
}

async fn build_hub(
    credentials_path: &Path,
    token_cache_path: &Path,
    scopes: &[String],
) -> Result<GmailHub> {
    // Read OAuth2 credentials
    let secret = yup_oauth2::read_application_secret(credentials_path)
        .await
        .map_err(|e| ReportError::AuthError(format!("Failed to read credentials: {}", e)))?;

    // Build authenticator with token persistence
    // HTTPRedirect opens a browser for user authorization
    let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
        secret,
        yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_cache_path)
    .build()
    .await
    .map_err(|e| ReportError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    // Pre-authenticate with the configured scopes so the cached token carries
    // them before any API call is issued
    let _token = auth
        .token(scopes)
        .await
        .map_err(|e| ReportError::TokenRejected(format!("Failed to obtain token: {}", e)))?;

    // Configure HTTP client with TLS
    // HTTP/1 for compatibility with google-gmail1
    let client = hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
        .build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| {
                    ReportError::AuthError(format!("Failed to load TLS roots: {}", e))
                })?
                .https_or_http()
                .enable_http1()
                .build(),
        );

    Ok(Gmail::new(client, auth))
}

/// Secure token file permissions on Unix systems
///
/// Sets file permissions to 0600 (read/write for owner only)
/// to prevent unauthorized access to OAuth2 tokens
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600); // Read/write for owner only
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Secure token file on Windows (stub implementation)
///
/// Windows uses ACLs instead of Unix permissions
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_secure_token_file() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "test content")
            .await
            .unwrap();

        secure_token_file(temp_file.path()).await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = tokio::fs::metadata(temp_file.path()).await.unwrap();
            let perms = metadata.permissions();
            assert_eq!(perms.mode() & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = initialize_gmail_hub(
            &dir.path().join("does-not-exist.json"),
            &dir.path().join("token.json"),
            &["https://www.googleapis.com/auth/gmail.modify".to_string()],
        )
        .await;

        match result {
            Err(ReportError::AuthError(msg)) => {
                assert!(msg.contains("Failed to read credentials"))
            }
            other => panic!("expected AuthError, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_credentials_failure_preserves_token_cache() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token.json");
        tokio::fs::write(&token_path, "[]").await.unwrap();

        let result = initialize_gmail_hub(
            &dir.path().join("does-not-exist.json"),
            &token_path,
            &["https://www.googleapis.com/auth/gmail.modify".to_string()],
        )
        .await;

        assert!(matches!(result, Err(ReportError::AuthError(_))));
        // A failure unrelated to the token must not discard it
        assert!(token_path.exists());
    }
}
