//! Google sign-in: authorization-code flow with PKCE over a loopback redirect.

use anyhow::{anyhow, Result};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge, RedirectUrl,
    Scope, TokenResponse, TokenUrl,
};
use shared::types::UserProfile;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

pub const YOUTUBE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/youtube.readonly";

/// Tokens handed back by the token endpoint
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<Duration>,
}

pub struct OAuthFlow {
    client: BasicClient,
    scopes: Vec<String>,
    port: u16,
}

impl OAuthFlow {
    pub fn new(
        client_id: String,
        client_secret: Option<String>,
        auth_url: String,
        token_url: String,
        scopes: Vec<String>,
    ) -> Result<Self> {
        let (listener, port) = bind_callback_listener()?;
        // Re-bound in authenticate(); the port stays free for that short window.
        drop(listener);

        let client = BasicClient::new(
            ClientId::new(client_id),
            client_secret.map(ClientSecret::new),
            AuthUrl::new(auth_url)?,
            Some(TokenUrl::new(token_url)?),
        )
        .set_redirect_uri(RedirectUrl::new(format!(
            "http://localhost:{}/callback",
            port
        ))?);

        Ok(Self {
            client,
            scopes,
            port,
        })
    }

    /// Flow against Google's endpoints asking for read-only YouTube access.
    pub fn google(client_id: String, client_secret: Option<String>) -> Result<Self> {
        Self::new(
            client_id,
            client_secret,
            GOOGLE_AUTH_URL.to_string(),
            GOOGLE_TOKEN_URL.to_string(),
            vec![
                YOUTUBE_READONLY_SCOPE.to_string(),
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
        )
    }

    pub async fn authenticate(&self) -> Result<TokenGrant> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        println!("Opening browser for Google sign-in...");
        println!("If the browser doesn't open automatically, visit:");
        println!("{}", auth_url);

        if let Err(e) = open::that(auth_url.as_str()) {
            warn!("failed to open browser: {}", e);
        }

        let listener = TcpListener::bind(format!("127.0.0.1:{}", self.port))
            .map_err(|e| anyhow!("Could not re-bind OAuth callback port {}: {}", self.port, e))?;
        listener.set_nonblocking(true)?;
        info!("waiting for authorization on port {} (5 min timeout)", self.port);

        let (code, state) = wait_for_callback(listener, CALLBACK_TIMEOUT).await?;

        if state != *csrf_token.secret() {
            return Err(anyhow!("CSRF token mismatch"));
        }

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(async_http_client)
            .await?;

        Ok(TokenGrant {
            access_token: token_result.access_token().secret().clone(),
            refresh_token: token_result.refresh_token().map(|t| t.secret().clone()),
            expires_in: token_result.expires_in(),
        })
    }
}

/// Fetch the signed-in user's Google profile.
pub async fn fetch_user_profile(access_token: &str) -> Result<UserProfile> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let response = client
        .get(USERINFO_URL)
        .bearer_auth(access_token)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("userinfo error: {} - {}", status, body));
    }
    Ok(response.json().await?)
}

/// Try to bind a callback listener on one of several ports.
fn bind_callback_listener() -> Result<(TcpListener, u16)> {
    let ports = [8765, 8766, 8767, 18765, 28765];
    for port in ports {
        if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
            return Ok((listener, port));
        }
    }
    Err(anyhow!("Could not bind OAuth callback listener on any port"))
}

/// Pull `code` and `state` out of the redirect request line.
fn parse_callback_request(request_line: &str) -> Result<(String, String)> {
    let redirect_url = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow!("Invalid request"))?;

    let url = Url::parse(&format!("http://localhost{}", redirect_url))?;

    if let Some((_, error)) = url.query_pairs().find(|(key, _)| key == "error") {
        return Err(anyhow!("Authorization denied: {}", error));
    }

    let code = url
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| anyhow!("No authorization code in callback"))?;

    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.to_string())
        .ok_or_else(|| anyhow!("No state in callback"))?;

    Ok((code, state))
}

/// Accept the redirect on the blocking pool so the runtime keeps running.
async fn wait_for_callback(listener: TcpListener, timeout: Duration) -> Result<(String, String)> {
    tokio::task::spawn_blocking(move || receive_callback(&listener, timeout)).await?
}

fn receive_callback(listener: &TcpListener, timeout: Duration) -> Result<(String, String)> {
    let deadline = std::time::Instant::now() + timeout;

    loop {
        match listener.accept() {
            Ok((mut stream, _)) => {
                stream.set_nonblocking(false)?;
                stream.set_read_timeout(Some(Duration::from_secs(5)))?;

                let mut reader = BufReader::new(&stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line)?;

                let parsed = parse_callback_request(&request_line);

                let response = "HTTP/1.1 200 OK\r\n\
                               Content-Type: text/html\r\n\r\n\
                               <html><body>\
                               <h1>Signed in to FocusTube</h1>\
                               <p>You can close this window and return to the terminal.</p>\
                               </body></html>";
                stream.write_all(response.as_bytes())?;
                stream.flush()?;

                return parsed;
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                if std::time::Instant::now() > deadline {
                    return Err(anyhow!(
                        "OAuth callback timed out after {}s. Please try again.",
                        timeout.as_secs()
                    ));
                }
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(anyhow!("Failed to accept OAuth callback: {}", e)),
        }
    }
}
