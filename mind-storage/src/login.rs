use anyhow::{bail, Context, Result};
use supabase::{OAuthProvider, User};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::MindConfig;
use crate::gateway::AuthGateway;
use crate::validation::Credentials;

/// E-mail/password sign-in from the shell. The password is read without echo.
pub async fn run_password_login<G: AuthGateway + ?Sized>(gateway: &G, email: &str) -> Result<User> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let credentials = Credentials::validate(email, &password)?;
    let user = gateway
        .sign_in(&credentials)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    Ok(user)
}

/// Browser sign-in:
/// 1. Build the provider URL with a PKCE challenge and a localhost redirect
/// 2. Open it in the system browser
/// 3. Wait for the browser to call back with ?code=<value>
/// 4. Redeem the code for a session
pub async fn run_oauth_login<G: AuthGateway + ?Sized>(
    gateway: &G,
    provider: OAuthProvider,
    config: &MindConfig,
) -> Result<User> {
    let request = gateway
        .oauth_request(provider, &config.oauth_redirect_url())
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("Opening browser for {} login...", provider);
    println!("If the browser doesn't open, visit:\n  {}\n", request.url);
    open_browser(&request.url);

    println!(
        "Waiting for browser callback on port {}...",
        config.oauth_callback_port
    );
    let code = wait_for_code(config.oauth_callback_port).await?;

    gateway
        .complete_oauth(&code, &request.code_verifier)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
}

/// Open a URL in the system default browser.
pub fn open_browser(url: &str) {
    #[cfg(target_os = "linux")]
    let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    #[cfg(target_os = "macos")]
    let _ = std::process::Command::new("open").arg(url).spawn();
    #[cfg(target_os = "windows")]
    let _ = std::process::Command::new("cmd")
        .args(["/c", "start", url])
        .spawn();
}

/// Accept one request to /callback on localhost and return its `code`.
pub async fn wait_for_code(port: u16) -> Result<String> {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind to port {}", port))?;

    let (mut stream, _) = listener
        .accept()
        .await
        .context("Failed to accept connection")?;

    let mut buf = vec![0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .context("Failed to read from socket")?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let outcome = parse_callback(&request);
    let body = match &outcome {
        Ok(_) => "<h2>Login successful!</h2><p>You can close this tab and return to mind storage.</p>",
        Err(_) => "<h2>Login failed</h2><p>Return to mind storage and try again.</p>",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body>{}</body></html>",
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write response")?;

    outcome
}

/// Pull `code` out of e.g. "GET /callback?code=abc-123 HTTP/1.1". A provider
/// error in the query is returned as the failure.
fn parse_callback(request: &str) -> Result<String> {
    let line = request.lines().next().unwrap_or_default();
    let path = line.split_whitespace().nth(1).unwrap_or_default();
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();

    let param = |name: &str| {
        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| {
                urlencoding::decode(&value.replace('+', " "))
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
        })
    };

    if let Some(code) = param("code").filter(|c| !c.is_empty()) {
        return Ok(code);
    }
    match param("error_description").or_else(|| param("error")) {
        Some(reason) => bail!("Login was rejected: {}", reason),
        None => bail!("Callback did not contain a code. Login may have failed."),
    }
}
