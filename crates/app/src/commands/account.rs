use anyhow::{Context, Result};
use providers::oauth_helper::{fetch_user_profile, OAuthFlow};

use crate::context::AppContext;

pub async fn login(ctx: &AppContext) -> Result<()> {
    let client_id = ctx
        .settings
        .oauth
        .client_id
        .clone()
        .context("no Google OAuth client configured; set GOOGLE_CLIENT_ID or oauth.client_id in settings.json")?;

    let flow = OAuthFlow::google(client_id, ctx.settings.oauth.client_secret.clone())?;
    let grant = flow.authenticate().await.context("Google sign-in failed")?;
    let profile = fetch_user_profile(&grant.access_token)
        .await
        .context("could not load Google profile")?;

    let session = ctx.sessions.login(
        grant.access_token,
        grant.refresh_token,
        grant.expires_in,
        profile,
    )?;
    println!("Signed in as {}", session.profile.display_name());
    Ok(())
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.sessions.logout()?;
    println!("Signed out.");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.sessions.restore() {
        Some(session) => {
            println!("{}", session.profile.display_name());
            if let Some(email) = &session.profile.email {
                println!("{}", email);
            }
            if let Some(at) = session.token.expires_at {
                println!("token expires {}", at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"));
            }
        }
        None => println!("Not signed in."),
    }
    Ok(())
}
