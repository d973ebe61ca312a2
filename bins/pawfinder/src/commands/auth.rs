//! Identity commands

use crate::context::{api, Context};
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use pawfinder_api_client::User;
use serde_json::json;

fn print_user(user: &User) {
    println!("  {:<8} {}", "Id:".dimmed(), user.id);
    println!(
        "  {:<8} {}",
        "Email:".dimmed(),
        user.email.as_deref().unwrap_or("-")
    );
}

/// Sign in and show who we are
pub async fn sign_in(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let client = ctx.client()?;
    let session = api(client.auth().sign_in_with_password(email, password).await)?;

    if ctx.is_json() {
        return ctx.print_json(&json!({
            "user": session.user,
            "access_token": session.access_token,
            "expires_at": session.expires_at,
        }));
    }

    output::banner("🔑 Signed In");
    print_user(&session.user);
    if let Some(expiry) = session.expires_at.and_then(|at| DateTime::<Utc>::from_timestamp(at, 0)) {
        println!("  {:<8} {}", "Expires:".dimmed(), expiry.to_rfc3339());
    }
    println!();
    println!(
        "  {} Use {} to inspect this session",
        "→".blue(),
        "--format json".bold()
    );
    println!();
    Ok(())
}

/// Show the user an access token belongs to
pub async fn whoami(ctx: &Context, token: &str) -> Result<()> {
    let client = ctx.client()?;
    let user = api(client.auth().user(token).await)?;

    if ctx.is_json() {
        return ctx.print_json(&user);
    }

    output::banner("👤 Current User");
    print_user(&user);
    println!();
    Ok(())
}

/// Print the federated sign-in URL
pub fn authorize_url(ctx: &Context, provider: &str, redirect_to: Option<&str>) -> Result<()> {
    let client = ctx.client()?;
    let url = api(client.auth().authorize_url(provider, redirect_to))?;

    if ctx.is_json() {
        return ctx.print_json(&json!({ "provider": provider, "url": url }));
    }
    println!("{url}");
    Ok(())
}
