//! Development token minting.

use anyhow::Result;
use console::style;
use lawhelp_infra::auth::jwt::sign_hs256;
use secrecy::SecretString;
use serde_json::json;

/// Claims for a token issued at `now` that lives `ttl_secs`.
fn claims_for(subject: &str, now: i64, ttl_secs: u64) -> serde_json::Value {
    let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
    json!({
        "userId": subject,
        "iat": now,
        "exp": now.saturating_add(ttl),
    })
}

/// Sign and print a bearer token for `subject`.
///
/// # Examples
///
/// ```bash
/// lawhelp token issue --subject u1 --ttl-secs 600
/// ```
pub fn issue_token(secret: &SecretString, subject: &str, ttl_secs: u64, json: bool) -> Result<()> {
    let subject = subject.trim();
    anyhow::ensure!(!subject.is_empty(), "subject must not be empty");

    let now = chrono::Utc::now().timestamp();
    let claims = claims_for(subject, now, ttl_secs);
    let token = sign_hs256(secret, &claims)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "token": token,
                "subject": subject,
                "expires_at": claims["exp"],
            }))?
        );
        return Ok(());
    }

    println!("{token}");
    eprintln!(
        "  {} token for {} expires in {}s",
        style("i").blue().bold(),
        style(subject).cyan(),
        ttl_secs
    );
    Ok(())
}
