use super::{kv, prompt_password, Context};
use crate::config::Config;
use crate::error::Result;
use crate::notify::Notification;
use crate::progress::with_spinner;

pub async fn login(ctx: &mut Context, name: &str, password: Option<String>) -> Result<Notification> {
    let password = prompt_password(password)?;
    let api = ctx.api()?;
    let user = with_spinner("Logging in...", api.login(name, &password)).await?;
    let greeting = format!(
        "Logged in as {}{}",
        user.name,
        if user.admin { " (admin)" } else { "" }
    );
    ctx.session.login(user);
    ctx.session.persist()?;
    tracing::info!(user = %name, "session stored");
    Ok(Notification::success(greeting))
}

pub fn logout(ctx: &mut Context) -> Result<Notification> {
    ctx.session.logout();
    ctx.session.persist()?;
    Ok(Notification::success("Logged out"))
}

pub async fn create_user(
    ctx: &Context,
    name: &str,
    password: Option<String>,
    occupation: Option<&str>,
) -> Result<Notification> {
    ctx.session.require_token()?;
    let password = prompt_password(password)?;
    let api = ctx.api()?;
    with_spinner("Creating user...", api.create_user(name, &password, occupation)).await?;
    Ok(Notification::success(format!("User {} created", name.trim())))
}

pub fn config(
    ctx: &mut Context,
    set_api_url: Option<String>,
    set_user: Option<String>,
    auto_train: Option<bool>,
    show: bool,
) -> Result<Notification> {
    let mut changed = Vec::new();
    if let Some(url) = set_api_url {
        ctx.config.set_api_url(url)?;
        changed.push("API URL");
    }
    if let Some(user) = set_user {
        ctx.config.user_name = Some(user.trim().to_string()).filter(|u| !u.is_empty());
        changed.push("user name");
    }
    if let Some(value) = auto_train {
        ctx.config.auto_train = value;
        changed.push("auto-train");
    }
    if !changed.is_empty() {
        ctx.config.save()?;
    }

    if show || changed.is_empty() {
        let c = &ctx.config;
        println!("Configuration ({})", Config::config_path()?.display());
        kv("API URL", c.api_url().unwrap_or_else(|_| "(not set)".to_string()));
        kv("User name", c.user_name.as_deref().unwrap_or("(not set)"));
        kv("Auto-train", c.auto_train);
        kv("Timeout", format!("{}s", c.timeout_seconds));
        kv("Report dir", c.report_dir().display());
        kv(
            "Session",
            match ctx.session.user() {
                Some(u) if !u.name.is_empty() => format!("{}{}", u.name, if u.admin { " (admin)" } else { "" }),
                Some(_) => "token".to_string(),
                None => "not logged in".to_string(),
            },
        );
    }
    if changed.is_empty() {
        Ok(Notification::success("Configuration shown"))
    } else {
        Ok(Notification::success(format!("Updated {}", changed.join(", "))))
    }
}
