//! Register / login / logout / profile commands.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use salon_auth::{AuthPhase, ProfileUpdate, SignUpDetails};

use super::{Client, print_state};

pub async fn register(
    email: &str,
    password: &str,
    details: &SignUpDetails,
    config_path: &Path,
) -> Result<()> {
    let client = Client::open(config_path)?;
    let registration = client
        .sync
        .register(email, password, details)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    debug!("registered user id {}", registration.user_id);
    println!("{}", registration.message);
    Ok(())
}

pub async fn login(email: &str, password: &str, config_path: &Path) -> Result<()> {
    let mut client = Client::open(config_path)?;
    client.start().await?;

    client
        .sync
        .login(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let state = client
        .settle(|state| {
            let signed_in = state.current_user.as_ref().is_some_and(|u| u.email == email);
            signed_in && state.phase != AuthPhase::Resolving
        })
        .await?;
    client.sync.shutdown();

    print_state(&state);
    if state.phase == AuthPhase::Error {
        anyhow::bail!("signed in, but the profile could not be loaded");
    }
    Ok(())
}

pub async fn logout(config_path: &Path) -> Result<()> {
    let mut client = Client::open(config_path)?;
    client.start().await?;

    if !client.sync.state().is_signed_in() {
        println!("Not signed in.");
        return Ok(());
    }

    let next = client.sync.logout().await;
    client.settle(|state| state.current_user.is_none()).await?;
    client.sync.shutdown();

    println!("Logged out. Continue at {}.", next);
    Ok(())
}

pub async fn update_profile(update: &ProfileUpdate, config_path: &Path) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --first-name, --last-name or --phone.");
    }

    let client = Client::open(config_path)?;
    client.start().await?;
    client.sync.update_profile(update).await?;
    client.sync.shutdown();

    print_state(&client.sync.state());
    Ok(())
}
