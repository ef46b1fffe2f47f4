//! whoami / watch commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use super::{Client, print_state};

/// Print the current user and the local mirror.
pub async fn whoami(json_output: bool, config_path: &Path) -> Result<()> {
    let client = Client::open(config_path)?;
    client.start().await?;
    client.sync.shutdown();

    let state = client.sync.state();
    let mirror = client.storage.get_item(&client.config.auth.mirror_key)?;

    if json_output {
        let mirror: serde_json::Value = match mirror {
            Some(raw) => serde_json::from_str(&raw)?,
            None => serde_json::Value::Null,
        };
        let out = serde_json::json!({
            "view": salon_auth::AuthView::from(&state),
            "role": state.role,
            "mirror": mirror,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_state(&state);
    if let Some(raw) = mirror {
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        println!("\n{}:", client.config.auth.mirror_key);
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

/// Follow the session until Ctrl-C, logging every change.
pub async fn watch(config_path: &Path) -> Result<()> {
    let client = Client::open(config_path)?;

    let weak = Arc::downgrade(&client.sync);
    client.sync.subscribe(move || {
        let Some(sync) = weak.upgrade() else { return };
        let state = sync.state();
        info!(
            "state changed: phase={:?} user={} role={}",
            state.phase,
            state
                .current_user
                .as_ref()
                .map(|u| u.email.as_str())
                .unwrap_or("-"),
            state.role.map(|r| r.as_str()).unwrap_or("-"),
        );
    });

    client.start().await?;
    info!("watching session, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    client.sync.shutdown();
    info!("stopped");
    Ok(())
}
