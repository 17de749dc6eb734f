//! Deep-link handoff to an external wallet application
//!
//! Opens the wallet deep link and watches host visibility to decide whether
//! the handoff took. If the host is still foregrounded after a short
//! timeout, the universal fallback link is opened; after a second, longer
//! timeout with no detected handoff the install prompt is offered. A
//! detected handoff cancels both pending prompts.

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::host::HostShell;

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// Host backgrounded: the wallet app took over
    Detected,
    /// No handoff observed; the user was offered the install link
    InstallPrompted { accepted: bool },
}

/// Drive one deep-link handoff attempt to detection or the install prompt
pub async fn run(
    shell: &dyn HostShell,
    config: &TrackerConfig,
    deep_link: &str,
    fallback_link: &str,
    install_link: &str,
) -> TrackerResult<HandoffOutcome> {
    let mut visibility = shell.visibility();

    shell.open_url(deep_link)?;
    debug!("Opened wallet deep link {}", deep_link);

    let fallback_at = sleep(Duration::from_millis(config.handoff_fallback_ms));
    let install_at = sleep(Duration::from_millis(config.handoff_install_ms));
    tokio::pin!(fallback_at, install_at);
    let mut fallback_done = false;
    let mut visibility_open = true;

    loop {
        tokio::select! {
            changed = visibility.changed(), if visibility_open => {
                match changed {
                    Ok(()) if *visibility.borrow() => {
                        info!("Wallet handoff detected");
                        return Ok(HandoffOutcome::Detected);
                    }
                    Ok(()) => {} // returned to foreground, keep waiting
                    Err(_) => {
                        // host cannot report visibility; timeouts decide
                        visibility_open = false;
                    }
                }
            }
            _ = &mut fallback_at, if !fallback_done => {
                fallback_done = true;
                debug!("No handoff yet, opening universal link {}", fallback_link);
                shell.open_url(fallback_link)?;
            }
            _ = &mut install_at => {
                let accepted = shell
                    .confirm(
                        "Wallet not found",
                        "It looks like the wallet app is not installed. Install it?",
                    )
                    .await;
                if accepted {
                    shell.open_url(install_link)?;
                }
                return Ok(HandoffOutcome::InstallPrompted { accepted });
            }
        }
    }
}
