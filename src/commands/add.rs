use anyhow::Result;
use owo_colors::OwoColorize;
use sagra_core::config::SagraConfig;
use sagra_core::user::Principal;
use sagra_core::{NewEvent, SagraError};

use super::{load_config, open_store, report};
use crate::utils::tui::create_spinner;

/// Who is submitting: `--as` wins over the configured user.
fn resolve_principal(config: &SagraConfig, as_email: Option<String>) -> Option<Principal> {
    match as_email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
        Some(email) => Some(Principal {
            email,
            name: config.user_name.clone(),
            photo_url: None,
        }),
        None => config.principal(),
    }
}

pub async fn run(draft: NewEvent, as_email: Option<String>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let principal = resolve_principal(&config, as_email);

    if let Some(principal) = &principal
        && let Err(e) = store.register_user(principal).await
    {
        tracing::warn!(email = %principal.email, error = %e, "could not register user");
    }

    let spinner = create_spinner(format!("Adding \"{}\"", draft.title));
    let result = store.add_event(principal.as_ref(), &draft).await;
    spinner.finish_and_clear();

    let event = match result {
        Ok(event) => event,
        Err(e @ SagraError::ValidationFailed(_)) => {
            println!("{}", "Event not added:".red());
            for violation in e.violations() {
                println!("  - {}", violation);
            }
            anyhow::bail!("{} problem(s) with the event", e.violations().len());
        }
        Err(SagraError::AuthenticationRequired) => anyhow::bail!(
            "You must be logged in to add events.\n\n\
            Set user_email in {} or pass --as <email>",
            SagraConfig::config_path()?.display()
        ),
        Err(e) => return Err(report(e)),
    };

    println!("{} {}", "Added".green(), event);
    println!("  id:       {}", event.id.dimmed());
    match event.coordinates {
        Some(c) => println!("  position: {}", c),
        None => println!(
            "  position: {}",
            "location not found on the map, event saved without coordinates".yellow()
        ),
    }

    Ok(())
}
