//! Auth command implementation.
//!
//! Manage the saved account used to open archives.

use anyhow::Result;
use console::style;

use qlab_hal::{AccountStore, EnvCredentialSource};

/// Execute the auth login subcommand.
///
/// Reads the token from `QLAB_TOKEN`/`TOKEN` (process environment first,
/// then `.env`) and saves it as the account.
pub fn execute_login(overwrite: bool) -> Result<()> {
    let store = AccountStore::default_location()?;
    let creds = EnvCredentialSource::default().load()?.ok_or_else(|| {
        anyhow::anyhow!("No token found. Set QLAB_TOKEN or add TOKEN=... to .env")
    })?;
    creds.validate()?;

    store.save(&creds, overwrite)?;

    println!("{} Account saved", style("✓").green().bold());
    println!("  Token:    {}", style(mask(&creds.token)).yellow());
    if let Some(instance) = &creds.instance {
        println!("  Instance: {instance}");
    }
    println!("  Channel:  {}", creds.channel);
    println!("  File:     {}", style(store.path().display()).dim());

    Ok(())
}

/// Execute the auth status subcommand.
pub fn execute_status() -> Result<()> {
    let store = AccountStore::default_location()?;

    println!("{} Authentication status:\n", style("→").cyan().bold());

    match store.load() {
        Ok(Some(creds)) => println!(
            "  {}: {} ({})",
            style("Saved account").bold(),
            style("present").green(),
            mask(&creds.token)
        ),
        Ok(None) => println!(
            "  {}: {}",
            style("Saved account").bold(),
            style("none").red()
        ),
        Err(e) => println!(
            "  {}: {} ({e})",
            style("Saved account").bold(),
            style("unreadable").red()
        ),
    }

    let env = EnvCredentialSource::default().load()?;
    println!(
        "  {}: {}",
        style("Environment").bold(),
        match &env {
            Some(creds) => style(format!("token set ({})", mask(&creds.token))).green(),
            None => style("no token".to_string()).red(),
        }
    );

    if !store.exists() && env.is_none() {
        println!(
            "\n  Run {} after setting QLAB_TOKEN.",
            style("qlab auth login").dim()
        );
    }

    Ok(())
}

/// Execute the auth logout subcommand.
pub fn execute_logout() -> Result<()> {
    let store = AccountStore::default_location()?;

    if store.clear()? {
        println!(
            "{} Removed {}",
            style("✓").green().bold(),
            store.path().display()
        );
    } else {
        println!("  No saved account.");
    }

    Ok(())
}

/// Show the last four characters of a token.
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
