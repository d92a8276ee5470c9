//! `ghdocs config`: configuration management commands.

use ghdocs_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_token() {
                warnings.push(
                    "No GitHub token set (set GHDOCS_GITHUB_TOKEN, GITHUB_TOKEN or GH_TOKEN); \
                     unauthenticated requests are limited to 60 per hour",
                );
            }

            if config.fetch.max_retries == 0 {
                warnings.push("fetch.max_retries is 0; transient failures will not be retried");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   API:          {}", config.github.api_url);
            println!("   Raw content:  {}", config.github.raw_url);
            println!("   Concurrency:  {}", config.fetch.concurrency);
            println!("   Retries:      {}", config.fetch.max_retries);
            match config.fetch.deadline_secs {
                Some(secs) => println!("   Deadline:     {secs}s"),
                None => println!("   Deadline:     none"),
            }
            println!(
                "   Exclusions:   {} extra",
                config.classifier.extra_exclusions.len()
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", redacted_toml(&config)?);
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

/// The config as TOML with the token masked.
fn redacted_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.github.token.is_some() {
        shown.github.token = Some("***".into());
    }
    toml::to_string_pretty(&shown)
}
