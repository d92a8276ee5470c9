//! `ghdocs doctor`: diagnose configuration and connectivity.

use ghdocs_config::AppConfig;
use ghdocs_core::RepositorySource;
use ghdocs_github::GitHubClient;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 ghdocs doctor");
    println!("================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file, using defaults");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running other checks.");
            return Ok(());
        }
    };

    if config.has_token() {
        println!("  ✅ GitHub token configured");
    } else {
        println!("  ⚠️  No GitHub token: requests are limited to 60 per hour");
        issues += 1;
    }

    match GitHubClient::from_config(&config.github) {
        Ok(client) => match client.health_check().await {
            Ok(true) => println!("  ✅ GitHub API reachable at {}", config.github.api_url),
            Ok(false) => {
                println!("  ❌ GitHub API at {} rejected the request", config.github.api_url);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ GitHub API unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Could not build the GitHub client: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
