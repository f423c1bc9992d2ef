use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use gleaner_core::config::{ConfigOverrides, GleanerConfig, expand_path};
use gleaner_core::crawl::execute_crawl;
use gleaner_core::report::{ReportFormat, generate_report, save_report};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::Level;
use url::Url;

/// Parse the start URL, trying to add https:// if needed
pub fn parse_start_url(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(input)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(url.to_string());
    }

    let with_scheme = format!("https://{}", input);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some_and(|h| h.contains('.') || h == "localhost") => Some(url.to_string()),
        _ => None,
    }
}

/// Collect the crawl flags that override config file values
pub fn config_overrides(sub_matches: &ArgMatches) -> ConfigOverrides {
    ConfigOverrides {
        max_depth: sub_matches.get_one::<usize>("max-depth").copied(),
        max_pages: sub_matches.get_one::<usize>("max-pages").copied(),
        concurrent_fetches: sub_matches.get_one::<usize>("concurrency").copied(),
        request_delay_ms: sub_matches.get_one::<u64>("delay").copied(),
        timeout_secs: sub_matches.get_one::<u64>("timeout").copied(),
    }
}

/// Load the config named by `--config` and apply command-line overrides
pub fn resolve_config(sub_matches: &ArgMatches) -> Result<GleanerConfig> {
    let path = sub_matches
        .get_one::<String>("config")
        .map(|p| expand_path(p))
        .context("No config path given")?;
    let mut config = GleanerConfig::load(&path)?;
    config.apply(&config_overrides(sub_matches));
    config.validate()?;
    Ok(config)
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  GLEANER INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_path = args
        .get_one::<String>("PATH")
        .map(|p| expand_path(p))
        .context("No config path given")?;
    let force = args.get_flag("force");

    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A config file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Overwrite it with the defaults? [y/N]:")?;
        if response != "y" && response != "yes" {
            println!("\n{}", "Initialization cancelled.".yellow());
            return Ok(());
        }
    }

    GleanerConfig::default().save(&config_path)?;

    println!();
    print_divider();
    println!("{} {}", "✓".green().bold(), "Gleaner initialization complete!".bright_white().bold());
    println!(
        "{} Config file: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    print_divider();
    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    init_tracing(sub_matches.get_flag("verbose"));

    let raw_url = sub_matches
        .get_one::<String>("url")
        .context("--url is required")?;
    let Some(url) = parse_start_url(raw_url) else {
        bail!("Invalid start URL '{}'", raw_url);
    };
    let config = resolve_config(sub_matches)?;
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let output = sub_matches.get_one::<PathBuf>("output");

    if !quiet {
        let host = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.clone());
        println!("\n{} {}", "Crawling".bright_white().bold(), host.bright_cyan());
        println!("Max pages:   {}", config.max_pages);
        println!(
            "Max depth:   {}",
            config
                .max_depth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "auto".to_string())
        );
        println!("Concurrency: {}", config.concurrent_fetches);
        println!("Delay:       {} ms\n", config.request_delay_ms);
    }

    let crawl = execute_crawl(&url, &config, !quiet).await?;

    if let Some(path) = output {
        colored::control::set_override(false);
        let report = generate_report(&crawl, format)?;
        save_report(&report, path).with_context(|| format!("Failed to write report to {}", path.display()))?;
        colored::control::unset_override();
        if !quiet {
            println!("\n{} Report saved to {}", "✓".green().bold(), path.display());
        }
    } else {
        let report = generate_report(&crawl, format)?;
        print!("{}", report);
    }

    Ok(())
}
