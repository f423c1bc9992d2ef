use colored::Colorize;

pub mod config;
pub mod crawl;
pub mod report;

pub fn print_banner() {
    let banner = r#"
   ____ _
  / ___| | ___  __ _ _ __   ___ _ __
 | |  _| |/ _ \/ _` | '_ \ / _ \ '__|
 | |_| | |  __/ (_| | | | |  __/ |
  \____|_|\___|\__,_|_| |_|\___|_|
"#;
    println!("{}", banner.bright_green().bold());
    println!(
        "  {} {}\n",
        "adaptive treatment-site crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
