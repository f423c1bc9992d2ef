use crate::CLAP_STYLING;
use clap::{arg, command};
use gleaner_core::config::DEFAULT_CONFIG_PATH;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("gleaner")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("gleaner")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes the default gleaner configuration to your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the config file")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f --"force")
                        .help("Overwrite an existing config file without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Adaptively crawl a treatment-program website, following the links most \
                likely to carry program, clinical and admissions content.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The start page of the site to crawl"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Fix the crawl depth (1-4) instead of letting the planner choose")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-p --"max-pages" <NUM>)
                        .required(false)
                        .help("Maximum number of pages to fetch, start page included")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM>)
                        .required(false)
                        .help("Number of pages fetched per batch")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"delay" <MS>)
                        .required(false)
                        .help("Delay in milliseconds before every request")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"timeout" <SECS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"config" <PATH>)
                        .required(false)
                        .help("Config file to load")
                        .default_value(DEFAULT_CONFIG_PATH),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Log per-page crawl decisions")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
