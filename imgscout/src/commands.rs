use clap::{arg, command};
use imgscout_core::album::DEFAULT_BASE_URL;
use url::Url;

pub const DEFAULT_URL_LIST: &str = "./urls.txt";
pub const DEFAULT_DEST: &str = "../images";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("imgscout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("imgscout")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress progress output and the end-of-run summary")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"json" "Print the end-of-run summary as JSON")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Per-request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("30")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("scrape")
                .about("Download every <img> found on each page of a URL list")
                .arg(
                    arg!(--"URLlist" <FILE>)
                        .required(false)
                        .help("File containing the URL list, one per line")
                        .default_value(DEFAULT_URL_LIST),
                )
                .arg(
                    arg!(--"nc" "Do not convert images to grayscale")
                        .required(false)
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"dest" <DIR>)
                        .required(false)
                        .help("Destination directory for downloaded images")
                        .default_value(DEFAULT_DEST),
                ),
        )
        .subcommand(
            command!("albums")
                .about(
                    "Crawl a nested album site breadth-first and download every album's \
                images into a matching folder tree",
                )
                .arg(
                    arg!(--"base_url" <URL>)
                        .required(false)
                        .help("Category page listing the root albums")
                        .value_parser(clap::value_parser!(Url))
                        .default_value(DEFAULT_BASE_URL),
                )
                .arg(
                    arg!(--"dest" <DIR>)
                        .required(false)
                        .help("Destination directory for downloaded images")
                        .default_value(DEFAULT_DEST),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("How many levels of sub-albums to descend into")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2"),
                ),
        )
}
