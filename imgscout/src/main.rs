use imgscout::commands::command_argument_builder;
use imgscout::handlers::{handle_albums, handle_scrape};

#[tokio::main]
async fn main() {
    // Logs go to stderr so a --json summary on stdout stays parseable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let chosen_command = command_argument_builder().get_matches();

    match chosen_command.subcommand() {
        Some(("scrape", sub_matches)) => handle_scrape(sub_matches).await,
        Some(("albums", sub_matches)) => handle_albums(sub_matches).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
