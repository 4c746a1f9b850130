use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("silk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("silk")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about("Crawl a host or collection of hosts and report every resource found.")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to crawl")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("How many links away from the start URL to crawl")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3"),
                )
                .arg(
                    arg!(--"revisit")
                        .required(false)
                        .help("Fetch a page again each time a link to it is found (default: once per crawl)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"auto-follow")
                        .required(false)
                        .help("Follow cross-domain links (default: stay on the same host)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("images")
                .about("Download the images of a site into a directory.")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to start from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"dir" <PATH>)
                        .required(false)
                        .help("Directory to save images into")
                        .default_value("./images"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("How many links away from the start URL to crawl")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(-t --"type" <MIME>)
                        .required(false)
                        .help("Accepted image content type, repeatable (default: image/jpeg, image/png)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("links")
                .about("List the links found on a single page.")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to inspect")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"internal")
                        .required(false)
                        .help("Only list links to the same host")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
}
