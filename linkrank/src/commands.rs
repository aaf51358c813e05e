use clap::{ArgAction, arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

const REPORT_FORMATS: [&str; 5] = ["text", "json", "csv", "markdown", "md"];

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkrank")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkrank")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and progress output").required(false))
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug)")
                .required(false)
                .action(ArgAction::Count),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl outward from a start URL, write the discovered link graph as an edge \
                list, and rank the pages with PageRank.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to start crawling from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth to follow from the start page (0 = start page only)")
                        .value_parser(clap::value_parser!(u32))
                        .default_value("2"),
                )
                .arg(
                    arg!(-m --"max-links" <NUM>)
                        .required(false)
                        .help("Maximum number of links taken from any single page")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-page fetch timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("5"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Where to write the discovered edge list")
                        .default_value("graph.txt"),
                )
                .arg(
                    arg!(--"live")
                        .required(false)
                        .help("Print every discovered link as it is found instead of a spinner")
                        .action(ArgAction::SetTrue),
                )
                .arg(top_arg())
                .arg(format_arg())
                .arg(report_arg()),
        )
        .subcommand(
            command!("rank")
                .about("Rank the pages of an existing edge list with PageRank")
                .arg(
                    arg!(<PATH>)
                        .required(true)
                        .help("Edge list file, one `source -> target` per line"),
                )
                .arg(top_arg())
                .arg(format_arg())
                .arg(report_arg()),
        )
}

fn top_arg() -> clap::Arg {
    arg!(-n --"top" <N>)
        .required(false)
        .help("Number of top-ranked pages to show")
        .value_parser(clap::value_parser!(usize))
        .default_value("10")
}

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json, csv, markdown")
        .value_parser(REPORT_FORMATS)
        .default_value("text")
}

fn report_arg() -> clap::Arg {
    arg!(-r --"report" <PATH>)
        .required(false)
        .help("Save the report to a file (default: display to screen)")
}
