use clap::{Arg, ArgAction, Command};
use std::path::Path;

use cnisTimeHelper::{
    export_csv, format_report, init_logging_infrastructure, level_from_verbosity,
    process_document, to_json, validate_file_names, ResultExt, Vocabulary,
};

fn create_cmd_line_pattern(myapp: Command) -> Command {
    myapp
        .arg(
            Arg::new("vocabulary")
                .long("vocabulary")
                .help("JSON file replacing or extending the built-in vocabulary tables")
                .value_name("FILE")
                .num_args(1),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print each report as JSON instead of text")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("csv")
                .long("csv")
                .help("Write the bonds of all documents to a CSV file")
                .value_name("FILE")
                .num_args(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More logging, repeat for debug and trace output")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("pdf documents")
                .help("CNIS statement PDF files")
                .num_args(1..)
                .required(true),
        )
}

fn fail(msg: &str) -> ! {
    log::error!("{msg}");
    eprintln!("{msg}");
    std::process::exit(1);
}

fn main() {
    let myapp = Command::new("cnisTimeHelper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Employment bonds and contribution time from CNIS statements")
        .arg_required_else_help(true);
    let matches = create_cmd_line_pattern(myapp).get_matches_from(wild::args());

    init_logging_infrastructure(level_from_verbosity(matches.get_count("verbose")))
        .expect_and_log("Error: unable to initialize logging");

    let vocabulary = match matches.get_one::<String>("vocabulary") {
        Some(path) => Vocabulary::load(Path::new(path))
            .unwrap_or_else(|e| fail(&format!("Error: unable to load vocabulary {path}: {e}"))),
        None => Vocabulary::default(),
    };

    let pdfnames: Vec<String> = matches
        .get_many::<String>("pdf documents")
        .expect_and_log("error getting CNIS statement pdfs names")
        .cloned()
        .collect();
    if let Err(msg) = validate_file_names(&pdfnames) {
        fail(&msg);
    }

    log::info!("Started cnisTimeHelper");

    let json = matches.get_flag("json");
    let mut reports = vec![];
    let mut failed = false;
    for name in pdfnames.iter() {
        let report = match process_document(name, &vocabulary) {
            Ok(report) => report,
            Err(e) => {
                log::error!("{name}: {e}");
                eprintln!("Error processing {name}: {e}");
                failed = true;
                continue;
            }
        };
        if json {
            match to_json(&report) {
                Ok(s) => println!("{s}"),
                Err(e) => {
                    eprintln!("Error processing {name}: {e}");
                    failed = true;
                }
            }
        } else {
            format_report(&report, name)
                .iter()
                .for_each(|line| println!("{line}"));
        }
        reports.push((name.clone(), report));
    }

    if let Some(csv_path) = matches.get_one::<String>("csv") {
        if let Err(e) = export_csv(&reports, Path::new(csv_path)) {
            log::error!("{e}");
            eprintln!("Error writing {csv_path}: {e}");
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}
