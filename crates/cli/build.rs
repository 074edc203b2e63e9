use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("blinkpress")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Blinkpress Contributors")
        .about("Turn Blinkist reader pages into PDF or Markdown documents")
        .arg(clap::arg!([BOOK] ... "Book identifiers to download (default: the books listed in the config file)"))
        .arg(
            clap::arg!(-c --config <FILE> "Configuration file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-o --output <DIR> "Output directory for the finished documents")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (pdf, markdown)")
                .value_name("FORMAT")
                .value_parser(["pdf", "markdown", "md"]),
        )
        .arg(clap::arg!(--lang <LANG> "Reader language code"))
        .arg(clap::arg!(-j --concurrency <NUM> "Maximum number of books processed at the same time"))
        .arg(
            clap::Arg::new("fail_fast")
                .long("fail-fast")
                .action(clap::ArgAction::SetTrue)
                .help("Cancel the remaining books after the first failure"),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds"))
        .arg(clap::arg!(-u --username <EMAIL> "Account e-mail address"))
        .arg(clap::arg!(--password <PASSWORD> "Account password"))
        .arg(
            clap::Arg::new("base_url")
                .long("base-url")
                .value_name("URL")
                .help("Site root to download from"),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "elvish", "fish", "powershell", "zsh"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "blinkpress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "blinkpress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "blinkpress", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "blinkpress", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
