//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = wrangle_cli::run() {
        eprintln!("wrangle: {err}");
        std::process::exit(1);
    }
}
