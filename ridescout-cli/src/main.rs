//! Entry point for the `ridescout` command.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = ridescout_cli::run() {
        eprintln!("ridescout: {err}");
        std::process::exit(1);
    }
}
