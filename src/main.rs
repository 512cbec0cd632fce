use std::process;

fn main() {
    if let Err(e) = rigger::cli::run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
