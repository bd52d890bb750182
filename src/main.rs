use std::process;

fn main() {
    if let Err(e) = arbor::cli::run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
