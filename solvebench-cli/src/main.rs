fn main() {
    if let Err(err) = solvebench_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
