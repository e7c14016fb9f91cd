fn main() {
    if let Err(err) = searchlight::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
