fn main() {
    if let Err(e) = brainly::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
