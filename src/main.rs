fn main() {
    if let Err(e) = octomatch_lib::run() {
        eprintln!("octomatch: {e}");
        std::process::exit(1);
    }
}
