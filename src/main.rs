fn main() {
    if let Err(e) = unguided::runtime::run() {
        eprintln!("unguided: {e}");
        std::process::exit(1);
    }
}
