fn main() {
    if let Err(err) = cellview::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
