fn main() {
    if let Err(err) = groupflow::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
