fn main() {
    if let Err(err) = area_lens::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
