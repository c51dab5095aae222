fn main() {
    if let Err(err) = superschema::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
