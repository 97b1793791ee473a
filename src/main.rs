fn main() {
    sqlshard::logging::init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = sqlshard::driver::run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
