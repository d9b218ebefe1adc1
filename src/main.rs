fn main() {
    if let Err(err) = webdoctor::cli::run() {
        webdoctor::ui::eprintln_error(&err);
        std::process::exit(webdoctor::exit::exit_code(&err));
    }
}
