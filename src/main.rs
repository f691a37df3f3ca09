//! pep518-check CLI entry point

fn main() {
    pep518_check::cli::run();
}
