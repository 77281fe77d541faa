mod exports;
mod progress;
mod style;
mod summary;

pub use exports::write_csv;
pub use progress::PhaseProgress;
pub use style::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the ci-times banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("⏱️ ci-times"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI job duration collector")
    );
}
