//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - measurement-result reporting for quantum experiments",
        style("qlab").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qlab-hal              Backends, results, credentials");
    println!("  qlab-report           Normalize, sort, print and chart counts");
    println!("  qlab-adapter-archive  Read-only job archive backend");
    println!("  qlab-cli              Command-line interface");
    println!();
    println!(
        "Repository: {}",
        style("https://github.com/qlab-dev/qlab").underlined()
    );
    println!("License:    {}", style("Apache-2.0").dim());
}
