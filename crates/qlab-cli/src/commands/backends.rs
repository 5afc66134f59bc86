//! Backends command implementation.

use anyhow::Result;
use console::style;

use qlab_hal::{BackendInfo, SelectionFilter};

use super::common::connect_archive;

/// Execute the backends command.
pub async fn execute(
    archive: &str,
    least_busy: bool,
    include_simulators: bool,
    min_qubits: u32,
) -> Result<()> {
    let service = connect_archive(archive)?;

    if least_busy {
        let filter = SelectionFilter {
            include_simulators,
            min_qubits,
            ..SelectionFilter::default()
        };
        match service.least_busy(filter).await? {
            Some(info) => {
                println!("{} Least busy backend:\n", style("qlab").cyan().bold());
                print_backend(&info);
            }
            None => anyhow::bail!("No operational backend matches the filter"),
        }
        return Ok(());
    }

    let backends = service.backends().await?;
    println!("{} Available backends:\n", style("qlab").cyan().bold());
    if backends.is_empty() {
        println!("  No backends in the catalogue.");
        return Ok(());
    }
    for info in &backends {
        print_backend(info);
    }

    Ok(())
}

fn print_backend(info: &BackendInfo) {
    println!(
        "  {} {} ({})",
        if info.operational {
            style("●").green()
        } else {
            style("○").red()
        },
        style(&info.name).bold(),
        info.kind_label()
    );
    println!("    Qubits: {}", info.num_qubits);
    println!("    Pending jobs: {}", info.pending_jobs);
    if let Some(family) = &info.processor_family {
        println!("    Processor: {family}");
    }
    if let Some(date) = &info.online_date {
        println!("    Online since: {}", date.format("%Y-%m-%d"));
    }
    println!();
}
