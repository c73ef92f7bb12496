//! Console presentation of the index status report.
//!
//! Gives a quick summary of what's indexed: file and chunk counts, a
//! per-extension breakdown, and any failures from the most recent run.

use crate::models::IndexStatus;

/// Print a status report to stdout.
pub fn print_status(db_path: &std::path::Path, status: &IndexStatus) {
    let db_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);

    println!("docdex — Index Status");
    println!("=====================");
    println!();
    println!("  Database:       {}", db_path.display());
    println!("  Size:           {}", format_bytes(db_size));
    println!();
    println!("  Files tracked:  {}", status.total_files);
    println!("  Files indexed:  {}", status.indexed_files);
    println!("  Chunks:         {}", status.total_chunks);

    if !status.by_extension.is_empty() {
        println!();
        println!("  By extension:");
        println!("  {:<12} {:>6} {:>8}", "EXT", "FILES", "CHUNKS");
        println!("  {}", "-".repeat(28));
        for (ext, files, chunks) in &status.by_extension {
            println!("  {:<12} {:>6} {:>8}", ext, files, chunks);
        }
    }

    if !status.failed_files.is_empty() {
        println!();
        println!("  Failed in last run:");
        for failure in &status.failed_files {
            println!("    {} — {}", failure.path, failure.reason);
        }
    }

    println!();
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
