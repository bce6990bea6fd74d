//! Subcommand implementations.

pub mod bench;
pub mod probe;
pub mod report;
pub mod run;
pub mod server;
pub mod stream;
pub mod transfer;

/// Generate a test block in the requested fill pattern.
///
/// The `sensor` pattern mimics repetitive sensor logs: long runs broken by a
/// counter tail, so the record compresses well without being degenerate.
pub fn test_data(pattern: &str, size: usize) -> Vec<u8> {
    match pattern {
        "constant" => vec![0xAA; size],
        "counter" => (0..size).map(|i| i as u8).collect(),
        _ => (0..size)
            .map(|i| match i % 100 {
                0..=49 => 0xAA,
                50..=74 => 0x55,
                _ => i as u8,
            })
            .collect(),
    }
}
