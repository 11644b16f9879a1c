// src/report.rs

//! Fitting captured stdout/stderr into a size-limited report body.
//!
//! The body always has the shape
//!
//! ```text
//! -- stdout --
//! <stdout>
//! -- stderr --
//! <stderr>
//! ```
//!
//! and [`make_message`] trims the two streams (keeping their most recent
//! bytes) so the whole thing never exceeds the requested limit.

/// Ceiling for the body sent to the monitoring endpoint.
pub const MONITOR_LIMIT: usize = 10 * 1024;

/// Ceiling for the output shown in a fallback alert.
pub const ALERT_LIMIT: usize = 40 * 1024;

const STDOUT_HEADER: &[u8] = b"-- stdout --\n";
const STDERR_HEADER: &[u8] = b"\n-- stderr --\n";
const FOOTER: &[u8] = b"\n";

/// Length of the fixed text surrounding the two sections.
pub const SCAFFOLD_LEN: usize = STDOUT_HEADER.len() + STDERR_HEADER.len() + FOOTER.len();

/// Build a report body no longer than `limit` bytes.
///
/// If both streams fit they are emitted verbatim. Otherwise the smaller
/// stream is kept whole when it is under half the budget and the other one
/// gets the rest; when both are over half, each keeps its trailing half.
///
/// A `limit` smaller than the scaffold itself yields the scaffold cut down to
/// `limit` bytes.
pub fn make_message(stdout: &[u8], stderr: &[u8], limit: usize) -> Vec<u8> {
    let Some(budget) = limit.checked_sub(SCAFFOLD_LEN) else {
        return render(b"", b"").into_iter().take(limit).collect();
    };

    let (stdout, stderr) = if stdout.len() + stderr.len() <= budget {
        (stdout, stderr)
    } else if stdout.len() < budget / 2 {
        (stdout, tail(stderr, budget - stdout.len()))
    } else if stderr.len() < budget / 2 {
        (tail(stdout, budget - stderr.len()), stderr)
    } else {
        (tail(stdout, budget / 2), tail(stderr, budget / 2))
    };

    render(stdout, stderr)
}

fn tail(bytes: &[u8], keep: usize) -> &[u8] {
    &bytes[bytes.len().saturating_sub(keep)..]
}

fn render(stdout: &[u8], stderr: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SCAFFOLD_LEN + stdout.len() + stderr.len());
    out.extend_from_slice(STDOUT_HEADER);
    out.extend_from_slice(stdout);
    out.extend_from_slice(STDERR_HEADER);
    out.extend_from_slice(stderr);
    out.extend_from_slice(FOOTER);
    out
}
