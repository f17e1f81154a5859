//! Read strategies: prompt detection for negotiation, settle time for capture.

use std::time::Duration;

use log::trace;
use memchr::memchr;
use regex::bytes::Regex;
use tokio::time::Instant;

use crate::channel::PatternBuffer;
use crate::error::TransportError;
use crate::transport::Shell;

/// How a settle-time read is bounded.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SettleWindow {
    /// Quiet period that ends the read.
    pub settle: Duration,

    /// Hard limit on the whole read.
    pub deadline: Duration,
}

/// Read until `prompt` matches the tail of the buffer.
///
/// Returns `Ok(false)` if `timeout` elapsed first.
pub(crate) async fn read_until_prompt<S: Shell>(
    shell: &mut S,
    buffer: &mut PatternBuffer,
    prompt: &Regex,
    timeout: Duration,
) -> Result<bool, TransportError> {
    let deadline = Instant::now() + timeout;

    loop {
        if buffer.tail_contains(prompt) {
            return Ok(true);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        if let Some(data) = shell.read_chunk(deadline - now).await? {
            buffer.extend(&data);
        }
    }
}

/// Read until the device has been quiet for a full settle period.
///
/// Output length is not known in advance, so end of output is inferred from
/// silence rather than from a returning prompt. A pager marker at the tail
/// is cut from the buffer and answered with `pager_advance`.
///
/// Silence only counts once the device has sent something past the echo of
/// `command`, and not while a pager advance is still unanswered.
///
/// Returns `Ok(false)` if the deadline passed before such a quiet period.
pub(crate) async fn read_until_settled<S: Shell>(
    shell: &mut S,
    buffer: &mut PatternBuffer,
    command: &str,
    pager: Option<&Regex>,
    pager_advance: &str,
    window: SettleWindow,
) -> Result<bool, TransportError> {
    let deadline = Instant::now() + window.deadline;
    let mut paging = false;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }

        let wait = window.settle.min(deadline - now);
        match shell.read_chunk(wait).await? {
            Some(data) => {
                buffer.extend(&data);
                paging = false;
                if let Some(pager) = pager {
                    if buffer.truncate_tail_match(pager) {
                        trace!("pager marker seen, advancing");
                        shell.send_raw(pager_advance).await?;
                        paging = true;
                    }
                }
            }
            None if wait == window.settle
                && !paging
                && has_response(buffer.as_slice(), command) =>
            {
                return Ok(true);
            }
            None => {}
        }
    }
}

/// Whether `output` holds anything besides the echo of `command`.
///
/// The echo is a first line ending with the command, complete or not.
fn has_response(output: &[u8], command: &str) -> bool {
    let command = command.trim().as_bytes();
    let first_end = memchr(b'\n', output).unwrap_or(output.len());
    let body = if output[..first_end].trim_ascii_end().ends_with(command) {
        output.get(first_end + 1..).unwrap_or_default()
    } else {
        output
    };
    body.iter().any(|b| !b.is_ascii_whitespace())
}
