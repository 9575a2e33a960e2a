//! The transaction engine
//!
//! One transaction is: write the command byte, write the payload bytes,
//! wait for the EC to process, then drain every response byte the device
//! produces. Draining until the device goes quiet (rather than stopping at
//! the expected length) is what keeps a long response from leaving stale
//! bytes queued for the next transaction.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{ShortReason, TransportError};
use crate::EcTransport;

/// Settling time after the command byte
const COMMAND_DELAY: Duration = Duration::from_millis(50);
/// Settling time before each payload byte
const DATA_DELAY: Duration = Duration::from_millis(5);
/// Processing time granted to the EC before the first read
const SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Perform one full command/response transaction
///
/// Writes `cmd` and `data` to the device with the protocol-mandated
/// settling delays, then reads response bytes until a read times out
/// (`read_timeout` per attempt, `overall_timeout` for the whole drain).
///
/// Length reconciliation:
/// - `expect_len == None`: every collected byte is returned.
/// - more bytes than expected: the surplus is discarded, but only after
///   being consumed from the device.
/// - fewer bytes than a positive `expect_len`:
///   [`TransportError::ShortResponse`], with the reason recording whether
///   the device went quiet or the overall deadline cut the drain short.
///
/// Writes are assumed to succeed (the protocol has no write ack) and
/// nothing is retried here; retry policy belongs to the caller.
pub fn txrx(
    dev: &mut dyn EcTransport,
    cmd: u8,
    data: &[u8],
    expect_len: Option<usize>,
    read_timeout: Duration,
    overall_timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    debug!("WRITE CMD 0x{cmd:02X} ({} payload byte(s))", data.len());
    dev.write_command(cmd)?;
    std::thread::sleep(COMMAND_DELAY);
    for (i, &byte) in data.iter().enumerate() {
        std::thread::sleep(DATA_DELAY);
        debug!("WRITE DATA[{i}] 0x{byte:02X}");
        dev.write_data(byte)?;
    }

    debug!("waiting {}ms for EC to process", SETTLE_DELAY.as_millis());
    std::thread::sleep(SETTLE_DELAY);

    let mut out = Vec::new();
    let start = Instant::now();
    let mut drained = false;

    while start.elapsed() <= overall_timeout {
        let attempt = Instant::now();
        match dev.read_byte(read_timeout) {
            Ok(byte) => {
                out.push(byte);
                debug!(
                    "READ wait {:.1}ms -> 0x{byte:02X} (count={})",
                    attempt.elapsed().as_secs_f64() * 1000.0,
                    out.len()
                );
            }
            Err(err) if err.is_read_timeout() => {
                debug!(
                    "READ wait {:.1}ms -> timeout (drain complete)",
                    attempt.elapsed().as_secs_f64() * 1000.0
                );
                drained = true;
                break;
            }
            Err(err) => return Err(err),
        }
    }

    let Some(expected) = expect_len else {
        return Ok(out);
    };

    if out.len() > expected {
        debug!(
            "TRUNCATE response: got {} > expected {expected}, discarding {} byte(s)",
            out.len(),
            out.len() - expected
        );
        out.truncate(expected);
    } else if out.len() < expected && expected > 0 {
        let reason = if drained {
            ShortReason::TimedOut
        } else {
            ShortReason::EndedEarly
        };
        debug!("SHORT response: got {} < expected {expected}", out.len());
        return Err(TransportError::ShortResponse {
            got: out.len(),
            expected,
            reason,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    const FAST: Duration = Duration::from_millis(5);
    const OVERALL: Duration = Duration::from_secs(2);

    /// A backend that replays a fixed response byte queue
    struct Scripted {
        commands: Vec<u8>,
        data: Vec<u8>,
        response: VecDeque<u8>,
    }

    impl Scripted {
        fn new(response: &[u8]) -> Self {
            Self {
                commands: Vec::new(),
                data: Vec::new(),
                response: response.iter().copied().collect(),
            }
        }
    }

    impl EcTransport for Scripted {
        fn write_command(&mut self, cmd: u8) -> Result<(), TransportError> {
            self.commands.push(cmd);
            Ok(())
        }

        fn write_data(&mut self, byte: u8) -> Result<(), TransportError> {
            self.data.push(byte);
            Ok(())
        }

        fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
            self.response
                .pop_front()
                .ok_or(TransportError::ReadTimeout(timeout))
        }

        fn status(&mut self) -> Result<u8, TransportError> {
            Ok(if self.response.is_empty() { 0 } else { 1 })
        }
    }

    #[test]
    fn exact_expected_length_is_returned_verbatim() {
        let mut dev = Scripted::new(&[0x11, 0x22, 0x33]);
        let resp = txrx(&mut dev, 0x28, &[0x01], Some(3), FAST, OVERALL).unwrap();
        assert_eq!(resp, [0x11, 0x22, 0x33]);
        assert_eq!(dev.commands, [0x28]);
        assert_eq!(dev.data, [0x01]);
    }

    #[test]
    fn no_expected_length_returns_everything() {
        let mut dev = Scripted::new(&[1, 2, 3, 4, 5]);
        let resp = txrx(&mut dev, 0x48, &[0x01], None, FAST, OVERALL).unwrap();
        assert_eq!(resp, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn overflow_is_truncated_but_fully_drained() {
        let mut dev = Scripted::new(&[1, 2, 3, 4, 5]);
        let resp = txrx(&mut dev, 0x20, &[0x04, 0x01], Some(2), FAST, OVERALL).unwrap();
        assert_eq!(resp, [1, 2]);
        // Drain invariant: nothing is left queued for a later transaction
        assert!(dev.response.is_empty());
    }

    #[test]
    fn underrun_fails_with_timed_out_reason() {
        let mut dev = Scripted::new(&[1, 2]);
        let err = txrx(&mut dev, 0x31, &[0x04], Some(4), FAST, OVERALL).unwrap_err();
        match err {
            TransportError::ShortResponse {
                got,
                expected,
                reason,
            } => {
                assert_eq!((got, expected), (2, 4));
                assert_eq!(reason, ShortReason::TimedOut);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn underrun_at_overall_deadline_reports_ended_early() {
        // A zero overall timeout never enters the drain loop, so the
        // engine knows the stream ended by deadline, not by device quiet
        let mut dev = Scripted::new(&[1, 2, 3]);
        let err = txrx(&mut dev, 0x31, &[0x04], Some(3), FAST, Duration::ZERO).unwrap_err();
        match err {
            TransportError::ShortResponse { reason, .. } => {
                assert_eq!(reason, ShortReason::EndedEarly);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_expectation_accepts_silence() {
        let mut dev = Scripted::new(&[]);
        let resp = txrx(&mut dev, 0x10, &[0x01, 0x02], Some(0), FAST, OVERALL).unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn error_message_distinguishes_reasons() {
        let timed_out = TransportError::ShortResponse {
            got: 1,
            expected: 2,
            reason: ShortReason::TimedOut,
        };
        let ended = TransportError::ShortResponse {
            got: 1,
            expected: 2,
            reason: ShortReason::EndedEarly,
        };
        assert_eq!(
            timed_out.to_string(),
            "response timed out: received 1 of 2 byte(s)"
        );
        assert_eq!(
            ended.to_string(),
            "response ended before expected length: received 1 of 2 byte(s)"
        );
    }
}
