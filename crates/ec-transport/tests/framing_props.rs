//! Property tests for transaction framing
//!
//! Case counts are kept low because every transaction pays the
//! protocol-mandated settle delays in real time.

use std::collections::VecDeque;
use std::time::Duration;

use proptest::prelude::*;

use ec_transport::{txrx, EcTransport, TransportError};

struct Scripted {
    response: VecDeque<u8>,
}

impl EcTransport for Scripted {
    fn write_command(&mut self, _cmd: u8) -> Result<(), TransportError> {
        Ok(())
    }

    fn write_data(&mut self, _byte: u8) -> Result<(), TransportError> {
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
        self.response
            .pop_front()
            .ok_or(TransportError::ReadTimeout(timeout))
    }

    fn status(&mut self) -> Result<u8, TransportError> {
        Ok(0)
    }
}

const FAST: Duration = Duration::from_millis(2);
const OVERALL: Duration = Duration::from_secs(2);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn queued_bytes_of_expected_length_come_back_verbatim(
        response in proptest::collection::vec(any::<u8>(), 0..24)
    ) {
        let mut dev = Scripted { response: response.iter().copied().collect() };
        let expect = if response.is_empty() { None } else { Some(response.len()) };
        let out = txrx(&mut dev, 0x48, &[0x01], expect, FAST, OVERALL).unwrap();
        prop_assert_eq!(out, response);
    }

    #[test]
    fn surplus_bytes_are_truncated_and_fully_consumed(
        response in proptest::collection::vec(any::<u8>(), 4..24),
        cut in 1usize..4
    ) {
        let expect = response.len() - cut;
        let mut dev = Scripted { response: response.iter().copied().collect() };
        let out = txrx(&mut dev, 0x31, &[0x04], Some(expect), FAST, OVERALL).unwrap();
        prop_assert_eq!(&out[..], &response[..expect]);
        prop_assert!(dev.response.is_empty());
    }
}
