//! End-to-end transactions: the engine driving the simulated EC
//!
//! The simulator and the hardware transport satisfy the same contract, so
//! these tests pin down the framing behavior both must provide: exact
//! lengths, the drain invariant, short-response failures, and the
//! configuration-field paths through the real codecs.

use std::num::NonZeroUsize;
use std::time::Duration;

use ec_protocol::{codec, command, fields};
use ec_sim::EcSimulator;
use ec_transport::{txrx, ShortReason, TransportError};

const READ: Duration = Duration::from_millis(20);
const OVERALL: Duration = Duration::from_secs(2);

fn send(sim: &mut EcSimulator, cmd: u8, data: &[u8], expect: Option<usize>) -> Vec<u8> {
    txrx(sim, cmd, data, expect, READ, OVERALL).expect("transaction failed")
}

#[test]
fn ec_version_decodes_to_the_simulator_default() {
    let mut sim = EcSimulator::new();
    let resp = send(&mut sim, 0x48, &[0x01], None);
    assert_eq!(resp.len(), command::version::RESPONSE_LEN);
    let end = resp.iter().position(|&b| b == 0).unwrap_or(resp.len());
    assert_eq!(String::from_utf8_lossy(&resp[..end]), "SimEC v1.0");
}

#[test]
fn fan_duty_written_through_the_engine_reads_back() {
    let mut sim = EcSimulator::new();
    send(&mut sim, 0x20, &[0x02, 0x02, 200], Some(0));
    let resp = send(&mut sim, 0x20, &[0x04, 0x01], Some(1));
    assert_eq!(resp, [200]);
}

#[test]
fn truncated_read_leaves_nothing_queued() {
    let mut sim = EcSimulator::new();
    // Version response is 20 bytes; ask for 4 and the other 16 must be
    // consumed, not left to corrupt the next transaction
    let resp = send(&mut sim, 0x48, &[0x01], Some(4));
    assert_eq!(resp, b"SimE");

    let temp = send(&mut sim, 0x28, &[0x01], Some(2));
    assert_eq!(command::read_le16(&temp), Some(450));
}

#[test]
fn short_response_is_an_error_not_a_pad() {
    let mut sim = EcSimulator::new();
    // Temperature responds with 2 bytes; demanding 6 must fail
    let err = txrx(&mut sim, 0x28, &[0x01], Some(6), READ, OVERALL).unwrap_err();
    match err {
        TransportError::ShortResponse {
            got,
            expected,
            reason,
        } => {
            assert_eq!((got, expected), (2, 6));
            assert_eq!(reason, ShortReason::TimedOut);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn write_commands_produce_no_ack_payload() {
    let mut sim = EcSimulator::new();
    assert!(send(&mut sim, 0x10, &[0x01, 0x02], Some(0)).is_empty());
    assert!(send(&mut sim, 0x40, &[0x01], Some(0)).is_empty());
    assert!(send(&mut sim, 0x30, &[0x02, 0x01], Some(0)).is_empty());
}

#[test]
fn battery_info_items_match_their_catalog_length() {
    let mut sim = EcSimulator::new();
    let voltage = fields::battery_item("voltage").unwrap();
    let resp = send(&mut sim, 0x31, &[voltage.sub], Some(voltage.length));
    assert_eq!(command::read_le16(&resp), Some(11400));

    let chem = fields::battery_item("device_chemistry").unwrap();
    let resp = send(&mut sim, 0x31, &[chem.sub], Some(chem.length));
    assert_eq!(&resp, b"Li-Ion");
}

#[test]
fn mac_address_field_roundtrips_through_the_wire() {
    let mut sim = EcSimulator::new();
    let field = fields::by_name("mac_address").unwrap();

    let encoded = codec::encode_field(field, "AA:BB:CC:DD:EE:FF").unwrap();
    let mut payload = vec![field.write_sub];
    payload.extend_from_slice(&encoded);
    send(&mut sim, field.write_cmd, &payload, Some(0));
    send(&mut sim, 0x62, &[0x01], Some(0));

    let resp = send(&mut sim, field.read_cmd, &[field.read_sub], Some(field.length));
    assert_eq!(codec::decode_field(field, &resp).unwrap(), "AA:BB:CC:DD:EE:FF");
    assert_eq!(sim.commit_count(), 1);
}

#[test]
fn uuid_field_default_reads_back_canonical() {
    let mut sim = EcSimulator::new();
    let field = fields::by_name("uuid").unwrap();
    let resp = send(&mut sim, field.read_cmd, &[field.read_sub], Some(field.length));
    assert_eq!(
        codec::decode_field(field, &resp).unwrap(),
        "12345678-90ab-cdef-1234-567890abcdef"
    );
}

#[test]
fn overridden_field_length_governs_the_response() {
    let mut sim = EcSimulator::new();
    let field = fields::by_name("uuid").unwrap();
    assert_ne!(field.length, 4);

    sim.override_field_length(field.read_sub, NonZeroUsize::new(4).unwrap());
    let derived = field.with_length(4);
    let resp = send(&mut sim, derived.read_cmd, &[derived.read_sub], Some(derived.length));
    assert_eq!(resp.len(), 4);
}

#[test]
fn queued_response_of_exact_expected_length_is_returned() {
    let mut sim = EcSimulator::new();
    // Battery info device_name is a 14-byte fixed buffer
    let item = fields::battery_item("device_name").unwrap();
    let resp = send(&mut sim, 0x31, &[item.sub], Some(item.length));
    assert_eq!(resp.len(), 14);
    assert!(resp.starts_with(b"SimDevice"));
}
