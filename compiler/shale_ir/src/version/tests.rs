use proptest::prelude::*;

use super::*;

#[test]
fn ordinals_and_display() {
    assert_eq!(Version::from_ordinal(3), Some(Version::V0_4_0));
    assert_eq!(Version::from_ordinal(5), None);
    assert_eq!(Version::V0_5_0.ordinal(), 4);
    assert_eq!(Version::V0_4_0.to_string(), "0.4.0");
}

#[test]
fn supported_range_is_inclusive() {
    assert!(Version::LEAST.is_supported());
    assert!(Version::LATEST.is_supported());
    assert!(!Version::V0_3_0.is_supported());
}

#[test]
fn latest_is_identity() {
    for &opcode in Opcode::ALL {
        assert_eq!(encode_opcode(opcode, Version::LATEST), Some(opcode.canonical()));
        assert_eq!(decode_opcode(opcode.canonical(), Version::LATEST), Some(opcode));
    }
}

#[test]
fn supported_instruction_sets_share_numbering() {
    for &opcode in Opcode::ALL {
        let byte = opcode.canonical();
        assert_eq!(decode_opcode(byte, Version::V0_4_0), Some(opcode));
        assert_eq!(encode_opcode(opcode, Version::V0_4_0), Some(byte));
    }
    assert_eq!(decode_opcode(Opcode::New.canonical(), Version::V0_4_0), Some(Opcode::New));
    assert!(Opcode::New.has_operand());
}

#[test]
fn bytes_past_the_table_are_rejected() {
    assert_eq!(decode_opcode(58, Version::LATEST), None);
    assert_eq!(decode_opcode(58, Version::V0_4_0), None);
    assert_eq!(decode_opcode(u8::MAX, Version::V0_4_0), None);
}

/// One step that opens a slot at `tosi`, as if an older set lacked it.
const INSERT_TOSI: &[CompatRule] = &[CompatRule {
    threshold: Opcode::ToSi.canonical(),
    delta: 1,
}];

#[test]
fn rules_shift_bytes_at_and_above_the_threshold() {
    let steps = || [INSERT_TOSI].into_iter();
    assert_eq!(upgrade(Opcode::ToL.canonical(), steps()), Some(Opcode::ToL));
    assert_eq!(upgrade(Opcode::ToSi.canonical(), steps()), Some(Opcode::ToD));
    assert_eq!(upgrade(56, steps()), Some(Opcode::Count));
    // The shifted table is one opcode shorter.
    assert_eq!(upgrade(57, steps()), None);

    assert_eq!(downgrade(Opcode::ToL, steps()), Some(Opcode::ToL.canonical()));
    assert_eq!(downgrade(Opcode::ToSi, steps()), None);
    assert_eq!(downgrade(Opcode::Count, steps()), Some(56));
}

#[test]
fn steps_compose_in_order() {
    let second: &[CompatRule] = &[CompatRule { threshold: 0, delta: 1 }];
    let steps = || [INSERT_TOSI, second].into_iter();
    // Byte 45 moves to 46 in the first step, then to 47.
    assert_eq!(upgrade(45, steps()), Some(Opcode::ToP));
    assert_eq!(downgrade(Opcode::ToP, steps()), Some(45));
    assert_eq!(downgrade(Opcode::Nop, steps()), None);
}

proptest! {
    #[test]
    fn shifted_tables_round_trip(index in 0..OPCODE_COUNT) {
        let opcode = Opcode::ALL[index];
        if let Some(byte) = downgrade(opcode, [INSERT_TOSI].into_iter()) {
            prop_assert_eq!(upgrade(byte, [INSERT_TOSI].into_iter()), Some(opcode));
        }
    }

    #[test]
    fn encode_then_decode_is_identity(index in 0..OPCODE_COUNT, version in 3u16..=4) {
        let opcode = Opcode::ALL[index];
        let version = Version::from_ordinal(version).unwrap_or(Version::LATEST);
        if let Some(byte) = encode_opcode(opcode, version) {
            prop_assert_eq!(decode_opcode(byte, version), Some(opcode));
        }
    }

    #[test]
    fn decode_then_encode_is_identity(byte in any::<u8>(), version in 3u16..=4) {
        let version = Version::from_ordinal(version).unwrap_or(Version::LATEST);
        if let Some(opcode) = decode_opcode(byte, version) {
            prop_assert_eq!(encode_opcode(opcode, version), Some(byte));
        }
    }
}
