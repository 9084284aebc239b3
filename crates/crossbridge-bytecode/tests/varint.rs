use crossbridge_bytecode::varint::{self, decode_all};
use crossbridge_bytecode::{exception_table, CodecError, ExceptionTableEntry};
use proptest::prelude::*;

proptest! {
    #[test]
    fn varints_round_trip(value in any::<u64>(), entry_start in any::<bool>()) {
        let mut bytes = Vec::new();
        varint::encode(value, entry_start, &mut bytes);
        prop_assert_eq!(decode_all(&bytes), Ok(vec![value]));
    }

    #[test]
    fn truncated_varints_are_malformed(value in 64u64..) {
        let mut bytes = Vec::new();
        varint::encode(value, false, &mut bytes);
        bytes.pop();
        let is_malformed = matches!(decode_all(&bytes), Err(CodecError::MalformedEncoding { .. }));
        prop_assert!(is_malformed);
    }
}

#[test]
fn test_decoder_is_lazy_and_stops_after_error() {
    let mut decoder = varint::decode(&[0x02, 0x41]);
    assert_eq!(decoder.next(), Some(Ok(2)));
    assert!(matches!(decoder.next(), Some(Err(CodecError::MalformedEncoding { offset: 1, .. }))));
    assert_eq!(decoder.next(), None);
}

#[test]
fn test_entry_truncated_after_two_fields() -> Result<(), CodecError> {
    let mut bytes =
        exception_table::encode(&[ExceptionTableEntry { start: 4, end: 9, target: 12, depth: 2, lasti: true }])?;
    bytes.truncate(2);
    let error = exception_table::parse(&bytes).unwrap_err();
    assert!(matches!(error, CodecError::MalformedEncoding { offset: 0, .. }));
    Ok(())
}

#[test]
fn test_large_offsets_survive_the_table() -> Result<(), CodecError> {
    let entries = vec![ExceptionTableEntry { start: 70_000, end: 70_010, target: 90_000, depth: 3, lasti: false }];
    let bytes = exception_table::encode(&entries)?;
    assert_eq!(exception_table::parse(&bytes)?, entries);
    Ok(())
}

#[test]
fn test_unencodable_entries_are_rejected() -> Result<(), CodecError> {
    let valid = ExceptionTableEntry { start: 0, end: 1, target: 4, depth: 0, lasti: false };
    let inverted = ExceptionTableEntry { start: 9, end: 4, ..valid };
    let too_deep = ExceptionTableEntry { depth: u32::MAX, ..valid };

    assert!(matches!(exception_table::encode(&[inverted]), Err(CodecError::MalformedEncoding { offset: 0, .. })));
    let valid_len = exception_table::encode(&[valid])?.len();
    let error = exception_table::encode(&[valid, too_deep]);
    assert!(matches!(error, Err(CodecError::MalformedEncoding { offset, .. }) if offset == valid_len));
    Ok(())
}
