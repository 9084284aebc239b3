mod common;

use common::{countdown_code, safe_div_code};
use crossbridge_bytecode::{disassemble, exception_table, format_listing, CodecError, ExceptionTableEntry};
use crossbridge_object::source::CodeObject;
use expect_test::expect;
use pretty_assertions::assert_eq;

// --- Tests ---

#[test]
fn test_listing_marks_handlers_and_caches() -> Result<(), CodecError> {
    let code = safe_div_code()?;
    let records = disassemble(&code)?;

    expect![[r#"
        1         0 RESUME                    0
        2         1 NOP
        3         2 LOAD_FAST                 0 (a)
                  3 LOAD_FAST                 1 (b)
                  4 BINARY_OP                11 (/)
                  5 CACHE                     0
                  6 RETURN_VALUE
        4   >>    7 PUSH_EXC_INFO
                  8 LOAD_GLOBAL               0 (ZeroDivisionError)
                  9 CACHE                     0
                 10 CACHE                     0
                 11 CACHE                     0
                 12 CACHE                     0
                 13 CACHE                     0
                 14 CHECK_EXC_MATCH
                 15 POP_JUMP_FORWARD_IF_FALSE  4 (to 40)
                 16 POP_TOP
        5        17 POP_EXCEPT
                 18 LOAD_CONST                0 (None)
                 19 RETURN_VALUE
            >>   20 RERAISE                   0
    "#]]
    .assert_eq(&format_listing(&records));
    Ok(())
}

#[test]
fn test_offsets_are_code_units() -> Result<(), CodecError> {
    let code = safe_div_code()?;
    let records = disassemble(&code)?;

    assert_eq!(records.len(), code.code.len() / 2);
    for (index, record) in records.iter().enumerate() {
        assert_eq!(record.offset as usize, index);
    }
    Ok(())
}

#[test]
fn test_exception_table_uses_inclusive_unit_ranges() -> Result<(), CodecError> {
    let code = safe_div_code()?;
    let entries = exception_table::parse(&code.exception_table)?;

    assert_eq!(
        entries,
        vec![
            ExceptionTableEntry { start: 2, end: 6, target: 7, depth: 0, lasti: false },
            ExceptionTableEntry { start: 7, end: 19, target: 20, depth: 1, lasti: true },
        ]
    );
    assert!(entries[0].covers(6));
    assert!(!entries[0].covers(7));
    Ok(())
}

#[test]
fn test_backward_jump_target_is_marked() -> Result<(), CodecError> {
    let code = countdown_code()?;
    let records = disassemble(&code)?;

    let jump = records.iter().find(|r| r.opname == "JUMP_BACKWARD").expect("loop jump");
    assert_eq!(jump.argrepr.as_deref(), Some("to 2"));
    let head = records.iter().find(|r| r.offset == 1).expect("loop head");
    assert!(head.is_jump_target);
    assert_eq!(head.starts_line, Some(2));

    let exit_arg = records.iter().find(|r| r.opname == "POP_JUMP_FORWARD_IF_FALSE").and_then(|r| r.argrepr.clone());
    let exit = records.iter().find(|r| r.is_jump_target && r.offset != 1).expect("loop exit");
    assert_eq!(exit_arg, Some(format!("to {}", exit.offset * 2)));
    Ok(())
}

#[test]
fn test_global_names_with_null_bit() {
    let code = CodeObject {
        code: vec![116, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
        names: vec!["print".into()],
        ..Default::default()
    };
    let records = disassemble(&code).unwrap();
    assert_eq!(records[0].argrepr.as_deref(), Some("NULL + print"));
    assert!(records[1..].iter().all(|r| r.is_cache()));
}

#[test]
fn test_extended_arg_widens_the_next_argument() {
    let consts = (0..=300).map(crossbridge_object::SourceValue::int).collect();
    let code = CodeObject { code: vec![144, 1, 100, 44], consts, ..Default::default() };
    let records = disassemble(&code).unwrap();

    assert_eq!(records[0].opname, "EXTENDED_ARG");
    assert_eq!(records[1].arg, Some(300));
    assert_eq!(records[1].argrepr.as_deref(), Some("300"));
    assert_eq!(records[1].offset, 1);
}

#[test]
fn test_cell_names_follow_locals() {
    let code = CodeObject {
        code: vec![135, 1, 137, 2],
        varnames: vec!["self".into()],
        cellvars: vec!["total".into(), "self".into()],
        freevars: vec!["outer".into()],
        ..Default::default()
    };
    let records = disassemble(&code).unwrap();
    assert_eq!(records[0].argrepr.as_deref(), Some("total"));
    assert_eq!(records[1].argrepr.as_deref(), Some("outer"));
}

#[test]
fn test_unknown_opcode_is_reported() {
    let code = CodeObject { code: vec![9, 0, 200, 0], ..Default::default() };
    assert_eq!(disassemble(&code), Err(CodecError::UnknownOpcode { opcode: 200, offset: 2 }));
}

#[test]
fn test_records_serialize_without_empty_fields() {
    let code = countdown_code().unwrap();
    let records = disassemble(&code).unwrap();
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "opname": "RESUME",
            "offset": 0,
            "is_jump_target": false,
            "arg": 0,
            "argrepr": "",
            "starts_line": 1,
        })
    );
}
