use std::path::Path;

use ktjc::codegen::constpool::Constant;
use ktjc::codegen::opcodes::*;
use ktjc::{ClassUnit, Config, MemorySink, Session};

mod common;

/// Field names referenced by PUTFIELD in `<init>`, in order.
fn putfield_order(unit: &ClassUnit, descriptor: &str) -> Vec<String> {
    let code = common::code(unit, "<init>", descriptor);
    let pool = &unit.class_file.constant_pool;
    decode(&code.code)
        .unwrap()
        .iter()
        .filter(|i| i.opcode == PUTFIELD)
        .filter_map(|i| pool.member_ref_at(i.u16_operand()?))
        .map(|(_, name, _)| name.to_string())
        .collect()
}

#[test]
fn test_enumeration_values_in_declaration_order() {
    let units = common::compile("p/Color.ktj", "public type Color = RED | GREEN | BLUE\n").unwrap();
    let unit = common::unit(&units, "p/Color");
    assert_eq!(unit.class_file.field_names(), vec!["RED", "GREEN", "BLUE", "$VALUES"]);

    let clinit = common::code(unit, "<clinit>", "()V");
    let pool = &unit.class_file.constant_pool;
    let stored: Vec<&str> = decode(&clinit.code)
        .unwrap()
        .iter()
        .filter(|i| i.opcode == PUTSTATIC)
        .filter_map(|i| pool.member_ref_at(i.u16_operand()?))
        .map(|(_, name, _)| name)
        .collect();
    assert_eq!(stored, vec!["RED", "GREEN", "BLUE", "$VALUES"]);
}

#[test]
fn test_record_constructor_follows_components() {
    let units = common::compile("p/Pair.ktj", "data Pair = [int x, int y]\n").unwrap();
    let unit = common::unit(&units, "p/Pair");
    assert_eq!(putfield_order(unit, "(II)V"), vec!["x", "y"]);

    let units = common::compile("p/Pair.ktj", "data Pair = [int y, int x]\n").unwrap();
    let unit = common::unit(&units, "p/Pair");
    assert_eq!(putfield_order(unit, "(II)V"), vec!["y", "x"]);
    assert_eq!(unit.class_file.field_names(), vec!["y", "x"]);
}

#[test]
fn test_factorial_loop_lowering() {
    let src = "\
public class Math2 {
    public static long fact(int n) {
        long acc = 1l
        int i = 2
        while i <= n {
            acc = acc * i
            i = i + 1
        }
        return acc
    }
}
";
    let units = common::compile("Math2.ktj", src).unwrap();
    let unit = common::unit(&units, "Math2");
    let code = common::code(unit, "fact", "(I)J");
    assert_eq!(
        common::opcodes(code),
        vec![
            LCONST_1, LSTORE_1, ICONST_2, ISTORE_3, ILOAD_3, ILOAD_0, IF_ICMPGT, LLOAD_1, ILOAD_3, I2L, LMUL, LSTORE_1,
            ILOAD_3, ICONST_1, IADD, ISTORE_3, GOTO, LLOAD_1, LRETURN
        ]
    );
    assert_eq!(code.max_locals, 4);
    assert_eq!(code.max_stack, 4);
}

#[test]
fn test_static_field_initializer_runs_in_clinit() {
    let src = "class Counter {\n    static int count = 7\n    int step = 2\n}\n";
    let units = common::compile("Counter.ktj", src).unwrap();
    let unit = common::unit(&units, "Counter");
    assert_eq!(common::opcodes(common::code(unit, "<clinit>", "()V")), vec![BIPUSH, PUTSTATIC, RETURN]);
    assert_eq!(
        common::opcodes(common::code(unit, "<init>", "()V")),
        vec![ALOAD_0, INVOKESPECIAL, ALOAD_0, ICONST_2, PUTFIELD, RETURN]
    );
}

#[test]
fn test_string_constants_live_in_the_pool() {
    let src = "class Greeter {\n    String greet(String who) {\n        return \"hello \" + who\n    }\n}\n";
    let units = common::compile("Greeter.ktj", src).unwrap();
    let pool = &common::unit(&units, "Greeter").class_file.constant_pool;
    let strings: Vec<&str> = pool
        .iter()
        .filter_map(|(_, c)| match c {
            Constant::String(index) => pool.utf8_at(*index),
            _ => None,
        })
        .collect();
    assert_eq!(strings, vec!["hello "]);
}

#[test]
fn test_failed_file_reaches_no_sink() {
    common::init_logger();
    let src = "class Good {\n}\nclass Bad {\n    int f() {\n        return \"no\"\n    }\n}\n";
    let mut session = Session::new(Config::default());
    let mut sink = MemorySink::new();
    let err = session.compile_into(Path::new("p/Mixed.ktj"), src, &mut sink).unwrap_err();
    assert_eq!(err.location().map(|l| l.line), Some(5));
    assert!(sink.units.is_empty());

    let count = session.compile_into(Path::new("p/Good.ktj"), "class Good {\n}\n", &mut sink).unwrap();
    assert_eq!(count, 1);
    assert_eq!(sink.units[0].internal_name, "p/Good");
}

#[test]
fn test_major_version_from_config() {
    common::init_logger();
    let config = Config::default().with_major_version(50).with_debug(true);
    let units = ktjc::compile(Path::new("p/A.ktj"), "class A {\n}\n", &config).unwrap();
    assert_eq!(units[0].class_file.major_version, 50);
    assert_eq!(units[0].class_file.source_file(), Some("A.ktj"));
}
