mod support;

use classlint::detectors::secure_random::{MSG_CTOR_FIXED, MSG_SET_SEED_FIXED, MSG_TIME_SEED};
use classlint::diagnostics::render_report;
use classlint::model::{BinOp, Insn};
use support::{MethodBuilder, SECURE_RANDOM, SYSTEM, class, invoke, scan};

#[test]
fn literal_set_seed_is_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .konst(1, 12345)
                .at_line(14)
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:14: Warning: {MSG_SET_SEED_FIXED}")
    );
}

#[test]
fn current_time_set_seed_is_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .push(invoke(SYSTEM, "currentTimeMillis", None, vec![], Some(1)))
                .at_line(12)
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:12: Warning: {MSG_TIME_SEED}")
    );
}

#[test]
fn literal_constructor_seed_uses_the_construction_message() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("make")
                .konst(1, 12345)
                .at_line(20)
                .push(invoke(SECURE_RANDOM, "<init>", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:20: Warning: {MSG_CTOR_FIXED}")
    );
}

#[test]
fn time_after_simple_arithmetic_is_still_time_derived() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("make")
                .push(invoke(SYSTEM, "currentTimeMillis", None, vec![], Some(1)))
                .konst(2, 1000)
                .binary(BinOp::Div, 3, 1, 2)
                .at_line(31)
                .push(invoke(SECURE_RANDOM, "<init>", Some(0), vec![3], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:31: Warning: {MSG_TIME_SEED}")
    );
}

#[test]
fn constant_only_array_seed_is_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("make")
                .push(Insn::NewArray { dst: 1, length: 2 })
                .konst(2, 0)
                .konst(3, 77)
                .push(Insn::ArrayPut {
                    array: 1,
                    index: 2,
                    value: 3,
                })
                .at_line(30)
                .push(invoke(SECURE_RANDOM, "<init>", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:30: Warning: {MSG_CTOR_FIXED}")
    );
}

#[test]
fn array_holding_a_parameter_element_is_not_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("make")
                .push(Insn::NewArray { dst: 1, length: 2 })
                .konst(2, 0)
                .push(Insn::ArrayPut {
                    array: 1,
                    index: 2,
                    value: 9, // incoming argument
                })
                .push(invoke(SECURE_RANDOM, "<init>", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn parameter_seed_is_not_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![7], None))
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn field_sourced_seed_is_not_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .push(Insn::GetField {
                    dst: 1,
                    owner: "test/pkg/SecureRandomTest".to_string(),
                    field: "seed".to_string(),
                })
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn disagreeing_constants_across_a_branch_are_not_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .branch(3)
                .konst(1, 1)
                .goto(4)
                .konst(1, 2)
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn agreeing_constants_across_a_branch_are_flagged() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("seed")
                .branch(3)
                .konst(1, 7)
                .goto(4)
                .konst(1, 7)
                .at_line(28)
                .push(invoke(SECURE_RANDOM, "setSeed", Some(0), vec![1], None))
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("SecureRandomTest.java:28: Warning: {MSG_SET_SEED_FIXED}")
    );
}

#[test]
fn no_arg_constructor_is_ignored() {
    let c = class(
        "test/pkg/SecureRandomTest",
        "SecureRandomTest.java",
        vec![
            MethodBuilder::new("make")
                .push(invoke(SECURE_RANDOM, "<init>", Some(0), vec![], None))
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}
