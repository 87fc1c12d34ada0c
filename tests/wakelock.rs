mod support;

use classlint::detectors::wakelock::{MSG_NOT_ALWAYS_REACHED, MSG_NO_RELEASE};
use classlint::diagnostics::render_report;
use support::{MethodBuilder, class, scan};

#[test]
fn acquire_with_no_release_anywhere_gets_the_class_scoped_diagnostic() {
    let c = class(
        "test/pkg/WakelockActivity1",
        "WakelockActivity1.java",
        vec![
            MethodBuilder::new("onCreate")
                .at_line(15)
                .acquire(0)
                .ret()
                .build(),
        ],
    );

    let diags = scan(&c);
    assert_eq!(diags.len(), 1);
    assert_eq!(
        render_report(&diags),
        format!("WakelockActivity1.java:15: Warning: {MSG_NO_RELEASE}")
    );
}

#[test]
fn release_only_in_late_lifecycle_callback_gets_the_pairing_diagnostic() {
    let c = class(
        "test/pkg/WakelockActivity2",
        "WakelockActivity2.java",
        vec![
            MethodBuilder::new("onCreate")
                .at_line(10)
                .acquire(0)
                .ret()
                .build(),
            MethodBuilder::new("onDestroy")
                .at_line(13)
                .release(0)
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        "WakelockActivity2.java:13: Warning: Wakelocks should be released in onPause, not onDestroy"
    );
}

#[test]
fn branch_that_skips_the_release_flags_the_acquire() {
    let c = class(
        "test/pkg/WakelockActivity3",
        "WakelockActivity3.java",
        vec![
            MethodBuilder::new("enable")
                .at_line(13)
                .acquire(0)
                .branch(4)
                .release(0)
                .ret()
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("WakelockActivity3.java:13: Warning: {MSG_NOT_ALWAYS_REACHED}")
    );
}

#[test]
fn straight_line_release_before_return_is_clean() {
    let c = class(
        "test/pkg/Held",
        "Held.java",
        vec![MethodBuilder::new("run").acquire(0).release(0).ret().build()],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn release_textually_before_the_acquire_does_not_count() {
    let c = class(
        "test/pkg/Flip",
        "Flip.java",
        vec![
            MethodBuilder::new("flip")
                .at_line(8)
                .release(0)
                .at_line(9)
                .acquire(0)
                .ret()
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("Flip.java:9: Warning: {MSG_NOT_ALWAYS_REACHED}")
    );
}

#[test]
fn release_reached_on_both_normal_and_exceptional_edges_is_clean() {
    // acquire; try { work() } ... release() — the handler entry and the
    // normal fall-through both land on the release block.
    let c = class(
        "test/pkg/Finally",
        "Finally.java",
        vec![
            MethodBuilder::new("hold")
                .at_line(10)
                .acquire(0)
                .call("test/pkg/Worker", "work")
                .goto(3)
                .at_line(12)
                .release(0)
                .ret()
                .try_range(1, 2, 3)
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn release_missing_on_the_exceptional_edge_flags_the_acquire() {
    // The handler rethrows without releasing, so the exceptional path
    // reaches an abrupt exit with the lock held.
    let c = class(
        "test/pkg/Leaky",
        "Leaky.java",
        vec![
            MethodBuilder::new("hold")
                .at_line(20)
                .acquire(0)
                .call("test/pkg/Worker", "work")
                .release(0)
                .ret()
                .throw(9)
                .try_range(1, 2, 4)
                .build(),
        ],
    );

    assert_eq!(
        render_report(&scan(&c)),
        format!("Leaky.java:20: Warning: {MSG_NOT_ALWAYS_REACHED}")
    );
}

#[test]
fn diamond_where_both_arms_release_is_clean() {
    let c = class(
        "test/pkg/Diamond",
        "Diamond.java",
        vec![
            MethodBuilder::new("run")
                .acquire(0)
                .branch(4)
                .release(0)
                .ret()
                .release(0)
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn release_inside_a_loop_body_terminates_and_is_clean() {
    let c = class(
        "test/pkg/Loopy",
        "Loopy.java",
        vec![
            MethodBuilder::new("spin")
                .acquire(0)
                .release(0)
                .branch(1)
                .ret()
                .build(),
        ],
    );
    assert!(scan(&c).is_empty());
}

#[test]
fn six_flagged_acquires_report_in_ascending_line_order() {
    fn leaky(name: &str, line: u32) -> classlint::model::Method {
        MethodBuilder::new(name)
            .at_line(line)
            .acquire(0)
            .branch(3)
            .release(0)
            .ret()
            .build()
    }

    let c = class(
        "test/pkg/WakelockActivity6",
        "WakelockActivity6.java",
        vec![
            leaky("a", 19),
            leaky("b", 28),
            leaky("c", 65),
            leaky("d", 11),
            leaky("e", 42),
            leaky("f", 57),
        ],
    );

    let diags = scan(&c);
    assert_eq!(diags.len(), 6);
    let expected: Vec<String> = [11, 19, 28, 42, 57, 65]
        .iter()
        .map(|line| format!("WakelockActivity6.java:{line}: Warning: {MSG_NOT_ALWAYS_REACHED}"))
        .collect();
    assert_eq!(render_report(&diags), expected.join("\n"));
}
