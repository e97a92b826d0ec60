//! While loops: the condition re-evaluates each iteration and the exit block
//! receives control exactly when the condition fails.

const SRC: &str = r#"
int converge(int n, int a[10], int b[10]) {
    int total;
    int i;
    total = 0;
    i = 0;
    while (i < n) {
        total = total + a[i] + b[i];
        i = i + 1;
    }
    return i;
}
"#;

#[test]
fn loop_has_the_three_block_shape() {
    let ir = minic::compile(SRC, "while.c").expect("program should compile");

    assert!(ir.contains("br label %while.condition"));
    assert!(ir.contains("while.condition."));
    assert!(ir.contains("while.body."));
    assert!(ir.contains("while.end."));

    // cond → body | end
    let branch = ir
        .lines()
        .find(|line| line.contains("br i1") && line.contains("while.body"))
        .expect("conditional branch emitted");
    assert!(branch.contains("while.end"), "in: {branch}");
}

#[test]
fn body_jumps_back_to_the_condition() {
    let ir = minic::compile(SRC, "while.c").expect("program should compile");

    // one entry branch plus one back edge to the same label
    assert_eq!(2, ir.matches("br label %while.condition").count());
}

/// The instruction lines of the first block whose label starts with `prefix`.
fn block_named(ir: &str, prefix: &str) -> String {
    let lines = ir.lines().collect::<Vec<_>>();
    let start = lines
        .iter()
        .position(|line| line.starts_with(prefix) && line.ends_with(':'))
        .unwrap_or_else(|| panic!("no block labelled '{prefix}*' in:\n{ir}"));
    lines[start + 1..]
        .iter()
        .take_while(|line| !line.ends_with(':') && !line.starts_with('}'))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn condition_loads_fresh_values_each_iteration() {
    let ir = minic::compile(SRC, "while.c").expect("program should compile");

    // i and n are re-loaded from their slots inside the condition block
    let condition_block = block_named(&ir, "while.condition.");
    assert!(condition_block.contains("load i32, ptr %i.addr."), "in:\n{condition_block}");
    assert!(condition_block.contains("load i32, ptr %n.addr."), "in:\n{condition_block}");
    assert!(condition_block.contains("icmp slt i32"));
}

#[test]
fn counter_is_returned_after_exit() {
    let ir = minic::compile(SRC, "while.c").expect("program should compile");

    let end_block = block_named(&ir, "while.end.");
    assert!(end_block.contains("load i32, ptr %i.addr."), "in:\n{end_block}");
    assert!(end_block.contains("ret i32"));
}
