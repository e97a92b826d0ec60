//! Leap-year logic: nested ifs, `%`, comparisons, and an extern driver hook.

const SRC: &str = r#"
// mini-c program to check whether a year is a leap year or not
extern int print_int(int X);

int is_leap(int year) {
    int isLeap;
    if (year % 4 == 0) {
        if (year % 100 == 0) {
            if (year % 400 == 0) {
                isLeap = 1;
            } else {
                isLeap = 0;
            }
        } else {
            isLeap = 1;
        }
    } else {
        isLeap = 0;
    }
    return isLeap;
}
"#;

#[test]
fn compiles_to_a_branching_module() {
    let ir = minic::compile(SRC, "leap.c").expect("program should compile");

    assert!(ir.contains("; ModuleID = 'leap.c'"));
    assert!(ir.contains("declare i32 @print_int(i32)"));
    assert!(ir.contains("define i32 @is_leap(i32 %year)"));

    // year % 4 == 0 and friends
    assert_eq!(3, ir.matches("srem i32").count());
    assert_eq!(3, ir.matches("icmp eq i32").count());

    // three nested ifs, each with an else branch
    assert_eq!(3, ir.matches("if.then").count() / 2);
    assert_eq!(3, ir.matches("if.else").count() / 2);
}

#[test]
fn every_emitted_block_has_one_terminator() {
    let ir = minic::compile(SRC, "leap.c").expect("program should compile");

    let body = ir
        .split("define i32 @is_leap")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .expect("function body");

    let mut terminators = 0;
    let mut labels = 0;
    for line in body.lines() {
        let line = line.trim();
        if line.ends_with(':') {
            labels += 1;
        }
        if line.starts_with("br ") || line.starts_with("ret ") {
            terminators += 1;
        }
    }

    assert_eq!(labels, terminators, "in:\n{body}");
}
