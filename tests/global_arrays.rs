//! 2-D global arrays: zero-initialized aggregates, leading-zero GEPs, and a
//! weighted total folding both arrays together.

const SRC: &str = r#"
extern int print_int(int X);

int a[10];
int b[10][10];

int init_arrays() {
    int i;
    int j;
    i = 0;
    while (i < 10) {
        j = 0;
        while (j < 10) {
            b[i][j] = (i + 1) * (j + 1);
            j = j + 1;
        }
        a[i] = i + 1;
        i = i + 1;
    }
    return 0;
}

int vector_weighted_total() {
    int total;
    int i;
    int j;
    init_arrays();
    i = 0;
    total = 0;
    while (i < 10) {
        j = 0;
        while (j < 10) {
            total = total + a[i] * b[i][j];
            j = j + 1;
        }
        i = i + 1;
    }
    return total;
}
"#;

#[test]
fn globals_are_zero_initialized_with_common_linkage() {
    let ir = minic::compile(SRC, "global_array.c").expect("program should compile");

    assert!(ir.contains("@a = common global [10 x i32] zeroinitializer"));
    assert!(ir.contains("@b = common global [10 x [10 x i32]] zeroinitializer"));
}

#[test]
fn global_indexing_uses_the_aggregate_type() {
    let ir = minic::compile(SRC, "global_array.c").expect("program should compile");

    assert!(
        ir.contains("getelementptr [10 x i32], ptr @a, i32 0, i32 %i."),
        "in:\n{ir}"
    );
    assert!(
        ir.contains("getelementptr [10 x [10 x i32]], ptr @b, i32 0, i32 %i."),
        "in:\n{ir}"
    );
}

#[test]
fn functions_without_parameters_take_none() {
    let ir = minic::compile(SRC, "global_array.c").expect("program should compile");

    assert!(ir.contains("define i32 @init_arrays() {"));
    assert!(ir.contains("define i32 @vector_weighted_total() {"));
    assert!(ir.contains("call i32 @init_arrays()"));
}

#[test]
fn nested_loops_nest_their_blocks() {
    let ir = minic::compile(SRC, "global_array.c").expect("program should compile");

    let body = ir
        .split("define i32 @init_arrays")
        .nth(1)
        .and_then(|rest| rest.split('}').next())
        .expect("function body");

    let labels_named = |prefix: &str| {
        body.lines()
            .filter(|line| line.starts_with(prefix) && line.ends_with(':'))
            .count()
    };

    assert_eq!(2, labels_named("while.condition."));
    assert_eq!(2, labels_named("while.body."));
    assert_eq!(2, labels_named("while.end."));
    assert_eq!(2, body.matches("br i1").count());
}
