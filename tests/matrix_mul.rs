//! Float matrix multiply through 2-D array parameters: linearized offsets on
//! decayed pointers and float arithmetic throughout.

const SRC: &str = r#"
extern float print_float(float X);

int matrix_mul(float a[10][10], float b[10][10], float c[10][10], int n) {
    int i;
    int j;
    int k;

    i = 0;
    while (i < n) {
        j = 0;
        while (j < n) {
            k = 0;
            while (k < n) {
                c[i][j] = c[i][j] + (a[i][k] * b[k][j]);
                k = k + 1;
            }
            j = j + 1;
        }
        i = i + 1;
    }

    return 0;
}
"#;

#[test]
fn float_array_parameters_decay_to_pointers() {
    let ir = minic::compile(SRC, "matrix_mul.c").expect("program should compile");

    assert!(ir.contains(
        "define i32 @matrix_mul(ptr %a, ptr %b, ptr %c, i32 %n)"
    ));
    assert!(ir.contains("declare float @print_float(float)"));
}

#[test]
fn two_dimensional_access_linearizes_the_subscripts() {
    let ir = minic::compile(SRC, "matrix_mul.c").expect("program should compile");

    // i * 10 + k, addressing float elements directly
    assert!(ir.contains("mul i32"), "in:\n{ir}");
    assert!(ir.contains("i32 10"), "in:\n{ir}");
    assert!(ir.contains("getelementptr float, ptr %a.ptr."), "in:\n{ir}");
    assert!(ir.contains("getelementptr float, ptr %b.ptr."), "in:\n{ir}");
    assert!(ir.contains("getelementptr float, ptr %c.ptr."), "in:\n{ir}");
}

#[test]
fn accumulation_is_float_arithmetic() {
    let ir = minic::compile(SRC, "matrix_mul.c").expect("program should compile");

    assert!(ir.contains("fmul float"));
    assert!(ir.contains("fadd float"));
    assert!(ir.contains("store float"));
    // index bookkeeping stays integer
    assert!(ir.contains("add i32"));
}
