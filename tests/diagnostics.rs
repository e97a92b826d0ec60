//! Every failure mode reports one positioned diagnostic of the form
//! `<line>:<column> Error: <message>` and never yields a module.

use minic::CompileError;

fn compile_err(source: &str) -> CompileError {
    minic::compile(source, "diag.c").expect_err("compilation should fail")
}

#[test]
fn lexical_error_carries_its_position() {
    let error = compile_err("int x;\nint $;\n");

    let rendered = error.to_string();
    assert!(rendered.starts_with("2:5 Error: "), "got: {rendered}");
    assert!(rendered.contains("unexpected character '$'"));
}

#[test]
fn syntactic_error_names_the_offender() {
    let error = compile_err("int f(void) { return 1 + ; }");

    let rendered = error.to_string();
    assert!(rendered.contains("Error: "), "got: {rendered}");
    assert!(matches!(error, CompileError::Parse(_)));
}

#[test]
fn illegal_assignment_target_is_a_parse_error() {
    let error = compile_err("int f(void) { 1 = 2; return 0; }");

    assert!(error
        .to_string()
        .contains("left side of assignment must be a variable or array element"));
}

#[test]
fn semantic_error_points_at_the_use_site() {
    let error = compile_err("int f(void) {\n    return missing;\n}");

    let rendered = error.to_string();
    assert!(rendered.starts_with("2:12 Error: "), "got: {rendered}");
    assert!(rendered.contains("unknown variable name 'missing'"));
}

#[test]
fn narrowing_assignment_is_reported() {
    let error = compile_err("int f(void) { int i; float x; i = x; return i; }");

    assert!(error
        .to_string()
        .contains("cannot implicitly convert 'float' to 'int'"));
}

#[test]
fn widening_assignment_is_not() {
    let ir = minic::compile(
        "float f(void) { float x; int i; i = 3; x = i; return x; }",
        "diag.c",
    )
    .expect("widening assignment compiles");

    assert!(ir.contains("sitofp i32"));
}

#[test]
fn unknown_callee_is_reported() {
    let error = compile_err("int f(void) { return missing(1); }");

    assert!(error.to_string().contains("unknown function referenced 'missing'"));
}
