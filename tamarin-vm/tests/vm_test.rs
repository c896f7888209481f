// tamarin-vm - VM end-to-end tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use tamarin_parser::parse;
use tamarin_vm::{Compiler, VM, Value};

/// Compile and run a program, asserting the stack drains, and return the
/// last popped value.
fn run(source: &str) -> Value {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);

    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile error");

    let mut vm = VM::new(compiler.bytecode());
    vm.run().expect("vm error");
    assert_eq!(vm.stack_pointer(), 0, "stack not drained for {:?}", source);
    vm.last_popped_stack_elem()
}

fn run_inspect(source: &str) -> String {
    run(source).inspect()
}

#[test]
fn test_integer_arithmetic() {
    let cases = [
        ("1", 1),
        ("2", 2),
        ("1 + 2", 3),
        ("1 - 2", -1),
        ("1 * 2", 2),
        ("4 / 2", 2),
        ("50 / 2 * 2 + 10 - 5", 55),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("2 * 2 * 2 * 2 * 2", 32),
        ("5 * 2 + 10", 20),
        ("5 + 2 * 10", 25),
        ("5 * (2 + 10)", 60),
        ("-5", -5),
        ("-10", -10),
        ("-50 + 100 + -50", 0),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ("-7 / 2", -3),
        ("7 / -2", -3),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Integer(expected), "source: {}", source);
    }
}

#[test]
fn test_boolean_expressions() {
    let cases = [
        ("true", true),
        ("false", false),
        ("1 < 2", true),
        ("1 > 2", false),
        ("1 < 1", false),
        ("1 > 1", false),
        ("1 == 1", true),
        ("1 != 1", false),
        ("1 == 2", false),
        ("1 != 2", true),
        ("true == true", true),
        ("false == false", true),
        ("true == false", false),
        ("true != false", true),
        ("false != true", true),
        ("(1 < 2) == true", true),
        ("(1 < 2) == false", false),
        ("(1 > 2) == true", false),
        ("(1 > 2) == false", true),
        ("!true", false),
        ("!false", true),
        ("!5", false),
        ("!!true", true),
        ("!!false", false),
        ("!!5", true),
        ("!(if (false) { 5; })", true),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Boolean(expected), "source: {}", source);
    }
}

#[test]
fn test_conditionals() {
    let cases = [
        ("if (true) { 10 }", Value::Integer(10)),
        ("if (true) { 10 } else { 20 }", Value::Integer(10)),
        ("if (false) { 10 } else { 20 }", Value::Integer(20)),
        ("if (1) { 10 }", Value::Integer(10)),
        ("if (1 < 2) { 10 }", Value::Integer(10)),
        ("if (1 < 2) { 10 } else { 20 }", Value::Integer(10)),
        ("if (1 > 2) { 10 } else { 20 }", Value::Integer(20)),
        ("if (1 > 2) { 10 }", Value::Null),
        ("if (false) { 10 }", Value::Null),
        (
            "if ((if (false) { 10 })) { 10 } else { 20 }",
            Value::Integer(20),
        ),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), expected, "source: {}", source);
    }
}

#[test]
fn test_global_let_statements() {
    let cases = [
        ("let one = 1; one", 1),
        ("let one = 1; let two = 2; one + two", 3),
        ("let one = 1; let two = one + one; one + two", 3),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Integer(expected), "source: {}", source);
    }
}

#[test]
fn test_shadowing_rebinds() {
    assert_eq!(run("let x = 1; let x = 2; x"), Value::Integer(2));
}

#[test]
fn test_string_expressions() {
    let cases = [
        (r#""tamarin""#, "tamarin"),
        (r#""tam" + "arin""#, "tamarin"),
        (r#""mon" + "key" + "banana""#, "monkeybanana"),
    ];
    for (source, expected) in cases {
        assert_eq!(run_inspect(source), expected, "source: {}", source);
    }
}

#[test]
fn test_array_literals() {
    let cases = [
        ("[]", "[]"),
        ("[1, 2, 3]", "[1,2,3]"),
        ("[1 + 2, 3 * 4, 5 + 6]", "[3,12,11]"),
    ];
    for (source, expected) in cases {
        assert_eq!(run_inspect(source), expected, "source: {}", source);
    }
}

#[test]
fn test_index_expressions() {
    let cases = [
        ("[1, 2, 3][1]", Value::Integer(2)),
        ("[1, 2, 3][0 + 2]", Value::Integer(3)),
        ("[[1, 1, 1]][0][0]", Value::Integer(1)),
        ("[1 + 2, 3 * 4, 5 + 6][1]", Value::Integer(12)),
        ("[][0]", Value::Null),
        ("[1, 2, 3][99]", Value::Null),
        ("[1][-1]", Value::Null),
        ("{1: 1, 2: 2}[1]", Value::Integer(1)),
        ("{1: 1, 2: 2}[2]", Value::Integer(2)),
        ("{1: 1}[0]", Value::Null),
        ("{}[0]", Value::Null),
        ("{true: 5}[true]", Value::Integer(5)),
        ("{false: 5}[false]", Value::Integer(5)),
        (r#"{"a": 1, "b": 2}["b"]"#, Value::Integer(2)),
        (r#"{"one": 1}["one"]"#, Value::Integer(1)),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), expected, "source: {}", source);
    }
}

#[test]
fn test_hash_values_keep_their_keys() {
    let Value::Hash(pairs) = run(r#"{"k": 10}"#) else {
        panic!("expected hash");
    };
    let pair = pairs.values().next().unwrap();
    assert_eq!(pair.key.inspect(), "k");
    assert_eq!(pair.value, Value::Integer(10));
}

#[test]
fn test_calling_functions_without_arguments() {
    let cases = [
        ("let fivePlusTen = fn() { 5 + 10; }; fivePlusTen();", 15),
        ("let one = fn() { 1; }; let two = fn() { 2; }; one() + two()", 3),
        (
            "let a = fn() { 1 }; let b = fn() { a() + 1 }; let c = fn() { b() + 1 }; c();",
            3,
        ),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Integer(expected), "source: {}", source);
    }
}

#[test]
fn test_functions_with_explicit_return() {
    let cases = [
        ("let earlyExit = fn() { return 99; 100; }; earlyExit();", 99),
        (
            "let earlyExit = fn() { return 99; return 100; }; earlyExit();",
            99,
        ),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Integer(expected), "source: {}", source);
    }
}

#[test]
fn test_functions_without_return_value() {
    let cases = [
        "let noReturn = fn() { }; noReturn();",
        "let noReturn = fn() { }; let noReturnTwo = fn() { noReturn(); }; noReturn(); noReturnTwo();",
    ];
    for source in cases {
        assert_eq!(run(source), Value::Null, "source: {}", source);
    }
}

#[test]
fn test_first_class_functions() {
    assert_eq!(
        run("let returnsOne = fn() { 1; }; let returnsOneReturner = fn() { returnsOne; }; returnsOneReturner()();"),
        Value::Integer(1)
    );
}

#[test]
fn test_calling_functions_with_bindings() {
    let cases = [
        ("let one = fn() { let one = 1; one }; one();", 1),
        (
            "let oneAndTwo = fn() { let one = 1; let two = 2; one + two; }; oneAndTwo();",
            3,
        ),
        (
            "let oneAndTwo = fn() { let one = 1; let two = 2; one + two; };
             let threeAndFour = fn() { let three = 3; let four = 4; three + four; };
             oneAndTwo() + threeAndFour();",
            10,
        ),
        (
            "let firstFoobar = fn() { let foobar = 50; foobar; };
             let secondFoobar = fn() { let foobar = 100; foobar; };
             firstFoobar() + secondFoobar();",
            150,
        ),
        (
            "let globalSeed = 50;
             let minusOne = fn() { let num = 1; globalSeed - num; };
             let minusTwo = fn() { let num = 2; globalSeed - num; };
             minusOne() + minusTwo();",
            97,
        ),
    ];
    for (source, expected) in cases {
        assert_eq!(run(source), Value::Integer(expected), "source: {}", source);
    }
}

#[test]
fn test_top_level_return() {
    // A return in the outermost frame ends the program with that value.
    let cases = [
        ("return 5;", Value::Integer(5)),
        ("let x = 10; return x * 2;", Value::Integer(20)),
        ("1; 2; return 3;", Value::Integer(3)),
        ("return 1; 2;", Value::Integer(1)),
        ("if (true) { return 5; } 10;", Value::Integer(5)),
        ("if (false) { return 5; } 10;", Value::Integer(10)),
    ];
    for (source, expected) in cases {
        // `run` also asserts the stack pointer lands back at zero.
        assert_eq!(run(source), expected, "source: {}", source);
    }
}

#[test]
fn test_function_value_inspects_as_compiled_function() {
    let inspected = run_inspect("fn() { 1 }");
    assert!(
        inspected.starts_with("CompiledFunction["),
        "got: {}",
        inspected
    );
}

#[test]
fn test_nested_ifs_inside_functions() {
    assert_eq!(
        run("let pick = fn() { if (1 < 2) { if (false) { 1 } else { 2 } } else { 3 } }; pick();"),
        Value::Integer(2)
    );
}
