//! Property-based tests for emitted methods
//!
//! Tests the following properties:
//! - Emitted stack limits equal the verifier's peak depth
//! - Local limits cover every IR variable
//! - Folding never grows a method
//! - Compiling the same tree twice gives the same Jasmin text

mod common;

use common::unit;
use jmm_engine::compiler::bytecode::verify_method;
use jmm_engine::syntax::build::*;
use jmm_engine::{compile, CompilerOptions, SyntaxNode, Type};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating trees
// =============================================================================

fn arb_int_leaf() -> impl Strategy<Value = SyntaxNode> {
    prop_oneof![
        (-40_000i32..40_000).prop_map(int),
        Just(var("a")),
        Just(var("b")),
        Just(var("x")),
    ]
}

/// Int expressions over the parameters, the local `x` and literals
fn arb_int_expr() -> impl Strategy<Value = SyntaxNode> {
    arb_int_leaf().prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (prop::sample::select(vec!["+", "-", "*", "/"]), inner.clone(), inner.clone())
                .prop_map(|(op, left, right)| binary(op, left, right)),
            inner.prop_map(paren),
        ]
    })
}

fn arb_bool_expr() -> impl Strategy<Value = SyntaxNode> {
    let leaf = prop_oneof![
        (arb_int_expr(), arb_int_expr()).prop_map(|(left, right)| binary("<", left, right)),
        Just(var("flag")),
        any::<bool>().prop_map(boolean),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(left, right)| binary("&&", left, right)),
            inner.prop_map(not),
        ]
    })
}

/// A method mixing assignments, an `if` and a `while` over generated
/// expressions
fn arb_method() -> impl Strategy<Value = SyntaxNode> {
    (
        arb_int_expr(),
        arb_bool_expr(),
        arb_bool_expr(),
        arb_int_expr(),
        arb_bool_expr(),
        arb_int_expr(),
    )
        .prop_map(|(init, flag, cond, then, test, step)| {
            method(
                "calc",
                Type::int(),
                vec![
                    param("a", Type::int()),
                    param("b", Type::int()),
                    param("flag", Type::boolean()),
                ],
                vec![var_decl("x", Type::int()), var_decl("ok", Type::boolean())],
                vec![
                    assign("x", init),
                    assign("ok", flag),
                    if_else(
                        cond,
                        block(vec![assign("x", then)]),
                        field_assign("count", var("x")),
                    ),
                    while_loop(test, block(vec![assign("x", step)])),
                    ret(var("x")),
                ],
            )
        })
}

// =============================================================================
// Stack and local limits
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn max_stack_matches_verifier(body in arb_method()) {
        let output = compile(unit(vec![body]), &CompilerOptions::default()).unwrap();
        for method in &output.class.methods {
            let peak = verify_method(method).unwrap();
            prop_assert_eq!(peak, u32::from(method.max_stack), "method {}", method.name);
        }
    }

    #[test]
    fn max_locals_covers_every_variable(body in arb_method()) {
        let output = compile(unit(vec![body]), &CompilerOptions::default()).unwrap();
        let ir = output.ir.method("calc").unwrap();
        let emitted = output.class.method("calc").unwrap();
        prop_assert_eq!(usize::from(emitted.max_locals), ir.vars.len());
    }
}

// =============================================================================
// Folding and determinism
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn folding_never_grows_a_method(body in arb_method()) {
        let tree = unit(vec![body]);
        let plain = compile(tree.clone(), &CompilerOptions::default()).unwrap();
        let folded = compile(tree, &CompilerOptions::new().with_optimize(true)).unwrap();

        let before = plain.class.method("calc").unwrap().instructions().count();
        let after = folded.class.method("calc").unwrap().instructions().count();
        prop_assert!(after <= before, "folded {} > plain {}", after, before);
    }

    #[test]
    fn compilation_is_deterministic(body in arb_method()) {
        let tree = unit(vec![body]);
        let first = compile(tree.clone(), &CompilerOptions::default()).unwrap();
        let second = compile(tree, &CompilerOptions::default()).unwrap();
        prop_assert_eq!(first.jasmin, second.jasmin);
    }
}
