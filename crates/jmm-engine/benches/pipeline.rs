use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jmm_engine::compiler::{emit_class, lower_program};
use jmm_engine::syntax::build::*;
use jmm_engine::{checker, compile, CompilerOptions, SymbolCatalog, SyntaxNode, Type};

/// A class with `n` copies of a loop-and-branch method
fn sample_unit(n: usize) -> SyntaxNode {
    let methods = (0..n)
        .map(|i| {
            method(
                &format!("work{}", i),
                Type::int(),
                vec![param("n", Type::int())],
                vec![var_decl("i", Type::int()), var_decl("acc", Type::int())],
                vec![
                    assign("i", int(0)),
                    assign("acc", binary("*", int(6), int(7))),
                    while_loop(
                        binary("<", var("i"), var("n")),
                        block(vec![
                            if_else(
                                binary("<", var("acc"), int(1000)),
                                assign("acc", binary("+", var("acc"), var("i"))),
                                assign("acc", binary("-", var("acc"), int(1000))),
                            ),
                            assign("i", binary("+", var("i"), int(1))),
                        ]),
                    ),
                    expr_stmt(call(var("io"), "println", vec![var("acc")])),
                    ret(var("acc")),
                ],
            )
        })
        .collect();
    program(vec![import("io")], class("Bench", None, vec![], methods))
}

fn bench_check(c: &mut Criterion) {
    let tree = sample_unit(20);
    let catalog = SymbolCatalog::from_tree(&tree).unwrap();

    c.bench_function("check_20_methods", |b| {
        b.iter(|| {
            let mut tree = tree.clone();
            checker::check(black_box(&mut tree), &catalog)
        });
    });
}

fn bench_backend(c: &mut Criterion) {
    let mut tree = sample_unit(20);
    let catalog = SymbolCatalog::from_tree(&tree).unwrap();
    checker::check(&mut tree, &catalog);

    c.bench_function("lower_20_methods", |b| {
        b.iter(|| lower_program(black_box(&tree), &catalog).unwrap());
    });

    let ir = lower_program(&tree, &catalog).unwrap();
    c.bench_function("emit_20_methods", |b| {
        b.iter(|| emit_class(black_box(&ir)).unwrap());
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for size in [1usize, 10, 50] {
        let tree = sample_unit(size);
        group.bench_with_input(BenchmarkId::new("plain", size), &tree, |b, tree| {
            b.iter(|| compile(black_box(tree.clone()), &CompilerOptions::default()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("optimized", size), &tree, |b, tree| {
            let options = CompilerOptions::new().with_optimize(true);
            b.iter(|| compile(black_box(tree.clone()), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_check, bench_backend, bench_pipeline);
criterion_main!(benches);
