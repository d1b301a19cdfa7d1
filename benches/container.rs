#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use grove::{Container, Inject};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA(Arc<CAAAA>);
struct CAAAA(Arc<CAAAAA>);
struct CAAAAA;

fn configure_chain(container: &Container, singleton_leaf: bool, finalizers: bool) {
    container
        .configure(|block| {
            let leaf = block.export::<CAAAAA>().constructor(|| Ok(CAAAAA));
            let leaf = if singleton_leaf { leaf.singleton() } else { leaf };
            if finalizers {
                leaf.disposal(|_: Arc<CAAAAA>| {});
            }
            block
                .export::<CAAAA>()
                .constructor(|Inject(caaaaa): Inject<CAAAAA>| Ok(CAAAA(caaaaa)));
            block
                .export::<CAAA>()
                .constructor(|Inject(caaaa): Inject<CAAAA>| Ok(CAAA(caaaa)));
            block.export::<CAA>().constructor(|Inject(caaa): Inject<CAAA>| Ok(CAA(caaa)));
            block.export::<CA>().constructor(|Inject(caa): Inject<CAA>| Ok(CA(caa)));
            block.export::<C>().constructor(|Inject(ca): Inject<CA>| Ok(C(ca)));
            let b = block.export::<B>().constructor(|| Ok(B(2)));
            if finalizers {
                b.disposal(|_: Arc<B>| {});
            }
            let a = block
                .export::<A>()
                .constructor(|Inject(b): Inject<B>, Inject(c): Inject<C>| Ok(A(b, c)));
            if finalizers {
                a.disposal(|_: Arc<A>| {});
            }
        })
        .unwrap();
}

#[inline]
fn container_new_with_registrations() -> Container {
    let container = Container::new();
    configure_chain(&container, false, true);
    container
}

#[inline]
fn container_child_scopes(root: &Container) {
    let app = root.clone().enter().with_name("app").build().unwrap();
    let session = app.enter().with_name("session").build().unwrap();
    let request = session.enter().with_name("request").build().unwrap();
    let action = request.enter().with_name("action").build().unwrap();
    let _ = action.enter().with_name("step").build().unwrap();
}

#[inline]
fn container_lifetime_scopes(root: &Container) {
    let app = root.begin_lifetime_scope();
    let session = app.begin_lifetime_scope();
    let request = session.begin_named_lifetime_scope("request");
    let _ = request.begin_lifetime_scope();
}

#[inline]
fn container_locate(container: &Container) {
    let _ = container.locate::<A>().unwrap();
}

#[inline]
fn container_close(root: &Container) {
    let scope = root.begin_lifetime_scope();
    let _ = scope.locate::<A>().unwrap();

    scope.close().unwrap();
}

fn criterion_benchmark(c: &mut Criterion) {
    let empty = Container::new();
    let transients = Container::new();
    configure_chain(&transients, false, false);
    let with_singleton = Container::new();
    configure_chain(&with_singleton, true, false);
    let with_finalizers = Container::new();
    configure_chain(&with_finalizers, false, true);

    c.bench_function("container_new_with_registrations", |b| {
        b.iter(container_new_with_registrations)
    })
    .bench_function("container_child_scopes", |b| b.iter(|| container_child_scopes(&empty)))
    .bench_function("container_lifetime_scopes", |b| b.iter(|| container_lifetime_scopes(&empty)))
    .bench_function("container_locate", |b| b.iter(|| container_locate(&transients)))
    .bench_function("container_locate_with_singleton", |b| {
        b.iter(|| container_locate(&with_singleton))
    })
    .bench_function("container_close", |b| b.iter(|| container_close(&with_finalizers)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
