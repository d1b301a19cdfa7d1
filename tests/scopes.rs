use grove::{Container, Inject, LocateErrorKind};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

struct Dependency;

struct Service {
    with_dependency: bool,
}

fn configure_service(container: &Container) {
    container
        .configure(|block| {
            block
                .export::<Service>()
                .constructor(|| Ok(Service { with_dependency: false }))
                .constructor(|Inject(_): Inject<Dependency>| Ok(Service { with_dependency: true }));
        })
        .unwrap();
}

fn child_with_dependency(container: &Container) -> Container {
    container
        .clone()
        .enter()
        .with_name("child")
        .with_registrations(|block| {
            block.export::<Dependency>().constructor(|| Ok(Dependency));
        })
        .build()
        .unwrap()
}

#[test]
fn test_constructor_is_selected_per_scope_child_first() {
    let container = Container::new();
    configure_service(&container);
    let child = child_with_dependency(&container);

    assert!(child.locate::<Service>().unwrap().with_dependency);
    assert!(!container.locate::<Service>().unwrap().with_dependency);
    assert!(child.locate::<Service>().unwrap().with_dependency);
}

#[test]
fn test_constructor_is_selected_per_scope_root_first() {
    let container = Container::new();
    configure_service(&container);
    let child = child_with_dependency(&container);

    assert!(!container.locate::<Service>().unwrap().with_dependency);
    assert!(child.locate::<Service>().unwrap().with_dependency);
    assert!(!container.locate::<Service>().unwrap().with_dependency);
}

#[test]
fn test_constructor_selection_follows_new_registrations() {
    let container = Container::new();
    configure_service(&container);

    assert!(!container.locate::<Service>().unwrap().with_dependency);
    container
        .configure(|block| {
            block.export::<Dependency>().constructor(|| Ok(Dependency));
        })
        .unwrap();
    assert!(container.locate::<Service>().unwrap().with_dependency);
}

#[test]
fn test_closed_scope_drops_cached_instances() {
    #[derive(Debug)]
    struct PerScope;

    let disposed = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let counter = disposed.clone();
    container
        .configure(move |block| {
            block
                .export::<PerScope>()
                .constructor(|| Ok(PerScope))
                .singleton_per_scope()
                .disposal(move |_: Arc<PerScope>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
        })
        .unwrap();

    let scope = container.clone().enter().with_name("request").build().unwrap();
    let first = scope.locate::<PerScope>().unwrap();
    assert!(Arc::ptr_eq(&first, &scope.locate::<PerScope>().unwrap()));

    scope.close().unwrap();
    assert_eq!(disposed.load(Ordering::SeqCst), 1);

    let err = scope.locate::<PerScope>().unwrap_err();
    assert!(matches!(err.kind(), LocateErrorKind::ScopeClosed { scope: Some(name) } if &**name == "request"));
    assert!(matches!(
        scope.locate_all::<PerScope>().unwrap_err().kind(),
        LocateErrorKind::ScopeClosed { .. }
    ));

    let fresh = container.locate::<PerScope>().unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
}

#[test]
fn test_closed_root_stops_serving_singletons_to_children() {
    #[derive(Debug)]
    struct Shared;

    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Shared>().constructor(|| Ok(Shared)).singleton();
        })
        .unwrap();
    let child = container.begin_lifetime_scope();
    child.locate::<Shared>().unwrap();

    container.close().unwrap();
    let err = child.locate::<Shared>().unwrap_err();
    assert!(matches!(err.kind(), LocateErrorKind::ScopeClosed { scope: None }));
}
