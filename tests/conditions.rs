use grove::{
    metadata_filter, ConditionContext, Container, ContainerConfig, ExportEnvironment, Inject, InjectOptional, LocateOptions, MetadataValue,
    RequestTimeCondition,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

trait Greeter: Send + Sync + std::fmt::Debug {
    fn greet(&self) -> &'static str;
}

#[derive(Debug)]
struct Hello;
#[derive(Debug)]
struct Formal;

impl Greeter for Hello {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

impl Greeter for Formal {
    fn greet(&self) -> &'static str {
        "good evening"
    }
}

struct Lobby(Arc<dyn Greeter>);
struct Reception(Arc<dyn Greeter>);

#[test]
fn test_when_injected_into() {
    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .when_injected_into::<Reception>();
            block
                .export::<Lobby>()
                .constructor(|Inject(greeter): Inject<dyn Greeter>| Ok(Lobby(greeter)));
            block
                .export::<Reception>()
                .constructor(|Inject(greeter): Inject<dyn Greeter>| Ok(Reception(greeter)));
        })
        .unwrap();

    assert_eq!(container.locate::<Lobby>().unwrap().0.greet(), "hello");
    assert_eq!(container.locate::<Reception>().unwrap().0.greet(), "good evening");
    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "hello");
}

#[test]
fn test_when_member_named() {
    struct Desk(Arc<dyn Greeter>, Arc<dyn Greeter>);

    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .when_member_named("formal");
            block
                .export::<Desk>()
                .constructor(|Inject(casual): Inject<dyn Greeter>, Inject(formal): Inject<dyn Greeter>| Ok(Desk(casual, formal)))
                .with_ctor_param(1, |param| param.named("formal"));
        })
        .unwrap();

    let desk = container.locate::<Desk>().unwrap();
    assert_eq!(desk.0.greet(), "hello");
    assert_eq!(desk.1.greet(), "good evening");
}

#[test]
fn test_request_time_condition() {
    let formal_hours = Arc::new(AtomicBool::new(false));

    let container = Container::new();
    let flag = formal_hours.clone();
    container
        .configure(move |block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .when(RequestTimeCondition(move |_: &ConditionContext<'_>| flag.load(Ordering::SeqCst)));
        })
        .unwrap();

    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "hello");
    formal_hours.store(true, Ordering::SeqCst);
    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "good evening");
}

#[test]
fn test_priority_wins_over_registration_order() {
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .with_priority(10);
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
        })
        .unwrap();

    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "good evening");
    let all = container.locate_all::<dyn Greeter>().unwrap();
    assert_eq!(all.iter().map(|greeter| greeter.greet()).collect::<Vec<_>>(), ["good evening", "hello"]);
}

#[test]
fn test_keyed_exports() {
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Hello>()
                .constructor(|| Ok(Hello))
                .as_type(grove::upcast!(dyn Greeter))
                .with_key("casual");
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .with_key("formal");
        })
        .unwrap();

    assert_eq!(container.locate_keyed::<dyn Greeter>("casual").unwrap().greet(), "hello");
    assert_eq!(container.locate_keyed::<dyn Greeter>("formal").unwrap().greet(), "good evening");
    assert!(container.locate_keyed::<dyn Greeter>("other").unwrap_err().is_not_found());
    assert!(container.locate::<dyn Greeter>().unwrap_err().is_not_found());
    assert_eq!(container.locate_all::<dyn Greeter>().unwrap().len(), 2);
}

#[test]
fn test_keyed_constructor_parameter() {
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .with_key("formal");
            block
                .export::<Reception>()
                .constructor(|Inject(greeter): Inject<dyn Greeter>| Ok(Reception(greeter)))
                .with_ctor_param(0, |param| param.with_key("formal"));
        })
        .unwrap();

    assert_eq!(container.locate::<Reception>().unwrap().0.greet(), "good evening");
}

#[test]
fn test_metadata_filter() {
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Hello>()
                .constructor(|| Ok(Hello))
                .as_type(grove::upcast!(dyn Greeter))
                .with_metadata("tone", "casual");
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .with_metadata("tone", "formal");
        })
        .unwrap();

    let casual = container
        .locate_with::<dyn Greeter>(LocateOptions::new().with_filter(metadata_filter("tone", "casual")))
        .unwrap();
    assert_eq!(casual.greet(), "hello");

    let formal = container
        .locate_all_with::<dyn Greeter>(LocateOptions::new().with_filter(metadata_filter("tone", "formal")))
        .unwrap();
    assert_eq!(formal.len(), 1);
    assert_eq!(formal[0].greet(), "good evening");

    let meta = container.meta::<dyn Greeter>().unwrap();
    assert_eq!(meta.value().greet(), "good evening");
    assert_eq!(meta.metadata().get("tone"), Some(&MetadataValue::from("formal")));
}

#[test]
fn test_environment() {
    let container = Container::with_config(ContainerConfig::default().with_environment(ExportEnvironment::UNIT_TEST));
    container
        .configure(|block| {
            block
                .export::<Hello>()
                .constructor(|| Ok(Hello))
                .as_type(grove::upcast!(dyn Greeter))
                .in_environment(ExportEnvironment::RUN_TIME);
            block
                .export::<Formal>()
                .constructor(|| Ok(Formal))
                .as_type(grove::upcast!(dyn Greeter))
                .in_environment(ExportEnvironment::UNIT_TEST | ExportEnvironment::DESIGN_TIME)
                .with_priority(-1);
        })
        .unwrap();

    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "good evening");
    assert_eq!(container.locate_all::<dyn Greeter>().unwrap().len(), 1);
}

#[test]
fn test_optional_and_default_parameters() {
    struct Port(u16);
    struct Server(Option<Arc<dyn Greeter>>, Arc<Port>);

    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Server>()
                .constructor(|InjectOptional(greeter): InjectOptional<dyn Greeter>, Inject(port): Inject<Port>| {
                    Ok(Server(greeter, port))
                })
                .with_ctor_param(1, |param| param.with_default(Port(8080)));
        })
        .unwrap();

    let server = container.locate::<Server>().unwrap();
    assert!(server.0.is_none());
    assert_eq!(server.1 .0, 8080);
}
