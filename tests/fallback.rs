use grove::{
    well_known, Container, ContainerConfig, Decorated, Inject, InjectAll, InjectFactory, InjectKeyedFactory, InjectLazy, InjectMeta,
    InjectionContext, Instance, LazyInstance, LocateRequestInfo, RegistrationBlock, TypeRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

trait Greeter: Send + Sync + std::fmt::Debug {
    fn greet(&self) -> String;
}

#[derive(Debug)]
struct Hello;

impl Greeter for Hello {
    fn greet(&self) -> String {
        "hello".into()
    }
}

#[derive(Debug)]
struct Loud(Arc<dyn Greeter>);

impl Greeter for Loud {
    fn greet(&self) -> String {
        self.0.greet().to_uppercase()
    }
}

#[derive(Debug)]
struct Exclaimed(Arc<dyn Greeter>);

impl Greeter for Exclaimed {
    fn greet(&self) -> String {
        format!("{}!", self.0.greet())
    }
}

#[test]
fn test_decorators_apply_in_registration_order() {
    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .decorator::<Loud>()
                .constructor(|Decorated(inner): Decorated<dyn Greeter>| Ok(Loud(inner)))
                .as_type(grove::upcast!(dyn Greeter));
            block
                .decorator::<Exclaimed>()
                .constructor(|Decorated(inner): Decorated<dyn Greeter>| Ok(Exclaimed(inner)))
                .as_type(grove::upcast!(dyn Greeter));
        })
        .unwrap();

    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "HELLO!");
    assert!(container.locate::<Hello>().unwrap_err().is_not_found());
}

#[test]
fn test_child_scope_decorators_wrap_parent_ones() {
    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .decorator::<Exclaimed>()
                .constructor(|Decorated(inner): Decorated<dyn Greeter>| Ok(Exclaimed(inner)))
                .as_type(grove::upcast!(dyn Greeter));
        })
        .unwrap();
    let child = container
        .clone()
        .enter()
        .with_registrations(|block| {
            block
                .decorator::<Loud>()
                .constructor(|Decorated(inner): Decorated<dyn Greeter>| Ok(Loud(inner)))
                .as_type(grove::upcast!(dyn Greeter));
        })
        .build()
        .unwrap();

    assert_eq!(child.locate::<dyn Greeter>().unwrap().greet(), "HELLO!");
    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "hello!");
}

#[test]
fn test_lazy_and_factory_parameters() {
    struct Service {
        lazy: grove::Lazy<dyn Greeter>,
        factory: grove::Factory<Counter>,
    }
    struct Counter(usize);

    let created = Arc::new(AtomicUsize::new(0));
    let container = Container::new();
    let counter = created.clone();
    container
        .configure(move |block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .export::<Counter>()
                .constructor(move || Ok(Counter(counter.fetch_add(1, Ordering::SeqCst))));
            block
                .export::<Service>()
                .constructor(|InjectLazy(lazy): InjectLazy<dyn Greeter>, InjectFactory(factory): InjectFactory<Counter>| {
                    Ok(Service { lazy, factory })
                });
        })
        .unwrap();

    let service = container.locate::<Service>().unwrap();
    assert!(!service.lazy.is_created());
    assert_eq!(service.lazy.value().unwrap().greet(), "hello");
    assert!(service.lazy.is_created());
    assert!(Arc::ptr_eq(&service.lazy.value().unwrap(), &service.lazy.value().unwrap()));

    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert_eq!(service.factory.create().unwrap().0, 0);
    assert_eq!(service.factory.create().unwrap().0, 1);
}

#[test]
fn test_keyed_factory_meta_and_all_parameters() {
    struct Service {
        keyed: grove::KeyedFactory<dyn Greeter>,
        meta: grove::Meta<dyn Greeter>,
        all: Vec<Arc<dyn Greeter>>,
    }

    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Hello>()
                .constructor(|| Ok(Hello))
                .as_type(grove::upcast!(dyn Greeter))
                .with_metadata("language", "en");
            block
                .export::<Loud>()
                .constructor(|| Ok(Loud(Arc::new(Hello))))
                .as_type(grove::upcast!(dyn Greeter))
                .with_key("loud");
            block.export::<Service>().constructor(
                |InjectKeyedFactory(keyed): InjectKeyedFactory<dyn Greeter>,
                 InjectMeta(meta): InjectMeta<dyn Greeter>,
                 InjectAll(all): InjectAll<dyn Greeter>| Ok(Service { keyed, meta, all }),
            );
        })
        .unwrap();

    let service = container.locate::<Service>().unwrap();
    assert_eq!(service.keyed.create("loud").unwrap().greet(), "HELLO");
    assert!(service.keyed.create("quiet").unwrap_err().is_not_found());
    assert_eq!(service.meta.value().greet(), "hello");
    assert!(service.meta.metadata().get("language").is_some());
    assert_eq!(service.all.len(), 2);
}

#[test]
fn test_wrapper_requests_by_type() {
    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
        })
        .unwrap();

    let greeter = TypeRef::of::<dyn Greeter>();
    let lazy = container.locate_type(&well_known::LAZY.of([greeter.clone()]).unwrap()).unwrap();
    let lazy = lazy.downcast_value::<LazyInstance>().unwrap();
    assert_eq!(lazy.value().unwrap().downcast::<dyn Greeter>().unwrap().greet(), "hello");

    let optional = container
        .locate_type(&well_known::OPTIONAL.of([TypeRef::of::<u8>()]).unwrap())
        .unwrap();
    assert!(optional.downcast_value::<Option<Instance>>().unwrap().is_none());

    let disabled = Container::with_config(ContainerConfig::default().with_auto_register_wrappers(false));
    assert!(disabled
        .locate_type(&well_known::LAZY.of([greeter]).unwrap())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_secondary_locator() {
    let container = Container::new();
    container.add_secondary_locator(|request: &LocateRequestInfo<'_>, _: &InjectionContext| {
        let greeter = TypeRef::of::<dyn Greeter>();
        (request.requested().as_type() == Some(&greeter)).then(|| Instance::from_view::<dyn Greeter>(Arc::new(Hello)))
    });

    assert_eq!(container.locate::<dyn Greeter>().unwrap().greet(), "hello");
    assert!(container.locate::<Hello>().unwrap_err().is_not_found());

    let child = container.begin_lifetime_scope();
    assert_eq!(child.locate::<dyn Greeter>().unwrap().greet(), "hello");
}

#[test]
fn test_missing_export_provider_registers_into_root() {
    let provided = Arc::new(AtomicUsize::new(0));

    let container = Container::new();
    let counter = provided.clone();
    container.add_missing_export_provider(move |request: &LocateRequestInfo<'_>, block: &mut RegistrationBlock| {
        if request.requested().as_type() == Some(&TypeRef::of::<Hello>()) {
            counter.fetch_add(1, Ordering::SeqCst);
            block.export::<Hello>().constructor(|| Ok(Hello)).singleton();
        }
    });

    let child = container.begin_lifetime_scope();
    let first = child.locate::<Hello>().unwrap();
    let second = container.locate::<Hello>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(provided.load(Ordering::SeqCst), 1);
    assert!(container.locate::<dyn Greeter>().unwrap_err().is_not_found());
}

#[test]
fn test_property_and_method_injection() {
    #[derive(Default)]
    struct Service {
        greeter: Option<Arc<dyn Greeter>>,
        calls: Vec<&'static str>,
    }

    let container = Container::new();
    container
        .configure(|block| {
            block.export::<Hello>().constructor(|| Ok(Hello)).as_type(grove::upcast!(dyn Greeter));
            block
                .export::<Service>()
                .constructor(|| Ok(Service::default()))
                .import_method(|service: &mut Service, Inject(_): Inject<dyn Greeter>| service.calls.push("method"))
                .import_property(|service: &mut Service, Inject(greeter): Inject<dyn Greeter>| {
                    service.calls.push("property");
                    service.greeter = Some(greeter);
                });
        })
        .unwrap();

    let service = container.locate::<Service>().unwrap();
    assert_eq!(service.greeter.as_ref().unwrap().greet(), "hello");
    assert_eq!(service.calls, ["property", "method"]);
}

#[test]
fn test_enrichment_and_member_exports() {
    struct Settings {
        name: Arc<String>,
    }

    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Settings>()
                .constructor(|| {
                    Ok(Settings {
                        name: Arc::new("grove".into()),
                    })
                })
                .singleton()
                .enrich_with(|settings: Arc<Settings>| {
                    Ok::<_, grove::InstantiateErrorKind>(Arc::new(Settings {
                        name: Arc::new(format!("{}-enriched", settings.name)),
                    }))
                })
                .export_member(|settings: &Settings| settings.name.clone());
        })
        .unwrap();

    let settings = container.locate::<Settings>().unwrap();
    assert_eq!(*settings.name, "grove-enriched");
    let name = container.locate::<String>().unwrap();
    assert!(Arc::ptr_eq(&name, &settings.name));
}

#[test]
fn test_activation_failure_keeps_trail() {
    #[derive(Debug)]
    struct Broken;
    #[derive(Debug)]
    struct Service(Arc<Broken>);

    let container = Container::new();
    container
        .configure(|block| {
            block
                .export::<Broken>()
                .constructor(|| Err(grove::InstantiateErrorKind::message("no connection")));
            block.export::<Service>().constructor(|Inject(broken): Inject<Broken>| Ok(Service(broken)));
        })
        .unwrap();

    let err = container.locate::<Service>().unwrap_err();
    assert!(matches!(err.kind(), grove::LocateErrorKind::Activation { .. }));
    assert!(!err.trail.is_empty());
    assert!(err.kind().to_string().contains("no connection"));
}
