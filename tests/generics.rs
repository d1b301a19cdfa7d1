use grove::{
    well_known, ConditionContext, Constraint, Container, ContainerConfig, FnCondition, GenericDef, Instance, TypeArgs, TypeDescriptor,
    TypeRef,
};

trait IBasicService: Send + Sync {}

struct BasicService;

impl IBasicService for BasicService {}

/// Runtime value of every closing of `GenericClassA<T>`, holds `T`.
struct GenericClassA(TypeRef);

/// Runtime value of every closing of `GenericClassB<T>`, holds `T`.
struct GenericClassB(TypeRef);

struct Defs {
    interface: GenericDef,
    class_a: GenericDef,
    class_b: GenericDef,
}

fn configure_generic_classes(container: &Container) -> Defs {
    let defs = Defs {
        interface: GenericDef::new("IGenericClass", 1),
        class_a: GenericDef::new("GenericClassA", 1),
        class_b: GenericDef::new("GenericClassB", 1),
    };
    container
        .configure(|block| {
            block
                .export_open::<GenericClassA>(defs.class_a)
                .constructor(|TypeArgs(args): TypeArgs| Ok(GenericClassA(args[0].clone())))
                .as_type_ref(defs.interface.open())
                .when(FnCondition(|cx: &ConditionContext<'_>| {
                    cx.activation_type().args().first() == Some(&TypeRef::of::<BasicService>())
                }));
            block
                .export_open::<GenericClassB>(defs.class_b)
                .constructor(|TypeArgs(args): TypeArgs| Ok(GenericClassB(args[0].clone())))
                .as_type_ref(defs.interface.open());
        })
        .unwrap();
    defs
}

#[test]
fn test_condition_selects_generic_implementation() {
    let container = Container::new();
    let defs = configure_generic_classes(&container);

    let basic = container
        .locate_type(&defs.interface.of([TypeRef::of::<BasicService>()]).unwrap())
        .unwrap();
    let class_a = basic.downcast_value::<GenericClassA>().unwrap();
    assert_eq!(class_a.0, TypeRef::of::<BasicService>());

    let interface = container
        .locate_type(&defs.interface.of([TypeRef::of::<dyn IBasicService>()]).unwrap())
        .unwrap();
    let class_b = interface.downcast_value::<GenericClassB>().unwrap();
    assert_eq!(class_b.0, TypeRef::of::<dyn IBasicService>());
}

#[test]
fn test_locate_all_closes_every_open_export() {
    let container = Container::new();
    let defs = configure_generic_classes(&container);

    let requested = defs.interface.of([TypeRef::of::<u8>()]).unwrap();
    let all = container.locate_type(&well_known::ALL.of([requested]).unwrap()).unwrap();
    let all = all.downcast_value::<Vec<Instance>>().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].downcast_value::<GenericClassB>().is_some());
}

#[test]
fn test_constraint_failure_is_not_found() {
    struct Repository(TypeRef);

    let repository = GenericDef::new("Repository", 1);
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export_open::<Repository>(repository)
                .constructor(|TypeArgs(args): TypeArgs| Ok(Repository(args[0].clone())))
                .with_constraint(0, Constraint::ValueType);
        })
        .unwrap();

    let closed = container.locate_type(&repository.of([TypeRef::of::<u32>()]).unwrap()).unwrap();
    assert_eq!(closed.downcast_value::<Repository>().unwrap().0, TypeRef::of::<u32>());

    let err = container
        .locate_type(&repository.of([TypeRef::of::<String>()]).unwrap())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_defined_generic_constraints_apply_to_open_exports() {
    struct Handler;

    let container = Container::new();
    let handler = container.types().define_generic(
        "Handler",
        TypeDescriptor::class().with_param("TMessage", Constraint::assignable_to(TypeRef::of::<dyn IBasicService>())),
    );
    container
        .configure(|block| {
            block.describe_type::<BasicService>(TypeDescriptor::class().with_base(TypeRef::of::<dyn IBasicService>()));
            block.export_open::<Handler>(handler).constructor(|| Ok(Handler));
        })
        .unwrap();

    assert!(container.locate_type(&handler.of([TypeRef::of::<BasicService>()]).unwrap()).is_ok());
    assert!(container
        .locate_type(&handler.of([TypeRef::of::<u8>()]).unwrap())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_closed_export_beats_open_export() {
    struct Special;
    struct Fallback;

    let repository = GenericDef::new("Repository", 1);
    let container = Container::new();
    container
        .configure(|block| {
            block.export_open::<Fallback>(repository).constructor(|| Ok(Fallback));
            block
                .export::<Special>()
                .constructor(|| Ok(Special))
                .as_type_ref(repository.of([TypeRef::of::<u8>()]).unwrap());
        })
        .unwrap();

    let special = container.locate_type(&repository.of([TypeRef::of::<u8>()]).unwrap()).unwrap();
    assert!(special.downcast_value::<Special>().is_some());
    let fallback = container.locate_type(&repository.of([TypeRef::of::<u16>()]).unwrap()).unwrap();
    assert!(fallback.downcast_value::<Fallback>().is_some());

    let prefer_open = Container::with_config(ContainerConfig::default().with_prefer_open_generics(true));
    prefer_open
        .configure(|block| {
            block.export_open::<Fallback>(repository).constructor(|| Ok(Fallback));
            block
                .export::<Special>()
                .constructor(|| Ok(Special))
                .as_type_ref(repository.of([TypeRef::of::<u8>()]).unwrap());
        })
        .unwrap();
    let fallback = prefer_open.locate_type(&repository.of([TypeRef::of::<u8>()]).unwrap()).unwrap();
    assert!(fallback.downcast_value::<Fallback>().is_some());
}

#[test]
fn test_open_singleton_per_closing() {
    struct Cache(TypeRef);

    let cache = GenericDef::new("Cache", 1);
    let container = Container::new();
    container
        .configure(|block| {
            block
                .export_open::<Cache>(cache)
                .constructor(|TypeArgs(args): TypeArgs| Ok(Cache(args[0].clone())))
                .singleton();
        })
        .unwrap();

    let of_u8 = cache.of([TypeRef::of::<u8>()]).unwrap();
    let first = container.locate_type(&of_u8).unwrap();
    let second = container.locate_type(&of_u8).unwrap();
    let other = container.locate_type(&cache.of([TypeRef::of::<u16>()]).unwrap()).unwrap();

    assert!(first.ptr_eq(&second));
    assert!(!first.ptr_eq(&other));
    assert_eq!(other.downcast_value::<Cache>().unwrap().0, TypeRef::of::<u16>());
}
