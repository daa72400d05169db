use common::init_tracing;
use mini_object::{Buffer, Error, MiniObject, MiniObjectFlags, Value, ValueRegistry};

mod common;

#[test]
fn put_then_get_is_identity() -> anyhow::Result<()> {
    init_tracing();
    let obj = MiniObject::new(MiniObjectFlags::custom(4));
    let mut value = Value::default();
    value.set(&obj)?;

    let out: MiniObject = value.get()?;
    assert!(out.ptr_eq(&obj));
    assert_eq!(out.flags(), obj.flags());
    Ok(())
}

#[test]
fn buffer_through_value() -> anyhow::Result<()> {
    init_tracing();
    let buffer = Buffer::from_slice(b"payload");
    let value = Value::from_object(&buffer)?;
    assert_eq!(value.type_name(), "Buffer");

    let mut out = value.get::<Buffer>()?;
    assert_eq!(out, buffer);

    // the value still holds the original, so writing copies
    out.data_mut()?.copy_from_slice(b"PAYLOAD");
    assert_ne!(out, buffer);
    assert_eq!(value.get::<Buffer>()?.data(), b"payload");
    Ok(())
}

#[test]
fn wrong_kind_is_rejected() {
    init_tracing();
    let mut value = Value::default();
    assert_eq!(value.get::<Buffer>().unwrap_err(), Error::EmptyValue);

    value
        .set(&MiniObject::new(MiniObjectFlags::empty()))
        .unwrap();
    assert!(!value.holds::<Buffer>());
    assert!(matches!(
        value.get::<Buffer>(),
        Err(Error::TypeMismatch {
            expected: "Buffer",
            ..
        })
    ));
}

#[test]
fn separate_registry() -> anyhow::Result<()> {
    init_tracing();
    let registry = ValueRegistry::new();
    assert!(registry.register::<Buffer>());

    let buffer = Buffer::with_size(3);
    let mut value = Value::new::<Buffer>();
    registry.set(&mut value, &buffer)?;
    assert_eq!(registry.get::<Buffer>(&value)?.len(), 3);
    assert!(matches!(
        registry.get::<MiniObject>(&value),
        Err(Error::Unregistered(_))
    ));
    Ok(())
}
