//! End-to-end mapping tests over the order domain
//!
//! These tests exercise member conversion, enum and string rules, collection
//! reshaping and mapping into existing instances through the public API.


use chrono::{TimeZone, Utc};
use shapeshift_core::{
    Collection, CollectionKind, EnumValue, Error, ErrorKind, ObjectRef, TypeRef, Value,
};
use test_support::{domain, order};

fn object(value: &Value) -> &ObjectRef {
    value.as_object().expect("expected an object")
}

fn collection(value: &Value) -> &Collection {
    value.as_collection().expect("expected a collection")
}

#[test]
fn test_order_to_dto_renders_strings() {
    let domain = domain();
    let mapper = domain.mapper();

    let dto = mapper
        .map(&Value::Object(order(&domain)), &domain.order_dto)
        .expect("mapping should succeed");
    let dto = object(&dto);

    assert_eq!(dto.type_ref(), &domain.order_dto);
    assert_eq!(dto.field("id"), Value::from("1001"));
    assert_eq!(dto.field("status"), Value::from("Shipped"));
    assert_eq!(dto.field("placed"), Value::from("2024-03-01T12:30:00+00:00"));
    assert_eq!(dto.field("note"), Value::Null);

    let customer = dto.field("customer");
    let customer = object(&customer);
    assert_eq!(customer.type_ref(), &domain.customer_dto);
    assert_eq!(customer.field("id"), Value::from("42"));
    assert_eq!(customer.field("email"), Value::from("ada@example.com"));
}

#[test]
fn test_order_to_dto_reshapes_collections() {
    let domain = domain();
    let mapper = domain.mapper();

    let dto = mapper
        .map(&Value::Object(order(&domain)), &domain.order_dto)
        .unwrap();
    let dto = object(&dto);

    let lines = dto.field("lines");
    let lines = collection(&lines);
    assert_eq!(lines.kind(), CollectionKind::Array);
    let items = lines.elements().unwrap();
    assert_eq!(items.len(), 2);
    let first = object(&items[0]);
    assert_eq!(first.type_ref(), &domain.line_dto);
    assert_eq!(first.field("quantity"), Value::I64(2));
    assert_eq!(first.field("price"), Value::from("9.5"));
    assert_eq!(object(&items[1]).field("price"), Value::from("20"));

    let tags = dto.field("tags");
    let tags = collection(&tags);
    assert_eq!(tags.kind(), CollectionKind::Set);
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&Value::from("gift")));
    assert!(tags.contains(&Value::from("priority")));

    let totals = dto.field("totals");
    let totals = collection(&totals);
    assert_eq!(totals.lookup(&Value::from("net")), Some(&Value::from("39")));
    assert_eq!(totals.lookup(&Value::from("tax")), Some(&Value::from("7.5")));
}

#[test]
fn test_dto_round_trip_parses_strings() {
    let domain = domain();
    let mapper = domain.mapper();
    let original = order(&domain);

    let dto = mapper
        .map(&Value::Object(original.clone()), &domain.order_dto)
        .unwrap();
    let back = mapper.map(&dto, &domain.order).unwrap();
    let back = object(&back);

    assert!(!back.ptr_eq(&original));
    assert_eq!(back.field("id"), Value::I64(1001));
    assert_eq!(
        back.field("status"),
        Value::Enum(EnumValue::new(domain.status.clone(), 1))
    );
    assert_eq!(
        back.field("placed"),
        Value::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
    );

    let customer = back.field("customer");
    assert_eq!(object(&customer).field("id"), Value::I64(42));

    let lines = back.field("lines");
    let lines = collection(&lines);
    assert_eq!(lines.kind(), CollectionKind::List);
    assert_eq!(object(&lines.elements().unwrap()[0]).field("price"), Value::F64(9.5));

    let totals = back.field("totals");
    assert_eq!(
        collection(&totals).lookup(&Value::from("tax")),
        Some(&Value::F64(7.5))
    );
}

#[test]
fn test_copy_is_deep() {
    let domain = domain();
    let mapper = domain.mapper();
    let original = order(&domain);

    let copy = mapper
        .copy(&Value::Object(original.clone()), &domain.order, None)
        .unwrap();
    let copy = object(&copy);

    assert!(!copy.ptr_eq(&original));
    assert_eq!(copy.field("id"), original.field("id"));
    assert_eq!(copy.field("status"), original.field("status"));
    assert_eq!(copy.field("placed"), original.field("placed"));

    let copied_customer = copy.field("customer");
    let source_customer = original.field("customer");
    assert!(!object(&copied_customer).ptr_eq(object(&source_customer)));
    assert_eq!(object(&copied_customer).field("name"), Value::from("Ada Lovelace"));

    let lines = copy.field("lines");
    let copied_line = object(&collection(&lines).elements().unwrap()[1]);
    assert_eq!(copied_line.field("sku"), Value::from("B-2"));
    assert_eq!(copied_line.field("price"), Value::F64(20.0));

    let tags = copy.field("tags");
    assert_eq!(collection(&tags).len(), 3);
}

#[test]
fn test_enum_conversions() {
    let domain = domain();
    let mapper = domain.mapper();
    let delivered = Value::Enum(EnumValue::new(domain.status.clone(), 2));

    assert_eq!(
        mapper.map(&delivered, &domain.status_code).unwrap(),
        Value::Enum(EnumValue::new(domain.status_code.clone(), 2))
    );
    assert_eq!(mapper.map(&delivered, &TypeRef::I32).unwrap(), Value::I32(2));
    assert_eq!(
        mapper.map(&Value::I64(1), &domain.status).unwrap(),
        Value::Enum(EnumValue::new(domain.status.clone(), 1))
    );
    assert_eq!(
        mapper.map(&Value::from(" Pending "), &domain.status).unwrap(),
        Value::Enum(EnumValue::new(domain.status.clone(), 0))
    );
}

#[test]
fn test_string_conversions() {
    let domain = domain();
    let mapper = domain.mapper();

    assert_eq!(mapper.map(&Value::I32(-17), &TypeRef::STRING).unwrap(), Value::from("-17"));
    assert_eq!(mapper.map(&Value::Bool(true), &TypeRef::STRING).unwrap(), Value::from("true"));
    assert_eq!(mapper.map(&Value::from(" 250 "), &TypeRef::U8).unwrap(), Value::U8(250));
    assert_eq!(mapper.map(&Value::from("TRUE"), &TypeRef::BOOL).unwrap(), Value::Bool(true));
    assert_eq!(mapper.map(&Value::from("x"), &TypeRef::CHAR).unwrap(), Value::Char('x'));
    assert_eq!(mapper.map(&Value::from("2.5"), &TypeRef::F64).unwrap(), Value::F64(2.5));
}

#[test]
fn test_unparseable_string_fails_at_runtime() {
    let domain = domain();
    let mapper = domain.mapper();

    let err = mapper.map(&Value::from("abc"), &TypeRef::I32).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));
    assert_eq!(err.kind(), ErrorKind::Runtime);

    let err = mapper.map(&Value::from("Lost"), &domain.status).unwrap_err();
    assert!(matches!(err, Error::Conversion { .. }));
}

#[test]
fn test_unsupported_pair_fails_to_build() {
    let domain = domain();
    let mapper = domain.mapper();

    let customer = Value::Object(test_support::customer(&domain));
    let err = mapper.map(&customer, &TypeRef::I32).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Build);

    let list = Value::Collection(Collection::list([Value::I32(1)]));
    let err = mapper
        .map_typed(
            &list,
            &TypeRef::list(TypeRef::I32),
            &TypeRef::dictionary(TypeRef::I32, TypeRef::I32),
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Build);
    assert_eq!(mapper.cache_stats().entries, 0);
}

#[test]
fn test_null_source_members_leave_defaults() {
    let domain = domain();
    let mapper = domain.mapper();
    let dto = ObjectRef::with_fields(
        domain.order_dto.clone(),
        [("id", Value::Null), ("note", Value::Null), ("status", Value::from("Delivered"))],
    );

    let mapped = mapper.map(&Value::Object(dto), &domain.order).unwrap();
    let mapped = object(&mapped);
    assert_eq!(mapped.field("id"), Value::I64(0));
    assert_eq!(mapped.field("note"), Value::Null);
    assert_eq!(mapped.field("customer"), Value::Null);
    assert_eq!(
        mapped.field("status"),
        Value::Enum(EnumValue::new(domain.status.clone(), 2))
    );
}

#[test]
fn test_null_elements_take_element_default() {
    let domain = domain();
    let mapper = domain.mapper();
    let source = Value::Collection(Collection::list([
        Value::from("1"),
        Value::Null,
        Value::from("3"),
    ]));

    let mapped = mapper
        .map_typed(&source, &TypeRef::list(TypeRef::STRING), &TypeRef::list(TypeRef::I32), None)
        .unwrap();
    assert_eq!(
        mapped,
        Value::Collection(Collection::list([Value::I32(1), Value::I32(0), Value::I32(3)]))
    );
}

#[test]
fn test_collection_kinds() {
    let domain = domain();
    let mapper = domain.mapper();

    let sequence = Value::Collection(Collection::sequence([Value::I32(3), Value::I32(4)]));
    let array = mapper
        .map_typed(
            &sequence,
            &TypeRef::sequence(TypeRef::I32),
            &TypeRef::array(TypeRef::I64),
            None,
        )
        .unwrap();
    assert_eq!(
        array,
        Value::Collection(Collection::array([Value::I64(3), Value::I64(4)]))
    );

    let set = Value::Collection(Collection::set([Value::I32(7), Value::I32(8)]));
    let list = mapper
        .map_typed(&set, &TypeRef::set(TypeRef::I32), &TypeRef::list(TypeRef::STRING), None)
        .unwrap();
    assert_eq!(
        list,
        Value::Collection(Collection::list([Value::from("7"), Value::from("8")]))
    );

    let bag = mapper
        .map_typed(&list, &TypeRef::list(TypeRef::STRING), &TypeRef::bag(TypeRef::U16), None)
        .unwrap();
    assert_eq!(
        bag,
        Value::Collection(Collection::bag([Value::U16(7), Value::U16(8)]))
    );
}

#[test]
fn test_dictionary_skips_unmappable_keys() {
    let domain = domain();
    let mapper = domain.mapper();
    let source = Value::Collection(Collection::dictionary([
        (Value::from("1"), Value::I32(10)),
        (Value::Null, Value::I32(20)),
        (Value::from("2"), Value::I32(30)),
    ]));

    let mapped = mapper
        .map_typed(
            &source,
            &TypeRef::dictionary(TypeRef::STRING, TypeRef::I32),
            &TypeRef::dictionary(TypeRef::I64, TypeRef::I32),
            None,
        )
        .unwrap();
    let mapped = collection(&mapped);
    assert_eq!(mapped.len(), 2);
    assert_eq!(mapped.lookup(&Value::I64(1)), Some(&Value::I32(10)));
    assert_eq!(mapped.lookup(&Value::I64(2)), Some(&Value::I32(30)));
}

#[test]
fn test_nullable_members() {
    let domain = domain();
    domain
        .shapes
        .declare_object("Reading")
        .member("celsius", TypeRef::nullable(TypeRef::F32))
        .member("sensor", TypeRef::nullable(domain.status.clone()))
        .finish()
        .unwrap();
    domain
        .shapes
        .declare_object("ReadingDto")
        .member("celsius", TypeRef::F64)
        .member("sensor", TypeRef::nullable(TypeRef::STRING))
        .finish()
        .unwrap();
    let mapper = domain.mapper();

    let reading = ObjectRef::with_fields(
        TypeRef::named("Reading"),
        [("celsius", Value::F32(21.5)), ("sensor", Value::Null)],
    );
    let mapped = mapper
        .map(&Value::Object(reading), &TypeRef::named("ReadingDto"))
        .unwrap();
    let mapped = object(&mapped);
    assert_eq!(mapped.field("celsius"), Value::F64(21.5));
    assert_eq!(mapped.field("sensor"), Value::Null);
}

#[test]
fn test_map_into_reuses_nested_instances() {
    let domain = domain();
    let mapper = domain.mapper();

    let existing_customer = ObjectRef::with_fields(
        domain.customer_dto.clone(),
        [("name", Value::from("stale"))],
    );
    let target = ObjectRef::with_fields(
        domain.order_dto.clone(),
        [("customer", Value::Object(existing_customer.clone()))],
    );

    mapper
        .map_into(&Value::Object(order(&domain)), &domain.order, &target, None)
        .unwrap();

    assert_eq!(target.field("id"), Value::from("1001"));
    let customer = target.field("customer");
    assert!(object(&customer).ptr_eq(&existing_customer));
    assert_eq!(existing_customer.field("name"), Value::from("Ada Lovelace"));
}

#[test]
fn test_map_into_keeps_existing_collection_kind() {
    let domain = domain();
    let scores = domain
        .shapes
        .declare_object("Scores")
        .member("values", TypeRef::array(TypeRef::I32))
        .finish()
        .unwrap();
    let scores_dto = domain
        .shapes
        .declare_object("ScoresDto")
        .member("values", TypeRef::list(TypeRef::I64))
        .finish()
        .unwrap();
    let mapper = domain.mapper();

    let source = ObjectRef::with_fields(
        scores.clone(),
        [(
            "values",
            Value::Collection(Collection::array([Value::I32(1), Value::I32(1), Value::I32(2)])),
        )],
    );
    let target = ObjectRef::with_fields(
        scores_dto,
        [("values", Value::Collection(Collection::set([Value::I64(9)])))],
    );

    mapper
        .map_into(&Value::Object(source), &scores, &target, None)
        .unwrap();

    let values = target.field("values");
    let values = collection(&values);
    assert_eq!(values.kind(), CollectionKind::Set);
    assert_eq!(values.len(), 2);
    assert!(values.contains(&Value::I64(1)));
    assert!(values.contains(&Value::I64(2)));
    assert!(!values.contains(&Value::I64(9)));
}

#[test]
fn test_types_without_constructor_are_skipped() {
    let domain = domain();
    let frozen = domain
        .shapes
        .declare_object("Frozen")
        .member("value", TypeRef::I32)
        .without_default_constructor()
        .finish()
        .unwrap();
    let holder = domain
        .shapes
        .declare_object("Holder")
        .member("label", TypeRef::STRING)
        .member("frozen", frozen.clone())
        .finish()
        .unwrap();
    let mapper = domain.mapper();

    let source = ObjectRef::with_fields(
        holder.clone(),
        [
            ("label", Value::from("kept")),
            (
                "frozen",
                Value::Object(ObjectRef::with_fields(frozen.clone(), [("value", Value::I32(1))])),
            ),
        ],
    );
    let copy = mapper.copy(&Value::Object(source), &holder, None).unwrap();
    let copy = object(&copy);
    assert_eq!(copy.field("label"), Value::from("kept"));
    assert_eq!(copy.field("frozen"), Value::Null);
}

#[test]
fn test_declared_type_must_match_value() {
    let domain = domain();
    let mapper = domain.mapper();
    let err = mapper
        .map_typed(&Value::I32(3), &TypeRef::I64, &TypeRef::STRING, None)
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));

    let nullable = mapper
        .map_typed(&Value::I32(3), &TypeRef::nullable(TypeRef::I32), &TypeRef::STRING, None)
        .unwrap();
    assert_eq!(nullable, Value::from("3"));
}

#[test]
fn test_null_through_nullable_conversions() {
    let domain = domain();
    let mapper = domain.mapper();

    let rendered = mapper
        .map_typed(&Value::Null, &TypeRef::nullable(TypeRef::I32), &TypeRef::STRING, None)
        .unwrap();
    assert_eq!(rendered, Value::Null);

    let parsed = mapper
        .map_typed(&Value::Null, &TypeRef::STRING, &TypeRef::nullable(TypeRef::I32), None)
        .unwrap();
    assert_eq!(parsed, Value::Null);

    assert_eq!(
        mapper
            .map_typed(&Value::from("42"), &TypeRef::STRING, &TypeRef::nullable(TypeRef::I32), None)
            .unwrap(),
        Value::I32(42)
    );
}
