//! End-to-end run over a small product catalogue: a polymorphic `Product`
//! with `Book` and `Url` subtypes, one derived and one authored serializer.

use cqrs_core::{
    Error,
    backend::MemoryBackend,
    config::CqrsConfig,
    error::ConfigurationError,
    prelude::*,
    serializer::SerializerId,
    start,
    startup::Runtime,
};

const MODULE: &str = "shop.models";

fn path(name: &str) -> String {
    format!("{MODULE}.{name}")
}

fn product_models() -> Vec<EntityDecl> {
    vec![
        EntityDecl::new("shop", MODULE, "Product")
            .marker(EntityMarker::Polymorphic)
            .fields([FieldModel::int("price"), FieldModel::text("secret")]),
        EntityDecl::new("shop", MODULE, "Book")
            .base(path("Product"))
            .field(FieldModel::text("isbn")),
        EntityDecl::new("shop", MODULE, "Url")
            .base(path("Product"))
            .fields([FieldModel::text("url"), FieldModel::text("password")]),
    ]
}

struct Shop;

impl App for Shop {
    fn label(&self) -> &str {
        "shop"
    }

    fn models(&self) -> Vec<EntityDecl> {
        product_models()
    }

    fn serializers(&self) -> Vec<SerializerDef> {
        vec![
            SerializerDef::polymorphic("ProductSerializer", path("Product")).fields(["price"]),
            SerializerDef::polymorphic("UrlSerializer", path("Url"))
                .fields(["url", "password_hash"])
                .declare(DeclaredField::new("password_hash", FieldKind::Text).read_only()),
        ]
    }

    fn collections(&self) -> Vec<CollectionDef> {
        vec![CollectionDef::polymorphic("ProductCollection", path("Product"))]
    }
}

fn runtime() -> Runtime {
    start(CqrsConfig::default(), &[&Shop]).expect("shop should start")
}

fn book(id: i64) -> Instance {
    Instance::new(path("Book"), id)
        .with("price", 12)
        .with("secret", "s3")
        .with("isbn", "978-0")
}

fn url(id: i64) -> Instance {
    Instance::new(path("Url"), id)
        .with("price", 3)
        .with("secret", "s4")
        .with("url", "https://example.invalid/book")
        .with("password", "hunter2")
        .with("password_hash", "a1b2")
}

#[test]
fn authored_serializer_is_rebased_onto_the_product_serializer() {
    let runtime = runtime();
    let serializers = runtime.serializers();

    let product = serializers.for_path(&path("Product")).expect("registered");
    let url = serializers.for_path(&path("Url")).expect("registered");
    let book = serializers.for_path(&path("Book")).expect("derived");

    assert_eq!(url.base(), Some(product.id()));
    assert_eq!(book.base(), Some(product.id()));
    assert!(book.is_derived());
    assert_eq!(book.name(), "BookAutoSerializer");

    assert_eq!(
        url.field_names().collect::<Vec<_>>(),
        ["id", "type", "price", "url", "password_hash"]
    );
    assert_eq!(
        book.field_names().collect::<Vec<_>>(),
        ["id", "type", "price", "isbn"]
    );
}

#[test]
fn every_entry_point_encodes_the_same_record() {
    let runtime = runtime();
    let serializers = runtime.serializers();
    let product = serializers.for_path(&path("Product")).expect("registered");

    let expected = Record::new()
        .with("id", 1)
        .with("type", path("Url"))
        .with("price", 3)
        .with("url", "https://example.invalid/book")
        .with("password_hash", "a1b2");

    for entry in [SerializerId::POLYMORPHIC_ROOT, product.id()] {
        let record = serializers.encode(entry, &url(1)).expect("encode");
        assert_eq!(record, expected, "{entry}");
    }
    assert!(!expected.contains_key("secret"));
}

#[test]
fn documents_round_trip_through_the_backend() {
    let runtime = runtime();
    let mut sync = runtime
        .denormalizer(MemoryBackend::new(runtime.config()))
        .expect("bind");

    sync.saved(&book(7), true).expect("save book");
    sync.saved(&url(8), true).expect("save url");
    assert_eq!(sync.backend().count("shop_product"), 2);

    let decoded = sync
        .load("ProductCollection", &Value::Int(7))
        .expect("load")
        .expect("book should be stored");
    assert_eq!(runtime.entities().path(decoded.entity), path("Book"));
    assert_eq!(
        decoded.values,
        Record::new().with("price", 12).with("isbn", "978-0")
    );

    sync.deleted(&url(8)).expect("delete");
    assert_eq!(
        sync.load("ProductCollection", &Value::Int(8)).expect("load"),
        None
    );
}

#[test]
fn invalid_records_report_every_field() {
    let runtime = runtime();
    let serializers = runtime.serializers();
    let product = serializers.for_path(&path("Product")).expect("registered");

    let record = Record::new()
        .with("type", path("Url"))
        .with("price", "free");
    let err = serializers
        .decode(product.id(), &record)
        .expect_err("record is invalid");

    let errors = err.field_errors().expect("field errors");
    assert_eq!(errors.get("price"), Some(&["expected Int, got text".to_string()][..]));
    assert_eq!(errors.get("url"), Some(&["This field is required.".to_string()][..]));
    assert_eq!(errors.get("password_hash"), None);
}

#[test]
fn an_ebook_cannot_inherit_from_two_concrete_products() {
    struct Ebooks;

    impl App for Ebooks {
        fn label(&self) -> &str {
            "ebooks"
        }

        fn models(&self) -> Vec<EntityDecl> {
            vec![
                EntityDecl::new("ebooks", "ebooks.models", "EBook")
                    .base(path("Book"))
                    .base(path("Url"))
                    .field(FieldModel::text("version")),
            ]
        }
    }

    let err = start(CqrsConfig::default(), &[&Shop, &Ebooks]).expect_err("diamond");
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::MultipleConcreteBases { .. })
    ));
}
