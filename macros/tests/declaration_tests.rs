use anthropic_types::core::error::DataError;
use anthropic_types::core::open_enum::{KnownValue, OpenEnum};
use anthropic_types::core::record::{Record, Validate};
use anthropic_types::core::union::DiscriminatedUnion;
use anthropic_types::{api_enum, record, union};
use serde_json::{Value, json};

#[api_enum]
pub enum Shade {
    Light,
    DeepBlue,
    #[wire(rename = "ultra-violet")]
    UltraViolet,
}

#[record(tag = "paint")]
pub struct Paint {
    /// Paint colour
    pub shade: OpenEnum<Shade>,
    pub coats: Option<u8>,
    #[field(nullable)]
    pub finish: Option<String>,
    #[field(rename = "brand-name")]
    pub brand: Option<String>,
    pub r#ref: Option<String>,
}

#[record(tag = "brush")]
pub struct Brush {
    pub width_mm: u32,
}

#[record]
pub struct Untagged {
    pub note: String,
}

#[union(open)]
pub enum Supply {
    #[variant(tag = "paint")]
    Paint(Paint),
    #[variant(tag = "brush")]
    Brush(Brush),
    #[variant(unknown)]
    Unknown(Value),
}

#[union(closed, discriminator = "kind")]
pub enum Order {
    #[variant(tag = "single")]
    Single(Untagged),
    #[variant(tag = "double")]
    Double(Untagged),
}

#[union(ordered)]
pub enum Amount {
    Count(u32),
    Label(String),
    Supplies(Vec<Supply>),
}

#[test]
fn api_enum_wire_table() {
    assert_eq!(Shade::NAME, "Shade");
    assert_eq!(Shade::Light.as_str(), "light");
    assert_eq!(Shade::DeepBlue.as_str(), "deep_blue");
    assert_eq!(Shade::UltraViolet.to_string(), "ultra-violet");
    assert_eq!(Shade::from_wire("ultra-violet"), Some(Shade::UltraViolet));
    assert_eq!(Shade::from_wire("UltraViolet"), None);
    assert_eq!(Shade::VALUES.len(), 3);
}

#[test]
fn record_accessors_follow_field_kinds() {
    let paint = Paint::from_value(json!({
        "type": "paint",
        "shade": "deep_blue",
        "finish": null,
        "brand-name": "Acme",
        "ref": "P-7"
    }))
    .unwrap();

    assert_eq!(paint.shade().unwrap(), Shade::DeepBlue);
    assert_eq!(paint.coats().unwrap(), None);
    assert_eq!(paint.finish().unwrap(), None);
    assert_eq!(paint.brand().unwrap().as_deref(), Some("Acme"));
    assert_eq!(paint.r#ref().unwrap().as_deref(), Some("P-7"));
    assert_eq!(paint.kind(), Some("paint"));
    assert!(paint.validate().is_ok());
}

#[test]
fn nullable_fields_are_required_keys() {
    let paint = Paint::from_value(json!({ "type": "paint", "shade": "light" })).unwrap();
    assert!(matches!(
        paint.finish(),
        Err(DataError::MissingRequiredField(key)) if key == "finish"
    ));
}

#[test]
fn setters_and_clearers() {
    let mut paint = Paint::default();
    paint.set_shade(Shade::Light).unwrap();
    paint.set_coats(2u8).unwrap();
    paint.set_finish(None).unwrap();
    paint.set_ref("P-1").unwrap();
    assert_eq!(
        paint.to_json(),
        r#"{"type":"paint","shade":"light","coats":2,"finish":null,"ref":"P-1"}"#
    );

    paint.clear_coats();
    paint.set_finish(Some("matte".to_string())).unwrap();
    assert_eq!(
        paint.to_json(),
        r#"{"type":"paint","shade":"light","finish":"matte","ref":"P-1"}"#
    );
}

#[test]
fn untagged_records_default_empty() {
    assert_eq!(Untagged::default().to_json(), "{}");
}

#[test]
fn tagged_records_check_their_tag() {
    let brush = Brush::from_value(json!({ "type": "paint", "width_mm": 4 })).unwrap();
    assert!(matches!(
        brush.check_shape(),
        Err(DataError::TagMismatch { expected: "brush", .. })
    ));
}

#[test]
fn open_union_generated_surface() {
    assert_eq!(<Supply as DiscriminatedUnion>::TAGS, &["paint", "brush"]);

    let supply = Supply::decode(json!({ "type": "brush", "width_mm": 12 }));
    assert!(supply.is_brush());
    assert_eq!(supply.as_brush().unwrap().width_mm().unwrap(), 12);
    assert_eq!(supply.discriminator(), Some("brush"));
    assert!(supply.as_paint().is_none());

    let raw = json!({ "type": "roller", "length": 3 });
    let unknown = Supply::decode(raw.clone());
    assert_eq!(unknown.as_unknown(), Some(&raw));
    assert_eq!(unknown.discriminator(), Some("roller"));

    let built: Supply = Brush::default().into();
    assert!(built.is_brush());
}

#[test]
fn closed_union_custom_discriminator() {
    assert_eq!(<Order as DiscriminatedUnion>::DISCRIMINATOR, "kind");

    let order: Order = serde_json::from_value(json!({ "kind": "double", "note": "x" })).unwrap();
    assert!(order.is_double());
    assert_eq!(order.discriminator(), Some("double"));

    let err = Order::decode(json!({ "type": "single", "note": "x" })).unwrap_err();
    assert!(matches!(err, DataError::NoMatchingVariant { discriminator: None, .. }));
}

#[test]
fn ordered_union_follows_declaration_order() {
    assert_eq!(Amount::decode(json!(3)).unwrap(), Amount::Count(3));
    assert_eq!(
        Amount::decode(json!("three")).unwrap(),
        Amount::Label("three".to_string())
    );

    let supplies = Amount::decode(json!([{ "type": "brush", "width_mm": 1 }])).unwrap();
    assert!(supplies.as_supplies().unwrap()[0].is_brush());

    let err = Amount::decode(json!({ "count": 3 })).unwrap_err();
    let tried: Vec<_> = err.attempts().iter().map(|a| a.variant).collect();
    assert_eq!(tried, vec!["Count", "Label", "Supplies"]);
}

#[test]
fn unions_serialize_as_their_member() {
    let amount = Amount::Label("five".to_string());
    assert_eq!(serde_json::to_string(&amount).unwrap(), r#""five""#);

    let supply = Supply::Unknown(json!({ "type": "tape" }));
    assert_eq!(serde_json::to_string(&supply).unwrap(), r#"{"type":"tape"}"#);
}

#[test]
fn validate_descends_through_unions() {
    let amount = Amount::Supplies(vec![Supply::Unknown(json!({ "type": "tape" }))]);
    assert!(amount.check_shape().is_ok());
    assert!(matches!(
        amount.validate(),
        Err(DataError::UnknownVariantRejected { union: "Supply", .. })
    ));
}
