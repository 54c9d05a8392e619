use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    let c: Rgba8 = serde_json::from_value(json!("#ff0000")).unwrap();
    assert_eq!(c, Rgba8::rgb(255, 0, 0));

    let c: Rgba8 = serde_json::from_value(json!("#0000FF80")).unwrap();
    assert_eq!(c, Rgba8::rgba(0, 0, 255, 128));

    let c: Rgba8 = serde_json::from_value(json!("#fa0")).unwrap();
    assert_eq!(c, Rgba8::rgb(0xff, 0xaa, 0x00));
}

#[test]
fn parses_arrays_objects_and_names() {
    let c: Rgba8 = serde_json::from_value(json!([10, 20, 30])).unwrap();
    assert_eq!(c, Rgba8::rgb(10, 20, 30));

    let c: Rgba8 = serde_json::from_value(json!([10, 20, 30, 40])).unwrap();
    assert_eq!(c, Rgba8::rgba(10, 20, 30, 40));

    let c: Rgba8 = serde_json::from_value(json!({"r": 1, "g": 2, "b": 3})).unwrap();
    assert_eq!(c, Rgba8::rgba(1, 2, 3, 255));

    let c: Rgba8 = serde_json::from_value(json!("White")).unwrap();
    assert_eq!(c, Rgba8::rgb(255, 255, 255));
}

#[test]
fn rejects_malformed_colors() {
    assert!(serde_json::from_value::<Rgba8>(json!("#12345")).is_err());
    assert!(serde_json::from_value::<Rgba8>(json!("#gg0000")).is_err());
    assert!(serde_json::from_value::<Rgba8>(json!("chartreuse-ish")).is_err());
    assert!(serde_json::from_value::<Rgba8>(json!([1, 2])).is_err());
    assert!(serde_json::from_value::<Rgba8>(json!([1, 2, 300])).is_err());
}
