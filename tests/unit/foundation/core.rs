use super::*;

#[test]
fn parses_short_long_and_deep_hex() {
    assert_eq!("#000".parse::<FillColor>().unwrap(), FillColor::BLACK);
    assert_eq!(
        "#f80".parse::<FillColor>().unwrap(),
        FillColor::new(0xffff, 0x8888, 0x0000)
    );
    assert_eq!(
        "#FF3366".parse::<FillColor>().unwrap(),
        FillColor::from_rgb8(0xff, 0x33, 0x66)
    );
    assert_eq!(
        "0102a0b0c0d0".parse::<FillColor>().unwrap(),
        FillColor::new(0x0102, 0xa0b0, 0xc0d0)
    );
}

#[test]
fn rejects_bad_hex() {
    assert!("#12345".parse::<FillColor>().is_err());
    assert!("#gg0000".parse::<FillColor>().is_err());
    assert!("".parse::<FillColor>().is_err());
    // from_str_radix alone would accept a sign.
    assert!("#+f+f+f".parse::<FillColor>().is_err());
    assert!("#+ff".parse::<FillColor>().is_err());
}

#[test]
fn display_prefers_8bit_form() {
    assert_eq!(FillColor::from_rgb8(1, 2, 255).to_string(), "#0102ff");
    assert_eq!(FillColor::new(1, 2, 3).to_string(), "#000100020003");
}

#[test]
fn serde_uses_hex_strings() {
    let c: FillColor = serde_json::from_str("\"#ff0000\"").unwrap();
    assert_eq!(c, FillColor::new(0xffff, 0, 0));
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#ff0000\"");
    assert!(serde_json::from_str::<FillColor>("\"red\"").is_err());
}

#[test]
fn luma_of_gray_is_identity() {
    assert_eq!(FillColor::new(1234, 1234, 1234).luma(), 1234);
    assert_eq!(FillColor::new(SAMPLE_MAX, SAMPLE_MAX, SAMPLE_MAX).luma(), SAMPLE_MAX);
    assert_eq!(FillColor::BLACK.luma(), 0);
}

#[test]
fn positions_sort_row_major() {
    let mut v = vec![Position::new(2, 0), Position::new(0, 1), Position::new(1, 0)];
    v.sort();
    assert_eq!(
        v,
        vec![Position::new(1, 0), Position::new(2, 0), Position::new(0, 1)]
    );
    assert_eq!(Position::new(0, 0).offset(-1, 2), (-1, 2));
}
