use proptest::prelude::*;
use qrstudio::render::compositor::{LOGO_RATIO, PLATE_PADDING_RATIO, PLATE_RADIUS_RATIO};
use qrstudio::{
    render, ErrorCorrection, GenerationRequest, LogoGeometry, LogoImage, QrCodeEncoder, QrEncoder,
    RenderSettings, StrokeColor, StyleOptions,
};
use rstest::rstest;

fn color_strategy() -> impl Strategy<Value = StrokeColor> {
    prop_oneof![
        Just(StrokeColor::Black),
        Just(StrokeColor::Blue),
        Just(StrokeColor::Red),
    ]
}

// Identical (text, color, no logo) always renders identical bytes
proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_render_is_deterministic(
        text in "[a-zA-Z0-9:/._-]{1,64}",
        color in color_strategy()
    ) {
        let request = GenerationRequest::new(&text, color, None).unwrap();
        let settings = RenderSettings { size: 200, margin: 2 };

        let first = render(&QrCodeEncoder, &request, settings).unwrap();
        let second = render(&QrCodeEncoder, &request, settings).unwrap();

        prop_assert_eq!(first.image.png, second.image.png);
        prop_assert_eq!(first.image.error_correction, ErrorCorrection::M);
    }
}

// Whitespace-only input never produces a request
proptest! {
    #[test]
    fn test_blank_text_is_never_a_request(
        blank in "[ \t\r\n]{0,16}",
        color in color_strategy()
    ) {
        prop_assert!(GenerationRequest::new(&blank, color, None).is_none());
    }

    #[test]
    fn test_request_text_is_trimmed(
        core in "[a-z0-9]{1,20}",
        lead in "[ \t]{0,4}",
        trail in "[ \n]{0,4}"
    ) {
        let padded = format!("{}{}{}", lead, core, trail);
        let request = GenerationRequest::new(&padded, StrokeColor::Black, None).unwrap();
        prop_assert_eq!(request.text, core);
    }
}

// Encoder output is always exactly width x width
proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_encoder_output_dimensions(
        width in 16u32..600,
        margin in 0u32..6,
        text in "[a-z]{1,30}"
    ) {
        let request = GenerationRequest::new(&text, StrokeColor::Blue, None).unwrap();
        let style = StyleOptions::for_request(&request, width, margin);
        let raster = QrCodeEncoder.encode(&request.text, &style).unwrap();
        prop_assert_eq!(raster.dimensions(), (width, width));
    }
}

// Logo geometry scales with the canvas
proptest! {
    #[test]
    fn test_logo_geometry_is_centered(size in 64u32..4096) {
        let g = LogoGeometry::for_canvas(size);
        let s = size as f32;
        let tolerance = s * 1e-5;

        prop_assert!((g.logo_side - s * LOGO_RATIO).abs() <= tolerance);
        prop_assert!((g.padding - s * PLATE_PADDING_RATIO).abs() <= tolerance);
        prop_assert!((g.radius - s * PLATE_RADIUS_RATIO).abs() <= tolerance);
        prop_assert_eq!(g.x, g.y);
        // Equal margins on both sides.
        prop_assert!((g.x - (s - (g.x + g.logo_side))).abs() <= tolerance);

        let (left, top, right, bottom) = g.plate_bounds();
        prop_assert!(g.plate_contains(s / 2.0, s / 2.0));
        prop_assert!(!g.plate_contains(left - 1.0, s / 2.0));
        prop_assert!(!g.plate_contains(s / 2.0, bottom + 1.0));
        // Corners are cut by the radius.
        prop_assert!(!g.plate_contains(left + 0.5, top + 0.5));
        prop_assert!(!g.plate_contains(right - 0.5, bottom - 0.5));
    }
}

#[rstest]
#[case(StrokeColor::Black, [0x00, 0x00, 0x00, 255])]
#[case(StrokeColor::Blue, [0x25, 0x63, 0xEB, 255])]
#[case(StrokeColor::Red, [0xDC, 0x26, 0x26, 255])]
fn test_stroke_colors_reach_the_raster(#[case] color: StrokeColor, #[case] rgba: [u8; 4]) {
    let request = GenerationRequest::new("color check", color, None).unwrap();
    let style = StyleOptions::for_request(&request, 256, 2);
    let raster = QrCodeEncoder.encode(&request.text, &style).unwrap();

    assert!(raster.pixels().any(|p| p.0 == rgba));
    assert!(raster.pixels().all(|p| p.0 == rgba || p.0 == [255, 255, 255, 255]));
}

#[rstest]
#[case(false, ErrorCorrection::M)]
#[case(true, ErrorCorrection::H)]
fn test_error_correction_follows_logo(#[case] with_logo: bool, #[case] expected: ErrorCorrection) {
    let logo = with_logo.then(|| LogoImage::from_bytes("logo.png", vec![0u8; 4]));
    let request = GenerationRequest::new("ec", StrokeColor::Black, logo).unwrap();
    assert_eq!(StyleOptions::for_request(&request, 1024, 2).error_correction, expected);
}
