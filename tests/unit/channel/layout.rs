use super::*;

const RGBA: [ChannelRole; 4] = [
    ChannelRole::Color(ColorComponent::Red),
    ChannelRole::Color(ColorComponent::Green),
    ChannelRole::Color(ColorComponent::Blue),
    ChannelRole::Alpha,
];

#[test]
fn rgba_layout_indices() {
    let layout = ChannelLayout::derive(&RGBA).unwrap();
    assert_eq!(layout.alpha_index(), 3);
    assert_eq!(layout.color_indices(), &[0, 1, 2]);
    assert_eq!(layout.channel_count(), 4);
}

#[test]
fn alpha_first_keeps_color_order() {
    let roles = [
        ChannelRole::Alpha,
        ChannelRole::Color(ColorComponent::Blue),
        ChannelRole::Color(ColorComponent::Green),
        ChannelRole::Color(ColorComponent::Red),
    ];
    let layout = ChannelLayout::derive(&roles).unwrap();
    assert_eq!(layout.alpha_index(), 0);
    assert_eq!(layout.color_indices(), &[1, 2, 3]);
    let comps: Vec<_> = layout.color_components().collect();
    assert_eq!(
        comps,
        vec![
            ColorComponent::Blue,
            ColorComponent::Green,
            ColorComponent::Red
        ]
    );
}

#[test]
fn gray_alpha_is_accepted() {
    let layout =
        ChannelLayout::derive(&[ChannelRole::Color(ColorComponent::Gray), ChannelRole::Alpha])
            .unwrap();
    assert_eq!(layout.color_indices(), &[0]);
    assert_eq!(layout.alpha_index(), 1);
}

#[test]
fn palette_and_composite_channels_are_rejected() {
    let roles = [
        ChannelRole::Unsupported(UnsupportedChannel::PaletteIndex),
        ChannelRole::Alpha,
    ];
    match ChannelLayout::derive(&roles) {
        Err(AlphaFillError::UnsupportedChannelLayout { index, kind }) => {
            assert_eq!(index, 0);
            assert_eq!(kind, UnsupportedChannel::PaletteIndex);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let mut roles = RGBA.to_vec();
    roles.push(ChannelRole::Unsupported(UnsupportedChannel::Composite));
    assert!(matches!(
        ChannelLayout::derive(&roles),
        Err(AlphaFillError::UnsupportedChannelLayout { index: 4, .. })
    ));
}

#[test]
fn color_count_must_be_one_to_three() {
    assert!(matches!(
        ChannelLayout::derive(&[ChannelRole::Alpha]),
        Err(AlphaFillError::InvalidColorChannelCount { count: 0 })
    ));

    let mut roles = RGBA.to_vec();
    roles.insert(0, ChannelRole::Color(ColorComponent::Gray));
    assert!(matches!(
        ChannelLayout::derive(&roles),
        Err(AlphaFillError::InvalidColorChannelCount { count: 4 })
    ));
}

#[test]
fn missing_alpha_is_rejected() {
    assert!(matches!(
        ChannelLayout::derive(&RGBA[..3]),
        Err(AlphaFillError::MissingAlphaChannel)
    ));
}

#[test]
fn duplicate_alpha_is_a_validation_error() {
    let roles = [
        ChannelRole::Color(ColorComponent::Gray),
        ChannelRole::Alpha,
        ChannelRole::Alpha,
    ];
    assert!(matches!(
        ChannelLayout::derive(&roles),
        Err(AlphaFillError::Validation(_))
    ));
}
