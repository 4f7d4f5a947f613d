//! FITS fixtures for unit tests

/// Build a minimal primary-HDU FITS file.
///
/// `axes` lists NAXIS1, NAXIS2, ... ; `data` is the already big-endian data
/// unit, padded here to a whole block.
pub fn fits_bytes(bitpix: i64, axes: &[usize], extra: &[(&str, &str)], data: &[u8]) -> Vec<u8> {
    let mut cards = vec![
        card("SIMPLE", "T"),
        card("BITPIX", &bitpix.to_string()),
        card("NAXIS", &axes.len().to_string()),
    ];
    for (i, len) in axes.iter().enumerate() {
        cards.push(card(&format!("NAXIS{}", i + 1), &len.to_string()));
    }
    for (key, value) in extra {
        cards.push(card(key, value));
    }
    cards.push(format!("{:<80}", "END"));

    let mut bytes: Vec<u8> = cards.concat().into_bytes();
    pad(&mut bytes, b' ');
    bytes.extend_from_slice(data);
    pad(&mut bytes, 0);
    bytes
}

/// BITPIX -32 raster of shape `(layers, height, width)`
pub fn fits_f32(layers: usize, height: usize, width: usize, values: &[f32]) -> Vec<u8> {
    assert_eq!(values.len(), layers * height * width);
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let axes = if layers == 1 {
        vec![width, height]
    } else {
        vec![width, height, layers]
    };
    fits_bytes(-32, &axes, &[], &data)
}

fn card(key: &str, value: &str) -> String {
    format!("{:<8}= {:>20}{:<50}", key, value, "")
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let rem = bytes.len() % 2880;
    if rem != 0 {
        bytes.resize(bytes.len() + 2880 - rem, fill);
    }
}
