use easel_protocol::array::{ArrayData, DType, NdArray};
use easel_protocol::ProtocolError;

const OPAQUE: u8 = 255;

/// Brings pixel data into `(height, width, 4)` uint8 RGBA form.
///
/// - 1-D arrays are treated as a single row
/// - 2-D arrays are grayscale and get expanded to RGBA
/// - 3-channel arrays get an opaque alpha channel
pub fn to_rgba(pixels: &NdArray) -> Result<NdArray, ProtocolError> {
    let pixels = pixels.astype(DType::Uint8).to_contiguous();
    let pixels = match pixels.shape() {
        [width] => pixels.reshape(vec![1, *width])?,
        _ => pixels,
    };

    let ArrayData::Uint8(values) = pixels.data() else {
        return Err(ProtocolError::UnsupportedDtype(pixels.dtype()));
    };

    match *pixels.shape() {
        [height, width] => {
            let rgba = values
                .iter()
                .flat_map(|&gray| [gray, gray, gray, OPAQUE])
                .collect::<Vec<u8>>();
            NdArray::new(vec![height, width, 4], rgba)
        }
        [_, _, 4] => Ok(pixels.clone()),
        [height, width, 3] => {
            let rgba = values
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], OPAQUE])
                .collect::<Vec<u8>>();
            NdArray::new(vec![height, width, 4], rgba)
        }
        ref shape => Err(ProtocolError::invalid(
            "image",
            format!("expected an RGBA array of shape (height, width, 4), got {shape:?}"),
        )),
    }
}
