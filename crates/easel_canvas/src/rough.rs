//! Hand-drawn sketch style
//!
//! A [`RoughCanvas`] draws the same vocabulary as a [`Canvas`] but the remote side renders every
//! shape with a sketchy, hand-drawn look. Three extra attributes tune that look.

use crate::canvas::Canvas;
use crate::errors::CanvasError;
use crate::manager::ManagerHandle;
use crate::surface::{DrawingSurface, SurfaceState};
use easel_protocol::attributes::{AttrValue, RoughAttribute};
use easel_protocol::reference::RemoteRef;
use easel_shared::types::Size;
use std::ops::Deref;

pub struct RoughCanvas {
    canvas: Canvas,
}

impl RoughCanvas {
    pub fn new(manager: &ManagerHandle) -> Self {
        Self {
            canvas: Canvas::new(manager),
        }
    }

    pub fn with_size(manager: &ManagerHandle, size: Size<u32>) -> Self {
        Self {
            canvas: Canvas::with_size(manager, size),
        }
    }

    /// One of `hachure`, `solid`, `zigzag`, `cross-hatch`, `dots`, `dashed` or `zigzag-line`
    pub fn set_rough_fill_style(&self, style: &str) -> Result<(), CanvasError> {
        self.set_attribute(RoughAttribute::RoughFillStyle, style)
    }

    /// How rough the shapes look, 0 draws clean shapes
    pub fn set_roughness(&self, roughness: f64) -> Result<(), CanvasError> {
        self.set_attribute(RoughAttribute::Roughness, roughness)
    }

    /// How much lines bend
    pub fn set_bowing(&self, bowing: f64) -> Result<(), CanvasError> {
        self.set_attribute(RoughAttribute::Bowing, bowing)
    }

    pub fn rough_fill_style(&self) -> AttrValue {
        self.attribute(RoughAttribute::RoughFillStyle)
    }

    pub fn roughness(&self) -> AttrValue {
        self.attribute(RoughAttribute::Roughness)
    }

    pub fn bowing(&self) -> AttrValue {
        self.attribute(RoughAttribute::Bowing)
    }
}

impl Deref for RoughCanvas {
    type Target = Canvas;

    fn deref(&self) -> &Self::Target {
        &self.canvas
    }
}

impl DrawingSurface for RoughCanvas {
    fn reference(&self) -> &RemoteRef {
        self.canvas.reference()
    }

    fn manager(&self) -> &ManagerHandle {
        self.canvas.manager()
    }

    fn state(&self) -> &SurfaceState {
        self.canvas.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::BatchManager;
    use crate::transport::RecordingTransport;
    use easel_protocol::args::Scalar;
    use easel_protocol::decode::DecodedEntry;
    use easel_protocol::opcodes::Opcode;
    use test_case::test_case;

    fn rough() -> (RoughCanvas, RecordingTransport) {
        let transport = RecordingTransport::new();
        let manager = BatchManager::shared(transport.clone());
        (RoughCanvas::with_size(&manager, Size::new(10, 10)), transport)
    }

    #[test]
    fn rough_attributes_use_their_own_ids() {
        let (canvas, transport) = rough();
        canvas.set_rough_fill_style("zigzag").unwrap();
        canvas.set_roughness(2.5).unwrap();
        canvas.set_bowing(-1.0).unwrap();

        let sets: Vec<DecodedEntry> = transport
            .decoded()
            .unwrap()
            .into_iter()
            .flatten()
            .filter(|entry| entry.opcode() == Opcode::Set)
            .collect();
        assert_eq!(
            sets,
            vec![
                DecodedEntry::Set {
                    attribute: 100,
                    value: Scalar::Str("zigzag".into())
                },
                DecodedEntry::Set {
                    attribute: 101,
                    value: Scalar::Float(2.5)
                },
                DecodedEntry::Set {
                    attribute: 102,
                    value: Scalar::Float(-1.0)
                },
            ]
        );
        assert_eq!(canvas.roughness(), AttrValue::from(2.5));
    }

    #[test]
    fn defaults_are_not_sent() {
        let (canvas, transport) = rough();
        canvas.set_rough_fill_style("hachure").unwrap();
        canvas.set_roughness(1.0).unwrap();
        assert!(transport.is_empty());
        assert_eq!(canvas.bowing(), AttrValue::from(1.0));
    }

    #[test_case("scribble" ; "unknown fill style")]
    #[test_case("" ; "empty fill style")]
    fn invalid_fill_style(style: &str) {
        let (canvas, transport) = rough();
        assert!(canvas.set_rough_fill_style(style).is_err());
        assert!(transport.is_empty());
    }

    #[test]
    fn negative_roughness_is_rejected() {
        let (canvas, _) = rough();
        assert!(canvas.set_roughness(-0.5).is_err());
    }

    #[test]
    fn draws_like_a_canvas() {
        let (canvas, transport) = rough();
        canvas.fill_rect(0, 0, 5, 5).unwrap();
        canvas.handle_event(&serde_json::json!({"event": "client_ready"}));

        assert!(canvas.is_ready());
        let decoded = transport.decoded().unwrap();
        assert_eq!(decoded[0], vec![DecodedEntry::Switch(canvas.reference().clone())]);
        assert_eq!(decoded[1][0].opcode(), Opcode::FillRect);
    }
}
