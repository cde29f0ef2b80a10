//! Drawing vocabulary shared by every surface kind
//!
//! A type becomes drawable by telling [`DrawingSurface`] which remote surface it stands for,
//! which batch manager its commands go through and where its local attribute cache lives. Every
//! drawing method then turns into exactly one submitted command.
//!
//! Scalar parameters keep their numeric kind on the wire, so `fill_rect(10, 10, 20, 20)` is
//! sent with integers. Bulk-capable parameters take anything convertible into an [`Arg`]: a
//! number applies to every shape, an array gives one value per shape.

use crate::errors::CanvasError;
use crate::image::to_rgba;
use crate::manager::{hold, HoldGuard, ManagerHandle};
use easel_protocol::args::{Arg, CommandArgs, Scalar};
use easel_protocol::array::NdArray;
use easel_protocol::attributes::{AttrValue, Attribute, AttributeKey};
use easel_protocol::color::{validate_alpha, validate_color_array};
use easel_protocol::command::{encode, Entry};
use easel_protocol::opcodes::Opcode;
use easel_protocol::points::{validate_polyline, PointSet, ShapeKind};
use easel_protocol::reference::RemoteRef;
use std::cell::RefCell;
use std::collections::HashMap;

/// Rule deciding what lies inside a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// Local mirror of the attributes sent to the remote surface
#[derive(Debug, Default)]
pub struct SurfaceState {
    attributes: RefCell<HashMap<u16, AttrValue>>,
    line_dash: RefCell<Vec<f64>>,
}

impl SurfaceState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub trait DrawingSurface {
    /// The remote surface this one draws on
    fn reference(&self) -> &RemoteRef;

    fn manager(&self) -> &ManagerHandle;

    fn state(&self) -> &SurfaceState;

    /// Encodes and submits a single command
    fn submit(&self, opcode: Opcode, args: CommandArgs) -> Result<(), CanvasError> {
        let (command, buffers) = encode(opcode, args);
        self.manager()
            .borrow_mut()
            .submit(self.reference(), command.into(), buffers)
    }

    /// Sets a drawing attribute. Nothing is sent when the value does not change.
    fn set_attribute<A: AttributeKey>(
        &self,
        attribute: A,
        value: impl Into<AttrValue>,
    ) -> Result<(), CanvasError> {
        let value = value.into();
        let entry = Entry::set(attribute, &value)?;
        if self.attribute(attribute) == value {
            return Ok(());
        }

        self.manager()
            .borrow_mut()
            .submit(self.reference(), entry, Vec::new())?;
        self.state()
            .attributes
            .borrow_mut()
            .insert(attribute.id(), value);
        Ok(())
    }

    /// Current value of an attribute, its default when it was never set
    fn attribute<A: AttributeKey>(&self, attribute: A) -> AttrValue {
        self.state()
            .attributes
            .borrow()
            .get(&attribute.id())
            .cloned()
            .unwrap_or_else(|| attribute.default_value())
    }

    /// A CSS color, or a gradient or pattern reference
    fn set_fill_style(&self, style: impl Into<AttrValue>) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::FillStyle, style)
    }

    fn set_stroke_style(&self, style: impl Into<AttrValue>) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::StrokeStyle, style)
    }

    fn set_global_alpha(&self, alpha: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::GlobalAlpha, alpha)
    }

    fn set_font(&self, font: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::Font, font)
    }

    fn set_text_align(&self, align: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::TextAlign, align)
    }

    fn set_text_baseline(&self, baseline: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::TextBaseline, baseline)
    }

    fn set_direction(&self, direction: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::Direction, direction)
    }

    fn set_global_composite_operation(&self, operation: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::GlobalCompositeOperation, operation)
    }

    fn set_line_width(&self, width: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::LineWidth, width)
    }

    fn set_line_cap(&self, cap: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::LineCap, cap)
    }

    fn set_line_join(&self, join: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::LineJoin, join)
    }

    fn set_miter_limit(&self, limit: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::MiterLimit, limit)
    }

    fn set_line_dash_offset(&self, offset: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::LineDashOffset, offset)
    }

    fn set_shadow_offset_x(&self, offset: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::ShadowOffsetX, offset)
    }

    fn set_shadow_offset_y(&self, offset: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::ShadowOffsetY, offset)
    }

    fn set_shadow_blur(&self, blur: f64) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::ShadowBlur, blur)
    }

    fn set_shadow_color(&self, color: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::ShadowColor, color)
    }

    fn set_filter(&self, filter: &str) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::Filter, filter)
    }

    fn set_image_smoothing_enabled(&self, enabled: bool) -> Result<(), CanvasError> {
        self.set_attribute(Attribute::ImageSmoothingEnabled, enabled)
    }

    // Rectangles

    fn fill_rect(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        width: impl Into<Scalar>,
        height: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::FillRect, rect_args(x, y, width, height))
    }

    fn stroke_rect(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        width: impl Into<Scalar>,
        height: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::StrokeRect, rect_args(x, y, width, height))
    }

    fn clear_rect(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        width: impl Into<Scalar>,
        height: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::ClearRect, rect_args(x, y, width, height))
    }

    /// Fills many rectangles. Without a height the rectangles are squares.
    fn fill_rects(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        width: impl Into<Arg>,
        height: Option<Arg>,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new().arg(x).arg(y).arg(width);
        self.submit(Opcode::FillRects, args.arg_or_repeat(height))
    }

    fn stroke_rects(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        width: impl Into<Arg>,
        height: Option<Arg>,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new().arg(x).arg(y).arg(width);
        self.submit(Opcode::StrokeRects, args.arg_or_repeat(height))
    }

    /// Fills many rectangles, each with its own RGB color
    fn fill_styled_rects(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        width: impl Into<Arg>,
        height: impl Into<Arg>,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().arg(x).arg(y).arg(width).arg(height);
        self.submit(Opcode::FillStyledRects, style.apply(args))
    }

    fn stroke_styled_rects(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        width: impl Into<Arg>,
        height: impl Into<Arg>,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().arg(x).arg(y).arg(width).arg(height);
        self.submit(Opcode::StrokeStyledRects, style.apply(args))
    }

    // Arcs and circles

    fn fill_arc(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius: impl Into<Scalar>,
        start_angle: impl Into<Scalar>,
        end_angle: impl Into<Scalar>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::FillArc, args)
    }

    fn stroke_arc(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius: impl Into<Scalar>,
        start_angle: impl Into<Scalar>,
        end_angle: impl Into<Scalar>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::StrokeArc, args)
    }

    fn fill_circle(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new().arg(x.into()).arg(y.into()).arg(radius.into());
        self.submit(Opcode::FillCircle, args)
    }

    fn stroke_circle(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new().arg(x.into()).arg(y.into()).arg(radius.into());
        self.submit(Opcode::StrokeCircle, args)
    }

    fn fill_arcs(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        start_angle: impl Into<Arg>,
        end_angle: impl Into<Arg>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = bulk_arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::FillArcs, args)
    }

    fn stroke_arcs(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        start_angle: impl Into<Arg>,
        end_angle: impl Into<Arg>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = bulk_arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::StrokeArcs, args)
    }

    fn fill_circles(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        self.submit(
            Opcode::FillCircles,
            CommandArgs::new().arg(x).arg(y).arg(radius),
        )
    }

    fn stroke_circles(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        self.submit(
            Opcode::StrokeCircles,
            CommandArgs::new().arg(x).arg(y).arg(radius),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_styled_arcs(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        start_angle: impl Into<Arg>,
        end_angle: impl Into<Arg>,
        anticlockwise: bool,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = bulk_arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::FillStyledArcs, style.apply(args))
    }

    #[allow(clippy::too_many_arguments)]
    fn stroke_styled_arcs(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        start_angle: impl Into<Arg>,
        end_angle: impl Into<Arg>,
        anticlockwise: bool,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = bulk_arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::StrokeStyledArcs, style.apply(args))
    }

    fn fill_styled_circles(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().arg(x).arg(y).arg(radius);
        self.submit(Opcode::FillStyledCircles, style.apply(args))
    }

    fn stroke_styled_circles(
        &self,
        x: impl Into<Arg>,
        y: impl Into<Arg>,
        radius: impl Into<Arg>,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().arg(x).arg(y).arg(radius);
        self.submit(Opcode::StrokeStyledCircles, style.apply(args))
    }

    // Lines and polygons

    fn stroke_line(
        &self,
        x1: impl Into<Scalar>,
        y1: impl Into<Scalar>,
        x2: impl Into<Scalar>,
        y2: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::StrokeLine, rect_args(x1, y1, x2, y2))
    }

    /// Strokes one polyline through `(n, 2)` points
    fn stroke_lines(&self, points: &NdArray) -> Result<(), CanvasError> {
        validate_polyline(points, ShapeKind::LineSegments)?;
        self.submit(Opcode::StrokeLines, CommandArgs::new().arg(points))
    }

    fn fill_polygon(&self, points: &NdArray) -> Result<(), CanvasError> {
        validate_polyline(points, ShapeKind::Polygons)?;
        self.submit(Opcode::FillPolygon, CommandArgs::new().arg(points))
    }

    fn stroke_polygon(&self, points: &NdArray) -> Result<(), CanvasError> {
        validate_polyline(points, ShapeKind::Polygons)?;
        self.submit(Opcode::StrokePolygon, CommandArgs::new().arg(points))
    }

    fn fill_polygons(&self, points: &PointSet) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::Polygons)?;
        self.submit(Opcode::FillPolygons, CommandArgs::new().points(points))
    }

    fn stroke_polygons(&self, points: &PointSet) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::Polygons)?;
        self.submit(Opcode::StrokePolygons, CommandArgs::new().points(points))
    }

    fn stroke_line_segments(&self, points: &PointSet) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::LineSegments)?;
        self.submit(Opcode::StrokeLineSegments, CommandArgs::new().points(points))
    }

    fn fill_styled_polygons(
        &self,
        points: &PointSet,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::Polygons)?;
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().points(points);
        self.submit(Opcode::FillStyledPolygons, style.apply(args))
    }

    fn stroke_styled_polygons(
        &self,
        points: &PointSet,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::Polygons)?;
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().points(points);
        self.submit(Opcode::StrokeStyledPolygons, style.apply(args))
    }

    fn stroke_styled_line_segments(
        &self,
        points: &PointSet,
        color: &NdArray,
        alpha: impl Into<Arg>,
    ) -> Result<(), CanvasError> {
        let points = points.normalize(ShapeKind::LineSegments)?;
        let style = styled(color, alpha)?;
        let args = CommandArgs::new().points(points);
        self.submit(Opcode::StrokeStyledLineSegments, style.apply(args))
    }

    // Paths

    fn begin_path(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::BeginPath, CommandArgs::new())
    }

    fn close_path(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::ClosePath, CommandArgs::new())
    }

    fn stroke(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::Stroke, CommandArgs::new())
    }

    fn fill(&self, rule: FillRule) -> Result<(), CanvasError> {
        self.submit(Opcode::Fill, CommandArgs::new().arg(rule.as_str()))
    }

    /// Fills a path object living on the remote side
    fn fill_path(&self, path: &RemoteRef) -> Result<(), CanvasError> {
        self.submit(Opcode::FillPath, CommandArgs::new().arg(path))
    }

    fn move_to(&self, x: impl Into<Scalar>, y: impl Into<Scalar>) -> Result<(), CanvasError> {
        self.submit(Opcode::MoveTo, CommandArgs::new().arg(x.into()).arg(y.into()))
    }

    fn line_to(&self, x: impl Into<Scalar>, y: impl Into<Scalar>) -> Result<(), CanvasError> {
        self.submit(Opcode::LineTo, CommandArgs::new().arg(x.into()).arg(y.into()))
    }

    fn rect(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        width: impl Into<Scalar>,
        height: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::Rect, rect_args(x, y, width, height))
    }

    fn arc(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius: impl Into<Scalar>,
        start_angle: impl Into<Scalar>,
        end_angle: impl Into<Scalar>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = arc_args(x, y, radius, start_angle, end_angle, anticlockwise);
        self.submit(Opcode::Arc, args)
    }

    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &self,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        radius_x: impl Into<Scalar>,
        radius_y: impl Into<Scalar>,
        rotation: impl Into<Scalar>,
        start_angle: impl Into<Scalar>,
        end_angle: impl Into<Scalar>,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new()
            .arg(x.into())
            .arg(y.into())
            .arg(radius_x.into())
            .arg(radius_y.into())
            .arg(rotation.into())
            .arg(start_angle.into())
            .arg(end_angle.into())
            .arg(anticlockwise);
        self.submit(Opcode::Ellipse, args)
    }

    fn arc_to(
        &self,
        x1: impl Into<Scalar>,
        y1: impl Into<Scalar>,
        x2: impl Into<Scalar>,
        y2: impl Into<Scalar>,
        radius: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        let args = rect_args(x1, y1, x2, y2).arg(radius.into());
        self.submit(Opcode::ArcTo, args)
    }

    fn quadratic_curve_to(
        &self,
        cpx: impl Into<Scalar>,
        cpy: impl Into<Scalar>,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::QuadraticCurveTo, rect_args(cpx, cpy, x, y))
    }

    fn bezier_curve_to(
        &self,
        cp1x: impl Into<Scalar>,
        cp1y: impl Into<Scalar>,
        cp2x: impl Into<Scalar>,
        cp2y: impl Into<Scalar>,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        let args = rect_args(cp1x, cp1y, cp2x, cp2y)
            .arg(x.into())
            .arg(y.into());
        self.submit(Opcode::BezierCurveTo, args)
    }

    fn clip(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::Clip, CommandArgs::new())
    }

    // Text

    fn fill_text(
        &self,
        text: &str,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        max_width: Option<f64>,
    ) -> Result<(), CanvasError> {
        let args = text_args(text, x, y, max_width);
        self.submit(Opcode::FillText, args)
    }

    fn stroke_text(
        &self,
        text: &str,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        max_width: Option<f64>,
    ) -> Result<(), CanvasError> {
        let args = text_args(text, x, y, max_width);
        self.submit(Opcode::StrokeText, args)
    }

    // Images

    /// Draws another surface or a remote image. A missing height repeats the width, leaving
    /// both out draws at the natural size.
    fn draw_image(
        &self,
        source: &RemoteRef,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Result<(), CanvasError> {
        let args = CommandArgs::new()
            .arg(source)
            .arg(x.into())
            .arg(y.into())
            .arg(width);
        let args = match (width, height) {
            (Some(_), None) => args.repeat_last(),
            (_, height) => args.arg(height),
        };
        self.submit(Opcode::DrawImage, args)
    }

    /// Puts raw pixels at `(x, y)`. Grayscale and RGB pixels are converted to RGBA first.
    fn put_image_data(
        &self,
        pixels: &NdArray,
        x: impl Into<Scalar>,
        y: impl Into<Scalar>,
    ) -> Result<(), CanvasError> {
        let rgba = to_rgba(pixels)?;
        let args = CommandArgs::new().arg(rgba).arg(x.into()).arg(y.into());
        self.submit(Opcode::PutImageData, args)
    }

    // Transformations

    fn save(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::Save, CommandArgs::new())
    }

    fn restore(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::Restore, CommandArgs::new())
    }

    fn translate(&self, x: impl Into<Scalar>, y: impl Into<Scalar>) -> Result<(), CanvasError> {
        self.submit(
            Opcode::Translate,
            CommandArgs::new().arg(x.into()).arg(y.into()),
        )
    }

    fn rotate(&self, angle: impl Into<Scalar>) -> Result<(), CanvasError> {
        self.submit(Opcode::Rotate, CommandArgs::new().arg(angle.into()))
    }

    /// Scales by `x` horizontally and by `y` (or `x` again) vertically
    fn scale(&self, x: f64, y: Option<f64>) -> Result<(), CanvasError> {
        self.submit(Opcode::Scale, CommandArgs::new().arg(x).arg_or_repeat(y))
    }

    fn transform(&self, a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<(), CanvasError> {
        self.submit(Opcode::Transform, matrix_args(a, b, c, d, e, f))
    }

    fn set_transform(
        &self,
        a: f64,
        b: f64,
        c: f64,
        d: f64,
        e: f64,
        f: f64,
    ) -> Result<(), CanvasError> {
        self.submit(Opcode::SetTransform, matrix_args(a, b, c, d, e, f))
    }

    fn reset_transform(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::ResetTransform, CommandArgs::new())
    }

    // Line dash

    /// Sets the dash pattern. An odd number of segments is repeated once to make it even.
    fn set_line_dash(&self, segments: &[f64]) -> Result<(), CanvasError> {
        let mut dash = segments.to_vec();
        if dash.len() % 2 == 1 {
            dash.extend_from_slice(segments);
        }

        self.submit(
            Opcode::SetLineDash,
            CommandArgs::new().arg(NdArray::from(dash.clone())),
        )?;
        *self.state().line_dash.borrow_mut() = dash;
        Ok(())
    }

    fn get_line_dash(&self) -> Vec<f64> {
        self.state().line_dash.borrow().clone()
    }

    // Control

    /// Clears the whole surface
    fn clear(&self) -> Result<(), CanvasError> {
        self.submit(Opcode::Clear, CommandArgs::new())
    }

    /// Makes the remote side pause for `millis` before running the next command
    fn sleep(&self, millis: u32) -> Result<(), CanvasError> {
        self.submit(Opcode::Sleep, CommandArgs::new().arg(millis))
    }

    /// Sends whatever the current batch holds without ending it
    fn flush(&self) -> Result<(), CanvasError> {
        self.manager().borrow_mut().flush()
    }

    /// Batches every command until the guard is released or dropped
    fn hold(&self) -> HoldGuard {
        hold(self.manager())
    }
}

/// Validated per-shape style arguments, appended after the geometry
struct Style {
    color: NdArray,
    alpha: Arg,
}

impl Style {
    fn apply(self, args: CommandArgs) -> CommandArgs {
        args.arg(self.color).arg(self.alpha)
    }
}

fn styled(color: &NdArray, alpha: impl Into<Arg>) -> Result<Style, CanvasError> {
    let alpha = alpha.into();
    validate_color_array(color)?;
    validate_alpha(&alpha)?;
    Ok(Style {
        color: color.clone(),
        alpha,
    })
}

fn rect_args(
    x: impl Into<Scalar>,
    y: impl Into<Scalar>,
    width: impl Into<Scalar>,
    height: impl Into<Scalar>,
) -> CommandArgs {
    CommandArgs::new()
        .arg(x.into())
        .arg(y.into())
        .arg(width.into())
        .arg(height.into())
}

fn arc_args(
    x: impl Into<Scalar>,
    y: impl Into<Scalar>,
    radius: impl Into<Scalar>,
    start_angle: impl Into<Scalar>,
    end_angle: impl Into<Scalar>,
    anticlockwise: bool,
) -> CommandArgs {
    CommandArgs::new()
        .arg(x.into())
        .arg(y.into())
        .arg(radius.into())
        .arg(start_angle.into())
        .arg(end_angle.into())
        .arg(anticlockwise)
}

fn bulk_arc_args(
    x: impl Into<Arg>,
    y: impl Into<Arg>,
    radius: impl Into<Arg>,
    start_angle: impl Into<Arg>,
    end_angle: impl Into<Arg>,
    anticlockwise: bool,
) -> CommandArgs {
    CommandArgs::new()
        .arg(x)
        .arg(y)
        .arg(radius)
        .arg(start_angle)
        .arg(end_angle)
        .arg(anticlockwise)
}

fn text_args(
    text: &str,
    x: impl Into<Scalar>,
    y: impl Into<Scalar>,
    max_width: Option<f64>,
) -> CommandArgs {
    CommandArgs::new()
        .arg(text)
        .arg(x.into())
        .arg(y.into())
        .arg(max_width)
}

fn matrix_args(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> CommandArgs {
    CommandArgs::new()
        .arg(a)
        .arg(b)
        .arg(c)
        .arg(d)
        .arg(e)
        .arg(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::BatchManager;
    use crate::transport::RecordingTransport;
    use easel_protocol::array::DType;
    use easel_protocol::decode::{DecodedArg, DecodedEntry};
    use easel_protocol::ProtocolError;

    struct TestSurface {
        reference: RemoteRef,
        manager: ManagerHandle,
        state: SurfaceState,
    }

    impl DrawingSurface for TestSurface {
        fn reference(&self) -> &RemoteRef {
            &self.reference
        }

        fn manager(&self) -> &ManagerHandle {
            &self.manager
        }

        fn state(&self) -> &SurfaceState {
            &self.state
        }
    }

    fn surface() -> (TestSurface, RecordingTransport) {
        let transport = RecordingTransport::new();
        let surface = TestSurface {
            reference: RemoteRef::new("surface".into()),
            manager: BatchManager::shared(transport.clone()),
            state: SurfaceState::new(),
        };
        (surface, transport)
    }

    /// Every drawing entry sent so far, switches left out
    fn drawn(transport: &RecordingTransport) -> Vec<DecodedEntry> {
        transport
            .decoded()
            .unwrap()
            .into_iter()
            .flatten()
            .filter(|entry| !matches!(entry, DecodedEntry::Switch(_)))
            .collect()
    }

    fn scalars(entry: &DecodedEntry) -> Vec<Scalar> {
        let DecodedEntry::Draw { args, .. } = entry else {
            panic!("not a draw entry: {entry:?}");
        };
        args.iter()
            .map(|arg| match arg {
                DecodedArg::Scalar(scalar) => scalar.clone(),
                DecodedArg::Array(array) => panic!("unexpected array {array:?}"),
            })
            .collect()
    }

    #[test]
    fn integers_stay_integers() {
        let (surface, transport) = surface();
        surface.fill_rect(10, 10, 20, 20).unwrap();
        surface.stroke_rect(1.5, 2, 3, 4).unwrap();

        let entries = drawn(&transport);
        assert_eq!(entries[0].opcode(), Opcode::FillRect);
        assert_eq!(scalars(&entries[0]), vec![Scalar::Int(10), Scalar::Int(10), Scalar::Int(20), Scalar::Int(20)]);
        assert_eq!(scalars(&entries[1])[0], Scalar::Float(1.5));
    }

    #[test]
    fn attributes_are_only_sent_on_change() {
        let (surface, transport) = surface();
        surface.set_fill_style("red").unwrap();
        surface.set_fill_style("red").unwrap();
        surface.set_line_width(1.0).unwrap();
        surface.set_line_width(3.0).unwrap();

        let entries = drawn(&transport);
        assert_eq!(
            entries,
            vec![
                DecodedEntry::Set {
                    attribute: 0,
                    value: Scalar::Str("red".into())
                },
                DecodedEntry::Set {
                    attribute: 8,
                    value: Scalar::Float(3.0)
                },
            ]
        );
        assert_eq!(surface.attribute(Attribute::FillStyle), AttrValue::from("red"));
        assert_eq!(surface.attribute(Attribute::LineWidth), AttrValue::from(3.0));
        assert_eq!(surface.attribute(Attribute::Font), AttrValue::from("12px serif"));
    }

    #[test]
    fn invalid_attributes_are_rejected() {
        let (surface, transport) = surface();
        assert!(matches!(
            surface.set_global_alpha(1.5),
            Err(CanvasError::Protocol(ProtocolError::InvalidArgument { .. }))
        ));
        assert!(surface.set_line_cap("pointy").is_err());
        assert!(surface.set_stroke_style("not a color").is_err());
        assert!(transport.is_empty());
        assert_eq!(surface.attribute(Attribute::GlobalAlpha), AttrValue::from(1.0));
    }

    #[test]
    fn gradient_reference_as_fill_style() {
        let (surface, transport) = surface();
        let gradient = RemoteRef::new("gradient".into());
        surface.set_fill_style(&gradient).unwrap();

        let entries = drawn(&transport);
        assert_eq!(
            entries,
            vec![DecodedEntry::Set {
                attribute: 0,
                value: Scalar::Str("IPY_MODEL_gradient".into())
            }]
        );
    }

    #[test]
    fn square_rects_repeat_the_width_buffer() {
        let (surface, transport) = surface();
        surface
            .fill_rects(vec![0.0, 10.0], vec![0.0, 10.0], vec![5.0, 6.0], None)
            .unwrap();

        let message = transport.messages().pop().unwrap();
        // x, y and width each have a buffer, height reuses the width's
        assert_eq!(message.arg_buffers().len(), 3);

        let DecodedEntry::Draw { args, .. } = &drawn(&transport)[0] else {
            panic!("expected a draw entry");
        };
        assert_eq!(args.len(), 4);
        assert_eq!(args[2], args[3]);
    }

    #[test]
    fn square_rects_repeat_a_scalar_width() {
        let (surface, transport) = surface();
        surface
            .stroke_rects(vec![0.0f32, 1.0], vec![0.0f32, 1.0], 4, None)
            .unwrap();
        surface
            .stroke_rects(vec![0.0f32], vec![0.0f32], 4, Some(Arg::from(8)))
            .unwrap();

        let entries = drawn(&transport);
        let DecodedEntry::Draw { args, .. } = &entries[0] else {
            panic!("expected a draw entry");
        };
        assert_eq!(args[2], DecodedArg::Scalar(Scalar::Int(4)));
        assert_eq!(args[3], DecodedArg::Scalar(Scalar::Int(4)));

        let DecodedEntry::Draw { args, .. } = &entries[1] else {
            panic!("expected a draw entry");
        };
        assert_eq!(args[3], DecodedArg::Scalar(Scalar::Int(8)));
    }

    #[test]
    fn optional_max_width_is_trimmed() {
        let (surface, transport) = surface();
        surface.fill_text("hello", 1, 2, None).unwrap();
        surface.stroke_text("hello", 1, 2, Some(50.0)).unwrap();

        let entries = drawn(&transport);
        assert_eq!(scalars(&entries[0]).len(), 3);
        assert_eq!(scalars(&entries[1])[3], Scalar::Float(50.0));
    }

    #[test]
    fn draw_image_sizes() {
        let (surface, transport) = surface();
        let source = RemoteRef::new("other".into());
        surface.draw_image(&source, 0, 0, None, None).unwrap();
        surface.draw_image(&source, 0, 0, Some(30.0), None).unwrap();
        surface.draw_image(&source, 0, 0, None, Some(20.0)).unwrap();

        let entries = drawn(&transport);
        assert_eq!(
            scalars(&entries[0]),
            vec![Scalar::Str("IPY_MODEL_other".into()), Scalar::Int(0), Scalar::Int(0)]
        );
        assert_eq!(&scalars(&entries[1])[3..], &[Scalar::Float(30.0), Scalar::Float(30.0)]);
        assert_eq!(&scalars(&entries[2])[3..], &[Scalar::Null, Scalar::Float(20.0)]);
    }

    #[test]
    fn scale_repeats_x() {
        let (surface, transport) = surface();
        surface.scale(2.0, None).unwrap();
        surface.scale(2.0, Some(3.0)).unwrap();

        let entries = drawn(&transport);
        assert_eq!(scalars(&entries[0]), vec![Scalar::Float(2.0), Scalar::Float(2.0)]);
        assert_eq!(scalars(&entries[1]), vec![Scalar::Float(2.0), Scalar::Float(3.0)]);
    }

    #[test]
    fn odd_line_dash_is_doubled() {
        let (surface, transport) = surface();
        surface.set_line_dash(&[5.0, 10.0, 15.0]).unwrap();
        assert_eq!(surface.get_line_dash(), vec![5.0, 10.0, 15.0, 5.0, 10.0, 15.0]);

        let DecodedEntry::Draw { opcode, args } = &drawn(&transport)[0] else {
            panic!("expected a draw entry");
        };
        assert_eq!(*opcode, Opcode::SetLineDash);
        let DecodedArg::Array(dash) = &args[0] else {
            panic!("expected an array argument");
        };
        assert_eq!(dash.dtype(), DType::Float64);
        assert_eq!(dash.shape(), &[6]);

        surface.set_line_dash(&[]).unwrap();
        assert!(surface.get_line_dash().is_empty());
    }

    #[test]
    fn styled_shapes_validate_colors_and_alpha() {
        let (surface, transport) = surface();
        let colors = NdArray::new(vec![2, 3], vec![255u8, 0, 0, 0, 255, 0]).unwrap();

        surface
            .fill_styled_circles(vec![1.0, 2.0], vec![1.0, 2.0], 5, &colors, 0.5)
            .unwrap();

        let bad_colors = NdArray::new(vec![2, 2], vec![0u8; 4]).unwrap();
        assert!(surface
            .fill_styled_rects(0, 0, 1, 1, &bad_colors, 1)
            .is_err());
        assert!(surface
            .stroke_styled_circles(0, 0, 1, &colors, 2.0)
            .is_err());

        let entries = drawn(&transport);
        assert_eq!(entries.len(), 1);
        let DecodedEntry::Draw { args, .. } = &entries[0] else {
            panic!("expected a draw entry");
        };
        assert!(matches!(&args[3], DecodedArg::Array(color) if color.shape() == [2, 3]));
        assert_eq!(args[4], DecodedArg::Scalar(Scalar::Float(0.5)));
    }

    #[test]
    fn polygons_are_checked_before_sending() {
        let (surface, transport) = surface();
        let triangle = NdArray::new(vec![3, 2], vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0]).unwrap();
        let segment = NdArray::new(vec![2, 2], vec![0.0, 0.0, 1.0, 1.0]).unwrap();

        surface.fill_polygon(&triangle).unwrap();
        surface.stroke_lines(&segment).unwrap();
        assert!(matches!(
            surface.stroke_polygon(&segment),
            Err(CanvasError::Protocol(ProtocolError::TooFewPoints { .. }))
        ));

        let items = PointSet::from(vec![triangle.clone(), segment.clone()]);
        assert!(matches!(
            surface.fill_polygons(&items),
            Err(CanvasError::Protocol(ProtocolError::TooFewPoints { index: 1, .. }))
        ));
        surface.stroke_line_segments(&items).unwrap();

        let opcodes: Vec<Opcode> = drawn(&transport).iter().map(DecodedEntry::opcode).collect();
        assert_eq!(
            opcodes,
            vec![Opcode::FillPolygon, Opcode::StrokeLines, Opcode::StrokeLineSegments]
        );
    }

    #[test]
    fn put_image_data_sends_rgba() {
        let (surface, transport) = surface();
        let rgb = NdArray::new(vec![1, 1, 3], vec![1u8, 2, 3]).unwrap();
        surface.put_image_data(&rgb, 4, 5).unwrap();

        let DecodedEntry::Draw { args, .. } = &drawn(&transport)[0] else {
            panic!("expected a draw entry");
        };
        let DecodedArg::Array(pixels) = &args[0] else {
            panic!("expected an array argument");
        };
        assert_eq!(pixels.shape(), &[1, 1, 4]);
        assert_eq!(args[1], DecodedArg::Scalar(Scalar::Int(4)));
    }

    #[test]
    fn path_commands() {
        let (surface, transport) = surface();
        {
            let _hold = surface.hold();
            surface.begin_path().unwrap();
            surface.move_to(0, 0).unwrap();
            surface.line_to(10, 0).unwrap();
            surface.arc(5, 5, 5, 0.0, 3.0, false).unwrap();
            surface.close_path().unwrap();
            surface.fill(FillRule::EvenOdd).unwrap();
        }

        let decoded = transport.decoded().unwrap();
        assert_eq!(decoded.len(), 1);
        let entries = drawn(&transport);
        assert_eq!(entries.len(), 6);
        assert_eq!(scalars(&entries[5]), vec![Scalar::Str("evenodd".into())]);
        assert_eq!(scalars(&entries[3])[5], Scalar::Bool(false));
    }

    #[test]
    fn sleep_and_clear() {
        let (surface, transport) = surface();
        surface.clear().unwrap();
        surface.sleep(250).unwrap();

        let entries = drawn(&transport);
        assert_eq!(entries[0].opcode(), Opcode::Clear);
        assert_eq!(scalars(&entries[1]), vec![Scalar::Int(250)]);
    }
}
