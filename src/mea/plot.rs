use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use super::electrode::{GRID_COLUMNS, GRID_ROWS};
use super::error::MeaError;
use super::pipeline::Frame;
use super::vertex::{grid_lines, GridFrame, TraceFrame};

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub grid_color: RGBColor,
    pub trace_color: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 768,
            background: RGBColor(230, 232, 232),
            grid_color: RGBColor(102, 102, 102),
            trace_color: RGBColor(89, 128, 182),
        }
    }
}
impl PlotStyle {
    /// Clip space `[-1, 1]` (y up) to pixel coordinates (y down).
    fn to_pixel(&self, clip: [f32; 2]) -> (i32, i32) {
        let x = (clip[0] + 1.0) * 0.5 * self.width as f32;
        let y = (1.0 - clip[1]) * 0.5 * self.height as f32;
        (x.round() as i32, y.round() as i32)
    }
}

pub fn render_frame_png(frame: &Frame, style: &PlotStyle) -> Result<Vec<u8>, MeaError> {
    match frame {
        Frame::Grid(grid) => render_grid_png(grid, style),
        Frame::Trace(trace) => render_trace_png(trace, style),
    }
}

pub fn render_grid_png(frame: &GridFrame, style: &PlotStyle) -> Result<Vec<u8>, MeaError> {
    if frame.vertices.is_empty() {
        return Err(MeaError::Plot("grid frame has no vertices".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        for strip in frame.channel_strips() {
            let points: Vec<(i32, i32)> = strip
                .iter()
                .map(|v| style.to_pixel(frame.uniforms.project(*v)))
                .collect();
            root.draw(&PathElement::new(points, &style.trace_color))?;
        }
        for pair in grid_lines(GRID_COLUMNS, GRID_ROWS).chunks_exact(2) {
            let line = vec![style.to_pixel(pair[0]), style.to_pixel(pair[1])];
            root.draw(&PathElement::new(line, style.grid_color.stroke_width(2)))?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

pub fn render_trace_png(frame: &TraceFrame, style: &PlotStyle) -> Result<Vec<u8>, MeaError> {
    if frame.positions.is_empty() {
        return Err(MeaError::Plot("trace frame has no samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&RGBColor(128, 128, 128))?;
        for (index, strip) in frame.strips() {
            let points: Vec<(i32, i32)> = strip
                .iter()
                .map(|p| style.to_pixel(frame.uniforms.project(*p, index as f32)))
                .collect();
            root.draw(&PathElement::new(points, &style.trace_color))?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, MeaError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| MeaError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mea::grid::resample_grid;
    use crate::mea::recording::Recording;
    use crate::mea::trace::resample_traces;
    use crate::mea::vertex::TraceUniforms;

    fn recording() -> Recording {
        Recording::from_sample_rate(
            100.0,
            vec![
                ("h11".into(), (0..500).map(|v| ((v as f32) * 0.1).sin() * 40.0).collect()),
                ("d6".into(), vec![10.0; 500]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn grid_snapshot_is_png() {
        let frame = resample_grid(&recording(), 0.0, 5.0, 50.0, 25).unwrap();
        let style = PlotStyle {
            width: 240,
            height: 240,
            ..Default::default()
        };
        let png = render_grid_png(&frame, &style).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn trace_snapshot_is_png() {
        let uniforms = TraceUniforms {
            scale: [2.0 / 5.0, 1.0 / 50.0],
            pan: 0.0,
            top_margin: 0.0,
            height: 2.0,
            adj_y_scale: 1.0 / 50.0,
        };
        let frame = resample_traces(&recording(), &["h11".into()], 0.0, 5.0, uniforms).unwrap();
        let png = render_frame_png(&Frame::Trace(frame), &PlotStyle::default()).unwrap();
        assert!(!png.is_empty());
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = resample_grid(&recording(), 0.0, 5.0, 50.0, 4).unwrap();
        let empty = GridFrame {
            vertices: Vec::new(),
            ..frame
        };
        assert!(matches!(
            render_grid_png(&empty, &PlotStyle::default()),
            Err(MeaError::Plot(_))
        ));
    }
}
