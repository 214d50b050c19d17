//! Buffers and uniforms handed to the renderer.
//!
//! The `project` helpers reproduce the vertex-shader transforms on the CPU,
//! returning clip-space coordinates in `[-1, 1]`.
use super::electrode::{GRID_COLUMNS, GRID_ROWS};
use super::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Lines,
    LineStrip,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridUniforms {
    /// Buckets per channel actually emitted.
    pub width: f32,
    pub y_scale: f32,
}
impl GridUniforms {
    pub fn project(&self, vertex: [f32; 4]) -> [f32; 2] {
        let [col, row, local_t, value] = vertex;
        let width = 2.0 / GRID_COLUMNS as f32;
        let height = 2.0 / GRID_ROWS as f32;
        let scale = height / (2.0 * self.y_scale);
        let x = col * width + width * local_t / self.width.max(1.0);
        let y = row * height + height / 2.0 + scale * value.clamp(-self.y_scale, self.y_scale);
        [x - 1.0, y - 1.0]
    }
}

/// One `[col, row, local_t, value]` quadruple per output point per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct GridFrame {
    pub vertices: Vec<[f32; 4]>,
    /// Vertices per channel; strips never continue across channels.
    pub points_per_channel: usize,
    pub uniforms: GridUniforms,
    pub primitive: Primitive,
}
impl GridFrame {
    pub fn channel_strips(&self) -> impl Iterator<Item = &[[f32; 4]]> {
        self.vertices.chunks(self.points_per_channel.max(1))
    }
    /// Flat `f32` view in vertex-attribute order.
    pub fn as_floats(&self) -> Vec<f32> {
        self.vertices.iter().flatten().copied().collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceUniforms {
    pub scale: [f32; 2],
    /// Window start relative to the frame's `time_origin`.
    pub pan: f32,
    pub top_margin: f32,
    /// Vertical extent of one stacked trace in clip units.
    pub height: f32,
    pub adj_y_scale: f32,
}
impl TraceUniforms {
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let n = viewport.electrodes().len().max(1) as f64;
        let y_scale = viewport.y_scale();
        Self {
            scale: [(2.0 / viewport.dt()) as f32, (1.0 / y_scale) as f32],
            // Frames are built with their origin at t0.
            pan: 0.0,
            top_margin: viewport.top_margin() as f32,
            height: (2.0 / n) as f32,
            adj_y_scale: (1.0 / (y_scale * n)) as f32,
        }
    }
    pub fn project(&self, position: [f32; 2], index: f32) -> [f32; 2] {
        let y_offset = self.height * (index + 0.5);
        [
            self.scale[0] * (position[0] - self.pan) - 1.0,
            self.adj_y_scale * position[1] + 1.0 - y_offset,
        ]
    }
}

/// Raw `[time, value]` pairs with a parallel electrode index.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceFrame {
    /// Recording time that position x = 0 stands for.
    pub time_origin: f64,
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<f32>,
    pub electrodes: Vec<String>,
    pub uniforms: TraceUniforms,
    pub primitive: Primitive,
}
impl TraceFrame {
    /// Contiguous runs sharing one electrode index.
    pub fn strips(&self) -> Vec<(usize, &[[f32; 2]])> {
        let mut strips = Vec::new();
        let mut start = 0;
        for i in 1..=self.indices.len() {
            if i == self.indices.len() || self.indices[i] != self.indices[start] {
                strips.push((self.indices[start] as usize, &self.positions[start..i]));
                start = i;
            }
        }
        strips
    }
}

/// Inner cell borders of a `cols x rows` grid as `lines` vertex pairs.
pub fn grid_lines(cols: usize, rows: usize) -> Vec<[f32; 2]> {
    let mut lines = Vec::with_capacity(2 * (cols + rows).saturating_sub(2));
    for c in 1..cols {
        let x = 2.0 * c as f32 / cols as f32 - 1.0;
        lines.push([x, -1.0]);
        lines.push([x, 1.0]);
    }
    for r in 1..rows {
        let y = 2.0 * r as f32 / rows as f32 - 1.0;
        lines.push([-1.0, y]);
        lines.push([1.0, y]);
    }
    lines
}
