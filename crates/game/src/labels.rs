//! Off-thread label mesh generation.
//!
//! Label meshes (one box per lit pixel of a 5x7 font) are built on a
//! worker thread and polled each frame. Results carry the scene
//! generation they were requested for, so a label finished after a
//! scene swap can be dropped instead of attached to the wrong room.

use std::sync::mpsc::{channel, Receiver, Sender};

use engine_core::{Transform, Vec3};
use procgen::{cuboid, MeshData};

/// A finished label, tagged with the scene generation that asked for it.
pub struct LabelResult {
    pub generation: u32,
    pub mesh: MeshData,
    pub transform: Transform,
    pub color: [f32; 4],
}

pub struct LabelLoader {
    tx: Sender<LabelResult>,
    rx: Receiver<LabelResult>,
}

impl Default for LabelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx }
    }

    /// Build a label mesh on a worker thread.
    pub fn request(&self, text: &str, generation: u32, transform: Transform, color: [f32; 4]) {
        let tx = self.tx.clone();
        let text = text.to_owned();
        std::thread::spawn(move || {
            let mesh = build_label_mesh(&text, 0.06);
            // The receiver only disappears on shutdown
            let _ = tx.send(LabelResult {
                generation,
                mesh,
                transform,
                color,
            });
        });
    }

    /// Drain every label finished since the last poll.
    pub fn poll(&self) -> Vec<LabelResult> {
        self.rx.try_iter().collect()
    }
}

/// Build a mesh for `text`, one small cube per lit font pixel,
/// centered on the origin. `pixel` is the world size of one pixel.
pub fn build_label_mesh(text: &str, pixel: f32) -> MeshData {
    const ADVANCE: f32 = 6.0;

    let mut mesh = MeshData {
        vertices: Vec::new(),
        indices: Vec::new(),
    };
    // A glyph spans columns 0..=4, so the last char ends one cell short
    // of its advance and the gap after it is two cells wide
    let width = text.chars().count() as f32 * ADVANCE - 2.0;
    let cell = cuboid(Vec3::splat(pixel * 0.45));

    for (i, ch) in text.chars().enumerate() {
        let rows = glyph(ch);
        let x0 = (i as f32 * ADVANCE - width * 0.5) * pixel;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..5u32 {
                if bits & (0b10000 >> col) == 0 {
                    continue;
                }
                let offset = Vec3::new(
                    x0 + col as f32 * pixel,
                    (6 - row) as f32 * pixel - 3.0 * pixel,
                    0.0,
                );
                append_translated(&mut mesh, &cell, offset);
            }
        }
    }
    mesh
}

fn append_translated(dest: &mut MeshData, src: &MeshData, offset: Vec3) {
    let base = dest.vertices.len() as u32;
    dest.vertices.extend(src.vertices.iter().map(|v| {
        let mut v = *v;
        v.position[0] += offset.x;
        v.position[1] += offset.y;
        v.position[2] += offset.z;
        v
    }));
    dest.indices.extend(src.indices.iter().map(|i| i + base));
}

/// 5x7 bitmap rows, top first, bit 4 leftmost. Unknown characters
/// render blank.
fn glyph(ch: char) -> [u8; 7] {
    match ch {
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'c' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10000, 0b10001, 0b01110],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'k' => [0b10000, 0b10000, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010],
        'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '!' => [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100],
        ' ' => [0; 7],
        _ => {
            log::debug!("No glyph for {ch:?}");
            [0; 7]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn label_mesh_has_a_cube_per_lit_pixel() {
        let mesh = build_label_mesh("C", 0.05);
        let lit: u32 = glyph('C').iter().map(|row| row.count_ones()).sum();
        assert_eq!(mesh.vertices.len() as u32, lit * 24);
        assert_eq!(mesh.indices.len() as u32, lit * 36);
    }

    #[test]
    fn blank_text_builds_an_empty_mesh() {
        let mesh = build_label_mesh("   ", 0.05);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.indices.is_empty());
    }

    #[test]
    fn loader_delivers_results_with_their_generation() {
        let loader = LabelLoader::new();
        loader.request("Click Me!", 3, Transform::default(), [1.0; 4]);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut results = Vec::new();
        while results.is_empty() && Instant::now() < deadline {
            results = loader.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].generation, 3);
        assert!(!results[0].mesh.vertices.is_empty());
    }

    #[test]
    fn mesh_is_centered_on_the_origin() {
        let mesh = build_label_mesh("CC", 0.05);
        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        for v in &mesh.vertices {
            min_x = min_x.min(v.position[0]);
            max_x = max_x.max(v.position[0]);
        }
        // Symmetric to float error, well under one pixel cell
        assert!((min_x + max_x).abs() < 1e-4);
    }
}
