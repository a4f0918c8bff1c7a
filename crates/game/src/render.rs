//! Frame rendering: batches the scene by mesh, opaque first, then
//! glass, then the fade overlay.

use std::collections::HashMap;

use anyhow::Result;
use engine_core::{NodeColor, Transform};
use renderer::InstanceData;

use crate::items::GachaponItem;
use crate::scenes::{DisplayPiece, MeshKey};
use crate::state::GameState;

impl GameState {
    pub fn render(&mut self) -> Result<()> {
        let (output, mut encoder) = match self.renderer.begin_frame() {
            Ok(frame) => frame,
            Err(e) => {
                if let Some(wgpu::SurfaceError::OutOfMemory) =
                    e.downcast_ref::<wgpu::SurfaceError>()
                {
                    return Err(e);
                }
                // Lost or outdated surface: reconfigure and skip the frame
                log::warn!("Surface error, reconfiguring: {e}");
                self.renderer.resize(self.renderer.size);
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.update_camera(
            &self.camera,
            self.scene.light_position,
            self.scene.light_color,
        );
        self.renderer
            .clear(&mut encoder, &view, self.scene.clear_color);

        let mut opaque: HashMap<MeshKey, Vec<InstanceData>> = HashMap::new();
        let mut transparent: HashMap<MeshKey, Vec<InstanceData>> = HashMap::new();
        let mut push = |key: MeshKey, transform: &Transform, color: [f32; 4], glass: bool| {
            let data = InstanceData::new(transform.to_matrix().to_cols_array_2d(), color);
            let target = if glass { &mut transparent } else { &mut opaque };
            target.entry(key).or_default().push(data);
        };

        for node in &self.scene.nodes {
            push(node.mesh, &node.transform, node.color, node.transparent);
        }
        for machine in &self.scene.gachapons {
            for part in machine.parts() {
                let key = if part.rounded {
                    MeshKey::UnitSphere
                } else {
                    MeshKey::UnitCube
                };
                push(key, &part.transform, part.color, part.transparent);
            }
        }
        for (_, (transform, color, item)) in self
            .world
            .query::<(&Transform, &NodeColor, &GachaponItem)>()
            .iter()
        {
            push(MeshKey::Shape(item.kind), transform, color.0, false);
        }
        for (_, (transform, color, piece)) in self
            .world
            .query::<(&Transform, &NodeColor, &DisplayPiece)>()
            .iter()
        {
            push(MeshKey::Shape(piece.kind), transform, color.0, false);
        }

        for (key, instances) in &opaque {
            if let Some(mesh) = self.meshes.gpu(self.renderer.device(), *key) {
                self.renderer
                    .render_instanced_load(&mut encoder, &view, mesh, instances);
            }
        }
        // Glass draws last so the chamber contents show through
        for (key, instances) in &transparent {
            if let Some(mesh) = self.meshes.gpu(self.renderer.device(), *key) {
                self.renderer
                    .render_transparent_load(&mut encoder, &view, mesh, instances);
            }
        }

        self.renderer
            .render_fade(&mut encoder, &view, self.transition.opacity());
        self.renderer.end_frame(output, encoder);
        Ok(())
    }
}
