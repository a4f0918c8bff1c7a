//! Per-frame simulation: transitions, movement, physics, animation,
//! interactions, and async label attachment.

use engine_core::{NodeColor, Transform, Vec3};
use procgen::{apply_behavior, color_shift, ShapeBehavior};

use crate::interact::Interaction;
use crate::scenes::{DisplayPiece, SceneNode};
use crate::state::GameState;
use crate::transition::FadeEvent;

impl GameState {
    pub fn update(&mut self) {
        // The event batch for this frame has been delivered by now
        self.input.begin_frame();
        self.time.update();
        let dt = self.time.delta_seconds();
        let elapsed = self.time.elapsed_seconds();

        if self.input.is_lock_toggle_pressed() {
            self.toggle_pointer_lock();
        }

        match self.transition.update(dt) {
            FadeEvent::SwapNow(target) => self.swap_scene(target),
            FadeEvent::Finished => log::debug!("Transition complete"),
            FadeEvent::None => {}
        }

        self.physics.step(dt);
        self.player.update(&mut self.camera, &self.input, dt);

        if self.scene.light_follows_camera {
            self.scene.light_position = self.camera.position() + Vec3::Y * 1.5;
        }

        self.items.update(&self.physics, &mut self.world, dt, elapsed);
        self.animate_displays(dt, elapsed);

        let culled = self.items.cull(&mut self.physics, &mut self.world);
        if culled > 0 {
            log::debug!("Culled {culled} stray capsules");
        }

        if self.input.is_click_pressed()
            && self.input.is_pointer_locked()
            && !self.transition.is_active()
        {
            self.handle_click();
        }

        self.attach_finished_labels();

        if let Some(fps) = self.fps.tick(dt) {
            let stats = self.items.stats;
            log::info!(
                "{fps} fps | {} capsules live ({} spawned, {} released, {} culled)",
                self.items.live_count(&self.world),
                stats.spawned,
                stats.released,
                stats.culled,
            );
        }
    }

    fn animate_displays(&mut self, dt: f32, elapsed: f32) {
        for (_, (transform, piece)) in
            self.world.query_mut::<(&mut Transform, &DisplayPiece)>()
        {
            apply_behavior(transform, &piece.rest, piece.behavior, dt, elapsed);
        }
        for (_, (piece, color)) in self.world.query_mut::<(&DisplayPiece, &mut NodeColor)>() {
            if piece.behavior == ShapeBehavior::ColorShift {
                color.0 = color_shift(elapsed);
            }
        }
    }

    fn handle_click(&mut self) {
        let Some(action) =
            self.resolver
                .resolve(&self.physics, self.camera.position(), self.camera.forward())
        else {
            return;
        };

        match action {
            Interaction::Door(target) => self.transition.begin(target),
            Interaction::Machine { id, button } => {
                let Some(index) = self.scene.gachapons.iter().position(|m| m.id == id) else {
                    return;
                };
                if !self.scene.gachapons[index].is_open() {
                    // First click anywhere on a closed machine opens it
                    if self.scene.gachapons[index].open() {
                        let activated = self.items.activate(&mut self.world, id);
                        log::info!("Activated {activated} capsules in machine {id:?}");
                    }
                } else if button {
                    self.items
                        .shuffle(&mut self.physics, &mut self.world, id, &mut self.rng);
                    let machine = &self.scene.gachapons[index];
                    match self
                        .items
                        .release(&mut self.physics, &mut self.world, machine, &mut self.rng)
                    {
                        Some(item) => log::debug!(
                            "Dispensed {item:?}, {} left in {id:?}",
                            self.items.count_in_machine(&self.world, id)
                        ),
                        None => log::info!("Machine {id:?} is out of capsules"),
                    }
                }
            }
        }
    }

    fn attach_finished_labels(&mut self) {
        for result in self.labels.poll() {
            if result.generation != self.scene.generation {
                log::debug!(
                    "Dropping label built for stale generation {}",
                    result.generation
                );
                continue;
            }
            let key = self.meshes.insert_label(result.mesh);
            self.scene.nodes.push(SceneNode {
                mesh: key,
                transform: result.transform,
                color: result.color,
                transparent: false,
            });
        }
    }
}
