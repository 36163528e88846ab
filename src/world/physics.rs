//! Minimal rigid body step for ghosts and boxes
//!
//! Everything is an axis-aligned box. Collisions are resolved along the axis of
//! least penetration, leaving bodies a skin width inside what they rest on so
//! the next tick still sees the contact.

use bevy::prelude::*;

use super::{Body, Collider, ContactReport, CorrectiveForce, Dormant, Held, Kinematic, PickupBox};
use crate::constants::COLLISION_EPSILON;
use crate::helpers::aabb_overlap;
use crate::player::{Player, Velocity};
use crate::tuning::GameplayTuning;

/// A resolved collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Point on the moving body's surface
    pub point: Vec2,
    /// Normal pointing away from the obstacle
    pub normal: Vec2,
    /// Speed along the normal that the collision cancelled
    pub speed: f32,
}

/// Push a moving box out of a fixed one. Velocity into the obstacle is zeroed.
pub fn resolve_aabb(
    pos: &mut Vec3,
    vel: &mut Vec2,
    half: Vec2,
    other_pos: Vec2,
    other_half: Vec2,
) -> Option<Contact> {
    let center = pos.truncate();
    let overlap = aabb_overlap(center, half, other_pos, other_half)?;
    let diff = center - other_pos;

    if overlap.y < overlap.x {
        if diff.y > 0.0 {
            // Landing on top
            pos.y = other_pos.y + other_half.y + half.y - COLLISION_EPSILON;
            let speed = (-vel.y).max(0.0);
            if vel.y <= 0.0 {
                vel.y = 0.0;
            }
            Some(Contact {
                point: Vec2::new(center.x, pos.y - half.y),
                normal: Vec2::Y,
                speed,
            })
        } else {
            // Ceiling
            pos.y = other_pos.y - other_half.y - half.y + COLLISION_EPSILON;
            let speed = vel.y.max(0.0);
            if vel.y > 0.0 {
                vel.y = 0.0;
            }
            Some(Contact {
                point: Vec2::new(center.x, pos.y + half.y),
                normal: Vec2::NEG_Y,
                speed,
            })
        }
    } else {
        let sign = if diff.x > 0.0 { 1.0 } else { -1.0 };
        pos.x = other_pos.x + sign * (other_half.x + half.x - COLLISION_EPSILON);
        let into = -vel.x * sign;
        if into > 0.0 {
            vel.x = 0.0;
        }
        Some(Contact {
            point: Vec2::new(pos.x - sign * half.x, center.y),
            normal: Vec2::new(sign, 0.0),
            speed: into.max(0.0),
        })
    }
}

/// Slide a box sideways out of a pusher, carrying the pusher's horizontal
/// speed, then keep the box out of solid geometry.
///
/// Returns false when the overlap is vertical (standing on or under the box).
pub fn shove_box(
    pusher_pos: Vec2,
    pusher_half: Vec2,
    pusher_vel: Vec2,
    box_pos: &mut Vec3,
    box_vel: &mut Vec2,
    box_half: Vec2,
    solids: &[(Vec2, Vec2)],
) -> bool {
    let Some(overlap) = aabb_overlap(pusher_pos, pusher_half, box_pos.truncate(), box_half) else {
        return false;
    };
    if overlap.y < overlap.x {
        return false;
    }
    let sign = if box_pos.x > pusher_pos.x { 1.0 } else { -1.0 };
    box_pos.x += sign * overlap.x;
    if pusher_vel.x * sign > 0.0 {
        box_vel.x = pusher_vel.x;
    }
    for (solid_pos, solid_half) in solids {
        resolve_aabb(box_pos, box_vel, box_half, *solid_pos, *solid_half);
    }
    true
}

/// Snapshot of every enabled collider as (center, half extents)
pub fn collect_solids<'a>(
    solids: impl IntoIterator<Item = (&'a Transform, &'a Collider)>,
) -> Vec<(Vec2, Vec2)> {
    solids
        .into_iter()
        .filter(|(_, collider)| collider.enabled)
        .map(|(transform, collider)| (transform.translation.truncate(), collider.half_extents))
        .collect()
}

/// Gravity, corrective forces, damping and position integration for
/// dynamic bodies (ghosts and loose boxes).
pub fn integrate_bodies(
    time: Res<Time>,
    tuning: Res<GameplayTuning>,
    mut bodies: Query<
        (
            &mut Transform,
            &mut Velocity,
            &Body,
            Option<&mut CorrectiveForce>,
        ),
        (
            Without<Player>,
            Without<Kinematic>,
            Without<Dormant>,
            Without<Held>,
        ),
    >,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    for (mut transform, mut velocity, body, force) in &mut bodies {
        velocity.0.y -= tuning.body_gravity * dt;

        if let Some(mut force) = force {
            velocity.0 += force.0 / body.mass * dt;
            force.0 = Vec2::ZERO;
        }

        velocity.0 /= 1.0 + body.linear_damping * dt;

        transform.translation.x += velocity.0.x * dt;
        transform.translation.y += velocity.0.y * dt;
    }
}

/// Keep dynamic bodies out of level geometry and let non-box bodies shove boxes.
#[allow(clippy::type_complexity)]
pub fn resolve_body_collisions(
    solids: Query<(&Transform, &Collider), Without<Body>>,
    mut movers: Query<
        (
            &mut Transform,
            &mut Velocity,
            &Body,
            Option<&mut ContactReport>,
        ),
        (
            Without<PickupBox>,
            Without<Player>,
            Without<Kinematic>,
            Without<Dormant>,
        ),
    >,
    mut boxes: Query<
        (&mut Transform, &mut Velocity, &Body),
        (With<PickupBox>, Without<Held>, Without<Player>),
    >,
) {
    let solids = collect_solids(&solids);

    // Boxes against geometry, then against each other so they can stack
    for (mut transform, mut velocity, body) in &mut boxes {
        for (solid_pos, solid_half) in &solids {
            resolve_aabb(
                &mut transform.translation,
                &mut velocity.0,
                body.half_extents,
                *solid_pos,
                *solid_half,
            );
        }
    }
    let mut pairs = boxes.iter_combinations_mut();
    while let Some([(mut a_tf, mut a_vel, a_body), (b_tf, _, b_body)]) = pairs.fetch_next() {
        resolve_aabb(
            &mut a_tf.translation,
            &mut a_vel.0,
            a_body.half_extents,
            b_tf.translation.truncate(),
            b_body.half_extents,
        );
    }

    for (mut transform, mut velocity, body, mut report) in &mut movers {
        if let Some(report) = report.as_mut() {
            report.contacts.clear();
        }

        let mut contacts = Vec::new();
        for (solid_pos, solid_half) in &solids {
            if let Some(contact) = resolve_aabb(
                &mut transform.translation,
                &mut velocity.0,
                body.half_extents,
                *solid_pos,
                *solid_half,
            ) {
                contacts.push(contact);
            }
        }

        for (mut box_tf, mut box_vel, box_body) in &mut boxes {
            shove_box(
                transform.translation.truncate(),
                body.half_extents,
                velocity.0,
                &mut box_tf.translation,
                &mut box_vel.0,
                box_body.half_extents,
                &solids,
            );
            if let Some(contact) = resolve_aabb(
                &mut transform.translation,
                &mut velocity.0,
                body.half_extents,
                box_tf.translation.truncate(),
                box_body.half_extents,
            ) {
                contacts.push(contact);
            }
        }

        if let Some(report) = report.as_mut() {
            report.contacts = contacts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_zeroes_downward_velocity() {
        let mut pos = Vec3::new(0.0, 0.95, 0.0);
        let mut vel = Vec2::new(1.0, -5.0);
        let contact = resolve_aabb(
            &mut pos,
            &mut vel,
            Vec2::splat(0.5),
            Vec2::ZERO,
            Vec2::new(5.0, 0.5),
        )
        .expect("overlapping");
        assert_eq!(contact.normal, Vec2::Y);
        assert_eq!(contact.speed, 5.0);
        assert_eq!(vel, Vec2::new(1.0, 0.0));
        assert!((pos.y - (1.0 - COLLISION_EPSILON)).abs() < 1e-6);
    }

    #[test]
    fn test_wall_hit_reports_horizontal_speed() {
        let mut pos = Vec3::new(-0.9, 0.0, 0.0);
        let mut vel = Vec2::new(3.0, 0.0);
        let contact = resolve_aabb(
            &mut pos,
            &mut vel,
            Vec2::splat(0.5),
            Vec2::ZERO,
            Vec2::new(0.5, 3.0),
        )
        .expect("overlapping");
        assert_eq!(contact.normal, Vec2::NEG_X);
        assert_eq!(contact.speed, 3.0);
        assert_eq!(vel.x, 0.0);
    }

    #[test]
    fn test_shove_moves_box_until_wall() {
        let wall = (Vec2::new(2.0, 0.0), Vec2::new(0.5, 5.0));
        let mut box_pos = Vec3::new(0.7, 0.0, 0.0);
        let mut box_vel = Vec2::ZERO;
        let shoved = shove_box(
            Vec2::ZERO,
            Vec2::splat(0.4),
            Vec2::new(4.0, 0.0),
            &mut box_pos,
            &mut box_vel,
            Vec2::splat(0.4),
            &[wall],
        );
        assert!(shoved);
        assert!(box_pos.x > 0.7);
        assert_eq!(box_vel.x, 4.0);

        // Box flush against the wall cannot be pushed through it
        let mut box_pos = Vec3::new(1.2, 0.0, 0.0);
        let mut box_vel = Vec2::ZERO;
        shove_box(
            Vec2::new(0.5, 0.0),
            Vec2::splat(0.4),
            Vec2::new(4.0, 0.0),
            &mut box_pos,
            &mut box_vel,
            Vec2::splat(0.4),
            &[wall],
        );
        // Resolution leaves the box resting just inside the wall face
        assert!((box_pos.x - (1.1 + COLLISION_EPSILON)).abs() < 1e-4, "{}", box_pos.x);
    }
}
