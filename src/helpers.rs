//! Utility functions for timeloop

use bevy::prelude::*;

use crate::constants::{GHOST_ALPHA_MAX, GHOST_ALPHA_MIN, GHOST_ALPHA_STEP};

/// Move a value toward a target by a maximum delta
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Penetration depth of two axis-aligned boxes, or None if they don't overlap.
///
/// Returns (overlap_x, overlap_y), both positive.
pub fn aabb_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2) -> Option<Vec2> {
    let diff = a_pos - b_pos;
    let overlap_x = a_half.x + b_half.x - diff.x.abs();
    let overlap_y = a_half.y + b_half.y - diff.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        None
    } else {
        Some(Vec2::new(overlap_x, overlap_y))
    }
}

/// Ghost transparency by age (0 = recorded last loop). Older ghosts fade out.
pub fn ghost_alpha(age: usize) -> f32 {
    (GHOST_ALPHA_MAX - GHOST_ALPHA_STEP * age as f32).clamp(GHOST_ALPHA_MIN, GHOST_ALPHA_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_toward_clamps() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(9.0, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(0.0, -10.0, 4.0), -4.0);
    }

    #[test]
    fn test_aabb_overlap() {
        let half = Vec2::splat(0.5);
        assert!(aabb_overlap(Vec2::ZERO, half, Vec2::new(1.0, 0.0), half).is_none());
        let overlap = aabb_overlap(Vec2::ZERO, half, Vec2::new(0.75, 0.5), half);
        assert_eq!(overlap, Some(Vec2::new(0.25, 0.5)));
    }

    #[test]
    fn test_ghost_alpha_fades_and_clamps() {
        assert!((ghost_alpha(0) - 0.7).abs() < 1e-6);
        assert!((ghost_alpha(2) - 0.5).abs() < 1e-6);
        assert!((ghost_alpha(20) - 0.2).abs() < 1e-6);
    }
}
