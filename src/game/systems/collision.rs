//! Pairwise elastic collisions and map-border reflection.

use crate::game::entity::Entity;
use crate::util::vec2::Vec2;

/// Mutable access to two distinct entities of one slice
pub fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert!(i != j);
    if i < j {
        let (left, right) = entities.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = entities.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

/// Resolve an elastic collision between two overlapping bodies.
///
/// Pairs that are already separating are left untouched so an overlap is not
/// resolved twice. Velocities are rotated into the collision-normal frame,
/// the 1-D two-body elastic formula exchanges the normal components by mass,
/// and the tangential components pass through unchanged.
pub fn resolve_collision(a: &mut Entity, b: &mut Entity) {
    let velocity_diff = a.velocity - b.velocity;
    let displacement = b.position - a.position;

    // Approaching when the relative velocity points along the displacement
    if velocity_diff.dot(displacement) < 0.0 {
        return;
    }

    let angle = -displacement.y.atan2(displacement.x);

    let m1 = a.mass;
    let m2 = b.mass;

    let u1 = a.velocity.rotate(angle);
    let u2 = b.velocity.rotate(angle);

    let v1 = Vec2::new(
        u1.x * (m1 - m2) / (m1 + m2) + u2.x * 2.0 * m2 / (m1 + m2),
        u1.y,
    );
    let v2 = Vec2::new(
        u2.x * (m2 - m1) / (m1 + m2) + u1.x * 2.0 * m1 / (m1 + m2),
        u2.y,
    );

    a.velocity = v1.rotate(-angle);
    b.velocity = v2.rotate(-angle);
}

/// Force the velocity sign inward when a body's edge reaches a map border
pub fn reflect_borders(e: &mut Entity, width: f32, height: f32) {
    if e.position.x - e.radius <= 0.0 {
        e.velocity.x = e.velocity.x.abs();
    } else if e.position.x + e.radius >= width {
        e.velocity.x = -e.velocity.x.abs();
    }
    if e.position.y - e.radius <= 0.0 {
        e.velocity.y = e.velocity.y.abs();
    } else if e.position.y + e.radius >= height {
        e.velocity.y = -e.velocity.y.abs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f32, vx: f32, vy: f32, mass: f32) -> Entity {
        let mut e = Entity::particle(Vec2::new(x, 0.0), Vec2::new(vx, vy), 0);
        e.mass = mass;
        e
    }

    fn momentum(a: &Entity, b: &Entity) -> Vec2 {
        a.velocity * a.mass + b.velocity * b.mass
    }

    #[test]
    fn test_equal_mass_head_on_swap() {
        let mut a = body(0.0, 1.0, 0.0, 1.0);
        let mut b = body(10.0, -1.0, 0.0, 1.0);
        resolve_collision(&mut a, &mut b);
        assert!((a.velocity.x - -1.0).abs() < 1e-5);
        assert!((b.velocity.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_momentum_conserved_with_unequal_masses() {
        let mut a = body(0.0, 3.0, 0.5, 2.0);
        let mut b = body(10.0, -1.5, -0.25, 1.0);
        let before = momentum(&a, &b);
        resolve_collision(&mut a, &mut b);
        let after = momentum(&a, &b);
        assert!(before.approx_eq(after, 1e-4));
    }

    #[test]
    fn test_momentum_conserved_off_axis() {
        let mut a = body(0.0, 1.0, 2.0, 2.0);
        a.position = Vec2::new(1.0, 2.0);
        let mut b = body(0.0, -0.5, -1.0, 3.0);
        b.position = Vec2::new(4.0, 6.0);
        let before = momentum(&a, &b);
        resolve_collision(&mut a, &mut b);
        assert!(before.approx_eq(momentum(&a, &b), 1e-4));
    }

    #[test]
    fn test_separating_pair_untouched() {
        // b is to the right and both move apart
        let mut a = body(0.0, -1.0, 0.0, 1.0);
        let mut b = body(10.0, 1.0, 0.0, 1.0);
        resolve_collision(&mut a, &mut b);
        assert_eq!(a.velocity, Vec2::new(-1.0, 0.0));
        assert_eq!(b.velocity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_tangential_component_unchanged() {
        // Displacement along x: y velocities are tangential and pass through
        let mut a = body(0.0, 1.0, 0.7, 1.0);
        let mut b = body(10.0, -1.0, -0.3, 1.0);
        resolve_collision(&mut a, &mut b);
        assert!((a.velocity.y - 0.7).abs() < 1e-5);
        assert!((b.velocity.y - -0.3).abs() < 1e-5);
    }

    #[test]
    fn test_reflect_left_border() {
        let mut e = body(10.0, -2.0, 0.0, 1.0);
        e.radius = 15.0; // edge at -5
        reflect_borders(&mut e, 3000.0, 2200.0);
        assert_eq!(e.velocity.x, 2.0);
    }

    #[test]
    fn test_reflect_bottom_border() {
        let mut e = body(100.0, 0.0, 3.0, 1.0);
        e.position.y = 2195.0;
        e.radius = 15.0;
        reflect_borders(&mut e, 3000.0, 2200.0);
        assert_eq!(e.velocity.y, -3.0);
    }

    #[test]
    fn test_no_reflection_in_interior() {
        let mut e = body(100.0, -2.0, 3.0, 1.0);
        e.position.y = 100.0;
        reflect_borders(&mut e, 3000.0, 2200.0);
        assert_eq!(e.velocity, Vec2::new(-2.0, 3.0));
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut entities = vec![body(0.0, 1.0, 0.0, 1.0), body(5.0, 2.0, 0.0, 1.0)];
        {
            let (a, b) = pair_mut(&mut entities, 0, 1);
            assert_eq!(a.velocity.x, 1.0);
            assert_eq!(b.velocity.x, 2.0);
        }
        {
            let (a, b) = pair_mut(&mut entities, 1, 0);
            assert_eq!(a.velocity.x, 2.0);
            assert_eq!(b.velocity.x, 1.0);
        }
    }
}
