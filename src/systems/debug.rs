use bevy::prelude::*;

use crate::components::ThrownWeapon;
use crate::resources::ThrowConfig;
use crate::types::FlightState;

/// Draw debug gizmos for thrown weapons.
///
/// Draws positions and velocity vectors. Returning weapons also get a line to the point
/// they were at last tick.
pub fn draw_thrown_weapon_debug(
    mut gizmos: Gizmos,
    query: Query<(&Transform, &ThrownWeapon)>,
    config: Res<ThrowConfig>,
) {
    if !config.debug_draw {
        return;
    }

    for (transform, projectile) in query.iter() {
        let color = match projectile.state {
            FlightState::Flying => Color::srgb(1.0, 0.0, 0.0),
            FlightState::Embedded => Color::srgb(0.6, 0.6, 0.6),
            FlightState::Returning => Color::srgb(0.2, 0.6, 1.0),
            FlightState::Retrieved | FlightState::Discarded => continue,
        };
        gizmos.sphere(transform.translation, 0.05, color);

        let end = transform.translation + projectile.velocity;
        gizmos.line(transform.translation, end, Color::srgb(0.0, 1.0, 0.0));

        if projectile.state == FlightState::Returning {
            gizmos.line(projectile.previous_position, transform.translation, color);
        }
    }
}
